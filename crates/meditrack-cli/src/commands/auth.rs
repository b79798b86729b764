use clap::Subcommand;
use meditrack_core::auth::TokenStore;
use serde_json::json;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Exchange a Google ID token for a Meditrack API token
    Login {
        /// Google ID token from the sign-in flow
        #[arg(long)]
        google_token: String,
    },
    /// Remove the stored API token
    Logout,
    /// Check whether an API token is stored
    Status,
}

pub async fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = super::token_store();
    match action {
        AuthAction::Login { google_token } => {
            let config = super::load_config()?;
            let client = super::api_client(&config)?;
            let api_token = match client.exchange_google_token(&google_token).await {
                Ok(token) => token,
                Err(e) => {
                    let reason = e.server_message().unwrap_or_else(|| e.to_string());
                    return Err(format!("sign-in failed: {reason}").into());
                }
            };
            tokens.save_token(&api_token)?;
            tracing::info!("API token stored");
            println!("{}", json!({ "authenticated": true }));
        }
        AuthAction::Logout => {
            tokens.remove_token()?;
            println!("{}", json!({ "authenticated": false }));
        }
        AuthAction::Status => {
            let authenticated = tokens.get_token()?.is_some_and(|t| !t.is_empty());
            println!("{}", json!({ "authenticated": authenticated }));
        }
    }
    Ok(())
}
