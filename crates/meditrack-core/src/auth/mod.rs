//! Sign-in and credentials: the client-side token store, API token
//! signing, the email allow-list and the Google identity provider.

mod allow_list;
pub mod google;
pub mod jwt;
mod token_store;

pub use allow_list::AllowList;
pub use google::{GoogleTokenInfo, Identity, IdentityProvider};
pub use jwt::{Claims, TokenSigner};
pub use token_store::{KeyringTokenStore, MemoryTokenStore, TokenStore};

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
