//! Shared application state for the HTTP handlers.

use std::sync::{Arc, Mutex, MutexGuard};

use meditrack_core::auth::{AllowList, IdentityProvider, TokenSigner};
use meditrack_core::{AnalyticsAggregator, Database, SystemClock};

use crate::error::ApiError;

pub struct AppState {
    /// Locked only inside `with_store`, off the async workers.
    store: Mutex<Database>,
    pub signer: TokenSigner,
    pub identity: Arc<dyn IdentityProvider>,
    pub allow_list: AllowList,
    pub analytics: AnalyticsAggregator<SystemClock>,
}

impl AppState {
    pub fn new(
        store: Database,
        signer: TokenSigner,
        identity: Arc<dyn IdentityProvider>,
        allow_list: AllowList,
        max_range_days: u32,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            signer,
            identity,
            allow_list,
            analytics: AnalyticsAggregator::new(SystemClock).with_max_range_days(max_range_days),
        }
    }

    /// Runs `f` against the store on the blocking pool.
    pub async fn with_store<T, F>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&AppState, &Database) -> T + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || -> Result<T, ApiError> {
            let store = state.store()?;
            Ok(f(&*state, &*store))
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "store task failed");
            ApiError::Internal("Internal Server Error".into())
        })?
    }

    pub fn store(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.store.lock().map_err(|_| {
            tracing::error!("session store mutex poisoned");
            ApiError::Internal("Internal Server Error".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use meditrack_core::auth::GoogleTokenInfo;
    use meditrack_core::{NewSession, SessionQuery, SessionStore};

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Database::open_memory().unwrap(),
            TokenSigner::new("secret"),
            Arc::new(GoogleTokenInfo::new(None).unwrap()),
            AllowList::new(Vec::<String>::new()),
            365,
        ))
    }

    #[tokio::test]
    async fn store_calls_run_on_blocking_pool() {
        let state = state();
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 9, 0, 0).unwrap();

        let id = state
            .with_store(move |_, store| store.insert("u1", &NewSession::new(start, 600)))
            .await
            .unwrap()
            .unwrap();

        let records = state
            .with_store(move |_, store| {
                store.query(&SessionQuery {
                    user_id: "u1".into(),
                    start,
                    end: start,
                })
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].session_id, id);
    }
}
