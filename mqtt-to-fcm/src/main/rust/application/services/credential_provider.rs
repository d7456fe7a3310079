use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;

use crate::domain::errors::AuthError;
use crate::domain::ports::{MetricsReporter, TokenExchanger, TokenSource};
use crate::domain::value_objects::Credential;

/// Refresh this long before the reported expiry
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(300);

type PendingExchange = Shared<BoxFuture<'static, Result<Credential, AuthError>>>;

/// A cached credential with the margin it is refreshed at
struct CachedCredential {
    credential: Credential,
    margin: Duration,
}

#[derive(Default)]
struct CacheState {
    cached: Option<CachedCredential>,
    pending: Option<PendingExchange>,
}

/// Caches the gateway credential and coalesces concurrent refreshes.
///
/// The refresh margin never exceeds half of a credential's lifetime, so
/// short-lived credentials are still served from the cache.
///
/// A miss spawns one exchange task and parks it in `pending`; every caller that
/// misses while it runs awaits the same shared result. The task itself updates
/// the cache, so the outcome lands even if all callers go away.
pub struct CredentialProvider {
    exchanger: Arc<dyn TokenExchanger>,
    refresh_margin: Duration,
    metrics: Arc<dyn MetricsReporter>,
    state: Arc<Mutex<CacheState>>,
}

impl CredentialProvider {
    pub fn new(
        exchanger: Arc<dyn TokenExchanger>,
        refresh_margin: Duration,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            exchanger,
            refresh_margin,
            metrics,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    pub async fn get_token(&self) -> Result<Credential, AuthError> {
        let pending = {
            let mut state = lock(&self.state);

            if let Some(cached) = &state.cached {
                if cached.credential.is_fresh_at(Instant::now(), cached.margin) {
                    return Ok(cached.credential.clone());
                }
            }

            match &state.pending {
                Some(pending) => pending.clone(),
                None => {
                    let pending = self.start_exchange();
                    state.pending = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Whether an exchange is currently in flight
    pub fn is_refreshing(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    fn start_exchange(&self) -> PendingExchange {
        let exchanger = Arc::clone(&self.exchanger);
        let state = Arc::clone(&self.state);
        let metrics = Arc::clone(&self.metrics);
        let refresh_margin = self.refresh_margin;

        tracing::debug!("Requesting new gateway credential");

        let task = tokio::spawn(async move {
            let result = exchanger.exchange().await;

            let mut state = lock(&state);
            state.pending = None;
            match &result {
                Ok(credential) => {
                    let lifetime = credential
                        .expires_at()
                        .saturating_duration_since(Instant::now());
                    let margin = refresh_margin.min(lifetime / 2);
                    if margin < refresh_margin {
                        tracing::warn!(
                            "Credential lifetime {:?} is shorter than the refresh margin, refreshing after half of it",
                            lifetime
                        );
                    }
                    tracing::debug!(
                        valid_for_secs = lifetime.as_secs(),
                        "Gateway credential refreshed"
                    );
                    state.cached = Some(CachedCredential {
                        credential: credential.clone(),
                        margin,
                    });
                }
                Err(e) => {
                    tracing::warn!("Credential exchange failed: {}", e);
                    state.cached = None;
                }
            }
            metrics.report_token_exchange(result.is_ok());

            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(AuthError::Transport(format!("credential exchange task aborted: {}", e)))
            })
        }
        .boxed()
        .shared()
    }
}

#[async_trait]
impl TokenSource for CredentialProvider {
    async fn token(&self) -> Result<Credential, AuthError> {
        self.get_token().await
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
