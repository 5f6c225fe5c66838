//! Bearer credential cache
//!
//! Tokens are refreshed lazily. The refresh runs while holding the state
//! lock, so callers arriving during an exchange wait for it and then reuse
//! the fresh token instead of starting exchanges of their own.

use crate::prelude::*;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A token as issued by the credential exchange
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub access_token: String,
    /// Usable lifetime, safety margin already applied.
    pub lifetime: Duration,
}

/// Performs the credential exchange against the provider's auth endpoint
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn exchange(&self) -> CatalogResult<IssuedToken>;
}

#[derive(Debug)]
struct Credential {
    token: String,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct CredentialCache<S> {
    source: S,
    state: Mutex<Option<Credential>>,
}

impl<S: CredentialSource> CredentialCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(None),
        }
    }

    /// Current bearer token, exchanging for a new one when absent or expired.
    pub async fn token(&self) -> CatalogResult<String> {
        let mut state = self.state.lock().await;

        if let Some(credential) = state.as_ref() {
            if Instant::now() < credential.expires_at {
                return Ok(credential.token.clone());
            }
            log::debug!("Bearer token expired, refreshing");
        }

        let issued = self.source.exchange().await?;
        let token = issued.access_token.clone();
        *state = Some(Credential {
            token: issued.access_token,
            expires_at: Instant::now() + issued.lifetime,
        });
        log::info!(
            "Obtained bearer token valid for {}s",
            issued.lifetime.as_secs()
        );

        Ok(token)
    }

    /// Forget the current token so the next call exchanges again.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        exchanges: Arc<AtomicUsize>,
        lifetime: Duration,
        fail: bool,
    }

    impl CountingSource {
        fn new(lifetime: Duration) -> (Self, Arc<AtomicUsize>) {
            let exchanges = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    exchanges: exchanges.clone(),
                    lifetime,
                    fail: false,
                },
                exchanges,
            )
        }
    }

    #[async_trait]
    impl CredentialSource for CountingSource {
        async fn exchange(&self) -> CatalogResult<IssuedToken> {
            let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
            // widen the window in which concurrent callers pile up
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(Error::Auth("HTTP 401 Unauthorized".to_string()));
            }
            Ok(IssuedToken {
                access_token: f!("token-{n}"),
                lifetime: self.lifetime,
            })
        }
    }

    #[tokio::test]
    async fn test_token_is_cached_until_expiry() {
        let (source, exchanges) = CountingSource::new(Duration::from_secs(3540));
        let cache = CredentialCache::new(source);

        assert_eq!(cache.token().await.unwrap(), "token-1");
        assert_eq!(cache.token().await.unwrap(), "token-1");
        assert_eq!(exchanges.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        // a 30s grant minus the 60s margin is unusable immediately
        let (source, exchanges) = CountingSource::new(marquee_core::spotify::token_lifetime(30));
        let cache = CredentialCache::new(source);

        assert_eq!(cache.token().await.unwrap(), "token-1");
        assert_eq!(cache.token().await.unwrap(), "token-2");
        assert_eq!(exchanges.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_exchange() {
        let (source, exchanges) = CountingSource::new(Duration::from_secs(3540));
        let cache = CredentialCache::new(source);

        let tokens = join_all((0..8).map(|_| cache.token())).await;

        assert_eq!(exchanges.load(Ordering::SeqCst), 1);
        assert!(tokens.iter().all(|t| t.as_deref() == Ok("token-1")));
    }

    #[tokio::test]
    async fn test_failed_exchange_is_auth_error() {
        let (mut source, _) = CountingSource::new(Duration::from_secs(3540));
        source.fail = true;
        let cache = CredentialCache::new(source);

        let err = cache.token().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_invalidate_forces_exchange() {
        let (source, exchanges) = CountingSource::new(Duration::from_secs(3540));
        let cache = CredentialCache::new(source);

        cache.token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.token().await.unwrap(), "token-2");
        assert_eq!(exchanges.load(Ordering::SeqCst), 2);
    }
}
