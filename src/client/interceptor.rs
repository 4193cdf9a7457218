//! Client-side credential interceptor
//!
//! Logs in once at construction, then refreshes the token on a fixed
//! interval in a background task. A failed refresh keeps the previous token
//! and retries after a short backoff. Readers always see a whole token: the
//! cache is a `watch` channel holding an immutable `Arc<str>`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tonic::metadata::AsciiMetadataValue;
use tonic::Request;
use tracing::{debug, info, warn};

use super::Login;
use crate::auth::AUTHORIZATION;
use crate::services::method;
use crate::types::{CatalogError, Result};

#[derive(Debug, Clone)]
pub struct InterceptorConfig {
    /// Delay between successful refreshes
    pub refresh_interval: Duration,
    /// Delay before retrying a failed refresh
    pub retry_backoff: Duration,
    /// Methods that get the authorization header attached
    pub auth_methods: HashSet<String>,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(15 * 60),
            retry_backoff: Duration::from_secs(1),
            auth_methods: [method::CREATE_LAPTOP, method::UPLOAD_IMAGE, method::RATE_LAPTOP]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

pub struct CredentialInterceptor {
    token: watch::Receiver<Arc<str>>,
    auth_methods: HashSet<String>,
    refresher: JoinHandle<()>,
}

impl CredentialInterceptor {
    /// Log in and start the refresh task. Fails if the first login fails.
    pub async fn new(login: Arc<dyn Login>, config: InterceptorConfig) -> Result<Self> {
        let initial = login.login().await?;
        info!("obtained initial access token");

        let (tx, rx) = watch::channel::<Arc<str>>(Arc::from(initial));
        let refresher = tokio::spawn(refresh_loop(
            login,
            tx,
            config.refresh_interval,
            config.retry_backoff,
        ));

        Ok(Self {
            token: rx,
            auth_methods: config.auth_methods,
            refresher,
        })
    }

    /// Current access token
    pub fn token(&self) -> Arc<str> {
        Arc::clone(&self.token.borrow())
    }

    /// Attach `authorization: Bearer <token>` when `method` requires it
    pub fn intercept<T>(&self, method: &str, mut request: Request<T>) -> Result<Request<T>> {
        if !self.auth_methods.contains(method) {
            return Ok(request);
        }

        debug!(method, "attach access token");
        let value: AsciiMetadataValue = format!("Bearer {}", self.token())
            .parse()
            .map_err(|_| CatalogError::Internal("access token is not valid metadata".into()))?;
        request.metadata_mut().insert(AUTHORIZATION, value);
        Ok(request)
    }
}

impl Drop for CredentialInterceptor {
    fn drop(&mut self) {
        self.refresher.abort();
    }
}

async fn refresh_loop(
    login: Arc<dyn Login>,
    tx: watch::Sender<Arc<str>>,
    refresh_interval: Duration,
    retry_backoff: Duration,
) {
    let mut wait = refresh_interval;
    loop {
        tokio::time::sleep(wait).await;

        match login.login().await {
            Ok(token) => {
                if tx.send(Arc::from(token)).is_err() {
                    return;
                }
                info!("refreshed access token");
                wait = refresh_interval;
            }
            Err(e) => {
                warn!(error = %e, retry_in = ?retry_backoff, "cannot refresh access token");
                wait = retry_backoff;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedLogin {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedLogin {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Login for ScriptedLogin {
        async fn login(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CatalogError::Unknown("script exhausted".into())))
        }
    }

    fn config() -> InterceptorConfig {
        InterceptorConfig {
            refresh_interval: Duration::from_secs(60),
            ..InterceptorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_initial_login_failure_fails_construction() {
        let login = ScriptedLogin::new(vec![Err(CatalogError::NotFound("nope".into()))]);
        assert!(CredentialInterceptor::new(login, config()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_and_backoff() {
        let login = ScriptedLogin::new(vec![
            Ok("t1".into()),
            Ok("t2".into()),
            Err(CatalogError::Unknown("server down".into())),
            Ok("t4".into()),
        ]);
        let interceptor = CredentialInterceptor::new(login.clone(), config())
            .await
            .unwrap();
        assert_eq!(&*interceptor.token(), "t1");

        // First refresh at 60s
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(&*interceptor.token(), "t2");

        // Refresh at 120s fails, previous token stays
        tokio::time::sleep(Duration::from_millis(59_500)).await;
        assert_eq!(&*interceptor.token(), "t2");

        // Retry after 1s backoff
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(&*interceptor.token(), "t4");
        assert_eq!(login.calls.load(Ordering::SeqCst), 4);

        // Back on the normal interval: nothing before 181s
        tokio::time::sleep(Duration::from_secs(28)).await;
        assert_eq!(login.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_attaches_header_only_to_auth_methods() {
        let login = ScriptedLogin::new(vec![Ok("abc".into())]);
        let interceptor = CredentialInterceptor::new(login, config()).await.unwrap();

        let req = interceptor
            .intercept(method::CREATE_LAPTOP, Request::new(()))
            .unwrap();
        assert_eq!(
            req.metadata().get(AUTHORIZATION).unwrap().to_str().unwrap(),
            "Bearer abc"
        );

        let req = interceptor
            .intercept(method::SEARCH_LAPTOP, Request::new(()))
            .unwrap();
        assert!(req.metadata().get(AUTHORIZATION).is_none());
    }
}
