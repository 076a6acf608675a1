//! Bounded retry around a single feed request.

use crate::api::RemoteSource;
use crate::config::RetryConfig;
use crate::error::{AttemptError, RetryExhausted};
use crate::notify::Notifier;
use crate::types::{AUTH_FAILED_CODE, FeedResponse, RawRecItem};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Called after every failed retryable attempt with the zero-based
/// attempt index.
pub type AttemptObserver = Arc<dyn Fn(&AttemptError, usize) + Send + Sync>;

/// How many attempts to make and how long each may take.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub times: u32,
    /// `None` lets an attempt run until the transport gives up.
    pub timeout: Option<Duration>,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            times: config.times.max(1),
            timeout: (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms)),
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

/// Turn a decoded envelope into items or the reason it carries none.
pub fn classify_response(resp: FeedResponse) -> Result<Vec<RawRecItem>, AttemptError> {
    match resp.data {
        Some(data) => Ok(data.items),
        None if resp.code == AUTH_FAILED_CODE => Err(AttemptError::AuthFailed {
            code: resp.code,
            message: resp.message.unwrap_or_default(),
        }),
        None => Err(AttemptError::Unexpected {
            code: resp.code,
            message: resp.message.unwrap_or_default(),
        }),
    }
}

fn terminal_message(err: &AttemptError) -> String {
    let detail = match err {
        AttemptError::Unexpected { code, message } => {
            format!("code={} message={}", code, message)
        }
        other => other.to_string(),
    };
    format!("rec-grid: unknown error, please report it\n\n  {}", detail)
}

/// Wraps a [`RemoteSource`] with retry, per-attempt timeout and
/// failure reporting.
pub struct RetryingFetcher<S> {
    source: Arc<S>,
    policy: RetryPolicy,
    notifier: Arc<dyn Notifier>,
    on_attempt_error: AttemptObserver,
}

impl<S: RemoteSource> RetryingFetcher<S> {
    pub fn new(source: Arc<S>, policy: RetryPolicy, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            source,
            policy,
            notifier,
            on_attempt_error: Arc::new(|err: &AttemptError, index: usize| {
                info!("Feed attempt {} failed: {}", index + 1, err);
            }),
        }
    }

    /// Replace the default logging observer.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&AttemptError, usize) + Send + Sync + 'static,
    {
        self.on_attempt_error = Arc::new(observer);
        self
    }

    async fn attempt(&self, page: u32) -> Result<Vec<RawRecItem>, AttemptError> {
        let request = self.source.fetch_page(page);
        let resp = match self.policy.timeout {
            // a late response is dropped together with the timed out future
            Some(limit) => timeout(limit, request)
                .await
                .map_err(|_| AttemptError::Timeout(limit))??,
            None => request.await?,
        };
        classify_response(resp)
    }

    /// Fetch one page.
    ///
    /// Retryable failures are retried up to the policy's attempt count.
    /// Terminal failures are reported once through the notifier and resolve
    /// to an empty batch.
    pub async fn fetch(&self, page: u32) -> Result<Vec<RawRecItem>, RetryExhausted> {
        let times = self.policy.times.max(1) as usize;
        let mut errors = Vec::with_capacity(times);

        for index in 0..times {
            match self.attempt(page).await {
                Ok(items) => {
                    if index > 0 {
                        info!("Feed page {} succeeded after {} attempts", page, index + 1);
                    }
                    return Ok(items);
                }
                Err(err) if err.is_retryable() => {
                    (self.on_attempt_error)(&err, index);
                    errors.push(err);
                    if index + 1 < times && !self.policy.delay.is_zero() {
                        sleep(self.policy.delay).await;
                    }
                }
                Err(err) => {
                    warn!("Feed page {} failed with a terminal error: {}", page, err);
                    self.notifier.error(&terminal_message(&err));
                    return Ok(Vec::new());
                }
            }
        }

        error!("Feed page {} failed after {} attempts", page, errors.len());
        Err(RetryExhausted { errors })
    }
}
