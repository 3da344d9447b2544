//! Request Timeouts
//!
//! Per-call deadline enforcement for provider requests. The wrapped future is
//! dropped when the deadline passes, which cancels the in-flight HTTP request,
//! and the expiry surfaces as a typed `REQUEST_TIMEOUT` error.
//!
//! ## Usage
//!
//! ```ignore
//! let response = with_timeout(
//!     Duration::from_millis(30_000),
//!     ProviderKind::OpenAi,
//!     async { client.post(url).send().await },
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::ai::provider::ProviderKind;
use crate::constants::network as net_constants;
use crate::types::{AiError, AiResult};

/// Default per-request timeout
pub fn default_timeout() -> Duration {
    Duration::from_millis(net_constants::DEFAULT_TIMEOUT_MS)
}

/// Execute an async operation with a timeout
///
/// Returns `REQUEST_TIMEOUT` (408) if the operation doesn't complete within
/// the specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, provider: ProviderKind, future: F) -> AiResult<T>
where
    F: Future<Output = AiResult<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(AiError::request_timeout(provider, timeout)),
    }
}
