// File: paintbot-core/src/services/mod.rs

pub mod reconciler;
pub mod registrar;
pub mod renderer;

use std::future::Future;
use std::time::Duration;

use crate::Error;

pub use reconciler::{EventReconciler, ReconcileOutcome};
pub use registrar::{RegistrationSummary, SubscriptionRegistrar};
pub use renderer::{NotificationRenderer, RenderMode, RenderReport};

/// Default bound on every outbound call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `fut` with a deadline. A timeout surfaces as [`Error::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::time::timeout(limit, fut).await?
}
