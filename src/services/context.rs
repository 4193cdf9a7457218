//! Per-call cancellation and deadline
//!
//! Cancellation is cooperative: handlers call [`CallContext::check`] before
//! each unit of work inside a loop. Clones share the same cancel flag, so
//! the caller keeps one clone to cancel while the handler polls another.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tonic::metadata::MetadataMap;
use tracing::{debug, warn};

use crate::types::CatalogError;

/// Metadata key carrying the caller's timeout
pub const GRPC_TIMEOUT: &str = "grpc-timeout";

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    canceled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never canceled and has no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Apply the caller's `grpc-timeout` header, if any. The earlier of the
    /// existing deadline and the header's wins; the cancel flag is kept.
    pub fn with_metadata(self, metadata: &MetadataMap) -> Self {
        let Some(header) = metadata
            .get(GRPC_TIMEOUT)
            .and_then(|value| value.to_str().ok())
        else {
            return self;
        };

        let Some(timeout) = parse_grpc_timeout(header) else {
            warn!(header, "ignoring malformed grpc-timeout");
            return self;
        };

        let deadline = Instant::now() + timeout;
        match self.deadline() {
            Some(existing) if existing <= deadline => self,
            _ => self.with_deadline(deadline),
        }
    }

    /// Signal cancellation to every clone of this context
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail with `Canceled` or `DeadlineExceeded` if the call should stop
    pub fn check(&self) -> Result<(), CatalogError> {
        if self.is_canceled() {
            debug!("request is canceled");
            return Err(CatalogError::Canceled);
        }

        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                debug!("deadline is exceeded");
                return Err(CatalogError::DeadlineExceeded);
            }
        }

        Ok(())
    }
}

/// Parse a gRPC timeout value: at most 8 digits followed by a unit
/// (`H`, `M`, `S`, `m`, `u`, `n`).
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || value.len() > 9 || !value.is_ascii() {
        return None;
    }

    let (digits, unit) = value.split_at(value.len() - 1);
    let amount: u64 = digits.parse().ok()?;

    match unit {
        "H" => Some(Duration::from_secs(amount * 3600)),
        "M" => Some(Duration::from_secs(amount * 60)),
        "S" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_millis(amount)),
        "u" => Some(Duration::from_micros(amount)),
        "n" => Some(Duration::from_nanos(amount)),
        _ => None,
    }
}
