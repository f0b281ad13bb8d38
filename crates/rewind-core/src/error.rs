use std::time::Duration;

/// Why a reversal did not complete.
///
/// Either way the engine has already cleared the in-flight flag and left
/// both stacks exactly as they were before the attempt, so the same action
/// can be retried with no state to reconcile.
#[derive(Debug, thiserror::Error)]
pub enum ReversalError {
    /// The stored closure ran and rejected (network error, permission
    /// revoked mid-session, entity already gone server-side, …).
    #[error("reversal failed: {0:#}")]
    Failed(anyhow::Error),

    /// The round trip did not resolve within the configured budget.
    #[error("reversal timed out after {budget:?}")]
    TimedOut { budget: Duration },
}
