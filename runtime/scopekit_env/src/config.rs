//! Runtime configuration.

/// Default call-depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 5000;

/// Settings fixed when a [`Runtime`](crate::Runtime) is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of active call frames; `None` for no limit.
    ///
    /// Exceeding it fails the call with
    /// [`EnvError::DepthExceeded`](crate::EnvError::DepthExceeded) and leaves
    /// the stack as it was before the call.
    pub max_depth: Option<usize>,
    /// Environments to reserve room for up front.
    pub initial_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            initial_capacity: 64,
        }
    }
}
