//! `RuntimeBuilder` for configuring a [`Runtime`].

use scopekit_ir::SharedInterner;

use super::Runtime;
use crate::config::RuntimeConfig;
use crate::size::{HeapSizeEstimator, SizeEstimator};

/// Builder for [`Runtime`] instances.
///
/// Defaults: call depth limited to [`DEFAULT_MAX_DEPTH`](crate::DEFAULT_MAX_DEPTH),
/// a private interner, and [`HeapSizeEstimator`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    interner: Option<SharedInterner>,
    estimator: Box<dyn SizeEstimator>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        RuntimeBuilder {
            config: RuntimeConfig::default(),
            interner: None,
            estimator: Box::new(HeapSizeEstimator),
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Limit the number of simultaneously active calls.
    #[must_use]
    pub fn max_depth(mut self, limit: usize) -> Self {
        self.config.max_depth = Some(limit);
        self
    }

    /// Remove the call-depth limit. Native stack growth still applies.
    #[must_use]
    pub fn unbounded_depth(mut self) -> Self {
        self.config.max_depth = None;
        self
    }

    #[must_use]
    pub fn initial_capacity(mut self, environments: usize) -> Self {
        self.config.initial_capacity = environments;
        self
    }

    /// Share binding names with the host (or with another runtime).
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    #[must_use]
    pub fn size_estimator(mut self, estimator: impl SizeEstimator + 'static) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    pub fn build(self) -> Runtime {
        Runtime::from_parts(
            self.config,
            self.interner.unwrap_or_default(),
            self.estimator,
        )
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
