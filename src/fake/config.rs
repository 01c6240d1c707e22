//! Fake configuration types.
//!
//! [`FakeConfig`] controls how a faked object reacts to calls no rule applies to and how much
//! it logs while dispatching.
//!
//! # Configuration Presets
//!
//! - [`FakeConfig::loose()`] - Unconfigured calls return nothing (the default)
//! - [`FakeConfig::strict()`] - Unconfigured calls fail with [`crate::Error::UnconfiguredCall`]
//! - [`FakeConfig::traced()`] - Loose, with a trace event for every rule candidate
//!
//! # Example
//!
//! ```rust
//! use callcapture::{args, Error, Fake, FakeConfig};
//!
//! let fake = Fake::with_config("clock", FakeConfig::strict());
//! assert!(matches!(
//!     fake.invoke("delay", args![5_i32]),
//!     Err(Error::UnconfiguredCall { .. })
//! ));
//!
//! let config = FakeConfig {
//!     record_calls: false,
//!     ..FakeConfig::traced()
//! };
//! assert!(config.trace_dispatch);
//! ```

/// Behavior settings of one faked object.
///
/// # Default Configuration
///
/// - Unconfigured calls return nothing
/// - No per-candidate trace events
/// - Every received call is recorded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FakeConfig {
    /// Whether a call no rule applies to is an error.
    ///
    /// When false the call returns `None`.
    pub strict: bool,

    /// Whether to emit a `trace` event for each rule candidate during dispatch.
    ///
    /// Useful to see which rules a call probed before one was selected.
    pub trace_dispatch: bool,

    /// Whether received calls are appended to the fake's call log.
    ///
    /// Per-method call counts are kept either way.
    pub record_calls: bool,
}

impl FakeConfig {
    /// Creates the default (loose) configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::loose()
    }

    /// Unconfigured calls return nothing.
    #[must_use]
    pub fn loose() -> Self {
        Self {
            strict: false,
            trace_dispatch: false,
            record_calls: true,
        }
    }

    /// Unconfigured calls fail.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::loose()
        }
    }

    /// Loose configuration with per-candidate tracing.
    #[must_use]
    pub fn traced() -> Self {
        Self {
            trace_dispatch: true,
            ..Self::loose()
        }
    }

    /// Sets strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets per-candidate tracing.
    #[must_use]
    pub fn with_trace_dispatch(mut self, trace: bool) -> Self {
        self.trace_dispatch = trace;
        self
    }

    /// Sets call recording.
    #[must_use]
    pub fn with_record_calls(mut self, record: bool) -> Self {
        self.record_calls = record;
        self
    }
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self::loose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(FakeConfig::default(), FakeConfig::loose());
        assert!(FakeConfig::strict().strict);
        assert!(!FakeConfig::strict().trace_dispatch);
        assert!(FakeConfig::traced().trace_dispatch);
        assert!(FakeConfig::loose().record_calls);
    }

    #[test]
    fn test_builder() {
        let config = FakeConfig::new()
            .with_strict(true)
            .with_trace_dispatch(true)
            .with_record_calls(false);

        assert!(config.strict);
        assert!(config.trace_dispatch);
        assert!(!config.record_calls);
    }
}
