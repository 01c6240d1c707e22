//! # callcapture Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the callcapture library. Import this module to configure fakes and capture their
//! arguments without listing every type.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all callcapture operations
pub use crate::Error;

/// The result type used throughout callcapture
pub use crate::Result;

/// Builds the boxed argument list of a call
pub use crate::args;

// ================================================================================================
// Fake Framework
// ================================================================================================

/// The faked object, its configuration and the call expression builder
pub use crate::fake::{CallSpec, Fake, FakeConfig};

/// Argument matcher constructors and priorities
pub use crate::fake::{Arg, RulePriority};

/// A dispatched call, as seen by actions and lazy return values
pub use crate::fake::Call;

/// Fluent configuration handles
pub use crate::fake::{ConfigurationHandle, ReturnConfiguration, RuleConfiguration};

// ================================================================================================
// Capture
// ================================================================================================

/// Capture container and its lifecycle
pub use crate::capture::{CaptureContainer, CaptureState, CommitMode};

/// Fluent capture extensions
pub use crate::capture::{CapturesInto, WithCapture};
