use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into two groups. The capture errors are raised by the capture containers and
/// the rule bridge, and always point at a mistake in the test itself. The framework errors are
/// raised by faked objects while serving a call.
///
/// # Error Categories
///
/// ## Capture Errors
/// - [`Error::EmptyCapture`] - A single value was requested but nothing was committed
/// - [`Error::MultipleValuesCaptured`] - A single value was requested but several were committed
/// - [`Error::AlreadyConsumed`] - A container was used to configure a second call expression
/// - [`Error::RuleNotLocatable`] - The rule behind a configuration handle could not be reached
///
/// ## Framework Errors
/// - [`Error::UnconfiguredCall`] - A strict fake received a call no rule applies to
/// - [`Error::ReturnTypeMismatch`] - A configured return value has a different type than requested
///
/// # Examples
///
/// ```rust
/// use callcapture::{CaptureContainer, Error};
///
/// let capture = CaptureContainer::<i32>::new();
/// match capture.value() {
///     Err(Error::EmptyCapture { .. }) => println!("nothing captured yet"),
///     Err(e) => println!("other error: {e}"),
///     Ok(v) => println!("captured {v}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// No value has been committed to the container.
    ///
    /// Returned by [`crate::CaptureContainer::value`] when the faked method was never
    /// called, or when every call was served by a rule that does not commit this container.
    #[error("No values have been captured for {type_name}")]
    EmptyCapture {
        /// Name of the captured type
        type_name: &'static str,
    },

    /// More than one value has been committed to the container.
    ///
    /// [`crate::CaptureContainer::value`] only serves single captures; use
    /// [`crate::CaptureContainer::values`] to read the whole sequence.
    #[error("Multiple values were captured ({count}). Use values() instead")]
    MultipleValuesCaptured {
        /// Number of committed values
        count: usize,
    },

    /// The container already backs another call expression.
    ///
    /// A container can be turned into a placeholder exactly once. Chained segments of the same
    /// expression reuse the container through `with_capture`, not through a new placeholder.
    #[error(
        "Capture of {type_name} can only be used to configure a single call. \
         To read the captured value use value() or values()"
    )]
    AlreadyConsumed {
        /// Name of the captured type
        type_name: &'static str,
    },

    /// The concrete rule behind a configuration handle could not be reached.
    ///
    /// The bridge from a fluent configuration handle to its rule depends on the internal
    /// layout of the handle. This error is raised at configuration time so that a broken
    /// bridge can not produce a test that silently never captures anything.
    ///
    /// # Fields
    ///
    /// * `handle` - Type name of the configuration handle
    /// * `reason` - Which step of the bridge failed
    #[error("Rule behind '{handle}' is not locatable: {reason}")]
    RuleNotLocatable {
        /// Type name of the handle passed to the locator
        handle: &'static str,
        /// The step of the bridge that failed
        reason: String,
    },

    /// A strict fake received a call that no configured rule applies to.
    #[error("Call to '{fake}.{method}' has not been configured")]
    UnconfiguredCall {
        /// Name of the faked object
        fake: String,
        /// The method that was invoked
        method: String,
    },

    /// The value produced by the applied rule is not of the requested type.
    #[error("Return value of '{method}' is not a {expected}")]
    ReturnTypeMismatch {
        /// The method that was invoked
        method: String,
        /// Name of the requested type
        expected: &'static str,
    },
}
