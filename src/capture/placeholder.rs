//! Placeholder argument and speculative matcher.
//!
//! A [`Placeholder`] stands in for an argument of a call expression. When the expression is
//! built it turns into a [`SpeculativeMatcher`] bound to the container it came from, and the
//! container is registered as open in the expression's build context so that a later
//! `with_capture()` can attach it.

use std::{any::Any, fmt};

use crate::{
    capture::{container::CaptureContainer, registry::BuildContext, Committable},
    fake::{ArgMatcher, Call, IntoArgMatcher},
};

/// Argument matcher that accepts every value of its type and records it.
///
/// The matcher never rejects a value of the right type, so it never changes which rule is
/// selected. A value of another type is rejected, the same way [`crate::fake::Arg::any`]
/// would reject it.
pub struct SpeculativeMatcher<T> {
    container: CaptureContainer<T>,
    description: String,
}

impl<T> SpeculativeMatcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(container: CaptureContainer<T>) -> Self {
        Self {
            container,
            description: format!("captured parameter {}", std::any::type_name::<T>()),
        }
    }

    /// Returns the container this matcher records into.
    #[must_use]
    pub fn container(&self) -> &CaptureContainer<T> {
        &self.container
    }
}

impl<T> ArgMatcher for SpeculativeMatcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn matches(&self, arg: &(dyn Any + Send + Sync), call: &Call) -> bool {
        match arg.downcast_ref::<T>() {
            Some(value) => self.container.record_speculative(call, value.clone()),
            None => {
                tracing::warn!(
                    capture = self.container.id(),
                    call = call.id(),
                    method = call.method(),
                    "{} received an argument of another type",
                    self.description
                );
                false
            }
        }
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

/// A capture container converted for use as one argument of a call expression.
///
/// Obtained from [`CaptureContainer::to_placeholder`], consumed by
/// [`crate::CallSpec::arg`].
pub struct Placeholder<T> {
    matcher: SpeculativeMatcher<T>,
}

impl<T> Placeholder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(matcher: SpeculativeMatcher<T>) -> Self {
        Self { matcher }
    }

    /// Returns the container behind the placeholder.
    #[must_use]
    pub fn container(&self) -> &CaptureContainer<T> {
        self.matcher.container()
    }

    /// Returns the description of the installed matcher.
    #[must_use]
    pub fn description(&self) -> String {
        self.matcher.description()
    }
}

impl<T> IntoArgMatcher for Placeholder<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn into_arg_matcher(self, context: &mut BuildContext) -> Box<dyn ArgMatcher> {
        context.register_open(self.matcher.container().shared());
        Box::new(self.matcher)
    }
}

impl<T> fmt::Debug for Placeholder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placeholder")
            .field("description", &self.matcher.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_description() {
        let capture = CaptureContainer::<i32>::new();
        let placeholder = capture.to_placeholder().unwrap();

        assert_eq!(placeholder.description(), "captured parameter i32");
        assert_eq!(placeholder.container().id(), capture.id());
    }

    #[test]
    fn test_into_matcher_registers_open_capture() {
        let capture = CaptureContainer::<i32>::new();
        let mut context = BuildContext::new();

        let matcher = capture
            .to_placeholder()
            .unwrap()
            .into_arg_matcher(&mut context);

        assert_eq!(context.registry().len(), 1);
        assert_eq!(matcher.description(), "captured parameter i32");
    }

    #[test]
    fn test_matcher_accepts_and_records() {
        let capture = CaptureContainer::<i32>::new();
        let matcher = SpeculativeMatcher::new(capture.clone());
        let call = Call::new(1, "clock", "delay", args![7_i32]);

        assert!(matcher.matches(&*call.args()[0], &call));
        assert_eq!(capture.values(), vec![7]);
    }

    #[test]
    fn test_matcher_rejects_other_types() {
        let capture = CaptureContainer::<i32>::new();
        let matcher = SpeculativeMatcher::new(capture.clone());
        let call = Call::new(1, "clock", "delay", args!["seven"]);

        assert!(!matcher.matches(&*call.args()[0], &call));
        assert!(!capture.has_values());
    }
}
