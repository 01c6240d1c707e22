//! Fluent extensions that attach captures to configured rules.
//!
//! [`WithCapture`] is implemented for every [`ConfigurationHandle`] and switches the
//! expression's containers to deferred commit, so that only the rule that actually serves a
//! call commits the value its matchers saw. [`CapturesInto`] is the simpler, action-based
//! alternative: it copies an argument into a container whenever the rule is applied.

use std::sync::Arc;

use crate::{
    capture::{
        commit::CommitTrigger,
        container::{CaptureContainer, Committable},
        locator::{RuleHandle, RuleLocator, StructuralLocator},
    },
    fake::{Call, ConfigurationHandle, RuleConfiguration},
    Result,
};

/// Attaches capture commits to the rule behind a configuration handle.
///
/// # Examples
///
/// Only the rule that serves the call commits:
///
/// ```rust
/// use callcapture::{args, fake::Arg, CallSpec, CaptureContainer, Fake, WithCapture};
///
/// let clock = Fake::new("clock");
/// let delay = CaptureContainer::<i32>::new();
///
/// clock
///     .call_to(CallSpec::new("delay").arg(delay.to_placeholder()?))
///     .does_nothing()
///     .with_capture()?;
/// clock
///     .call_to(CallSpec::new("delay").arg(Arg::eq(3_i32)))
///     .does_nothing();
///
/// clock.invoke("delay", args![1_i32])?;
/// clock.invoke("delay", args![3_i32])?;
///
/// assert_eq!(delay.values(), vec![1]);
/// # Ok::<(), callcapture::Error>(())
/// ```
pub trait WithCapture: ConfigurationHandle + Sized {
    /// Attaches every container of the expression.
    ///
    /// The first call attaches the containers whose placeholders were installed in the
    /// expression. Later calls on chained segments attach the same containers again. With no
    /// containers in the expression this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RuleNotLocatable`] if the rule behind the handle can not be
    /// reached. The expression's open containers are left untouched in that case.
    fn with_capture(self) -> Result<Self> {
        self.with_capture_using(&StructuralLocator)
    }

    /// Attaches the listed containers only.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RuleNotLocatable`] if the rule behind the handle can not be
    /// reached.
    fn with_capture_of(self, captures: &[&dyn Committable]) -> Result<Self> {
        self.with_capture_of_using(&StructuralLocator, captures)
    }

    /// [`WithCapture::with_capture`] with a custom rule locator.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RuleNotLocatable`] if `locator` fails.
    fn with_capture_using(mut self, locator: &dyn RuleLocator) -> Result<Self> {
        let rule = locator.locate(&self)?;
        let captures = self.build_context_mut().attach_open();
        attach(&rule, captures);
        Ok(self)
    }

    /// [`WithCapture::with_capture_of`] with a custom rule locator.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RuleNotLocatable`] if `locator` fails.
    fn with_capture_of_using(
        mut self,
        locator: &dyn RuleLocator,
        captures: &[&dyn Committable],
    ) -> Result<Self> {
        let rule = locator.locate(&self)?;
        let captures: Vec<Arc<dyn Committable>> = captures.iter().map(|c| c.shared()).collect();
        self.build_context_mut().attach_listed(&captures);
        attach(&rule, captures);
        Ok(self)
    }
}

impl<H: ConfigurationHandle> WithCapture for H {}

fn attach(rule: &RuleHandle, captures: Vec<Arc<dyn Committable>>) {
    if captures.is_empty() {
        tracing::debug!(rule = %rule.id(), "no captures to attach");
        return;
    }

    for capture in &captures {
        capture.defer();
    }
    CommitTrigger::new(captures).attach_to(rule);
}

/// Copies an argument into a container whenever the configured rule is applied.
///
/// Unlike a placeholder this does not constrain the call expression. The container is not
/// consumed and may be used for other expressions as well.
pub trait CapturesInto: ConfigurationHandle + Sized {
    /// Appends the argument at `index` to `capture` each time the rule serves a call.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RuleNotLocatable`] if the rule behind the handle can not be
    /// reached.
    fn captures_arg_into<T>(self, index: usize, capture: &CaptureContainer<T>) -> Result<Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        let rule = StructuralLocator.locate(&self)?;
        let capture = capture.clone();
        rule.push_action(Arc::new(move |call: &Call| match call.arg::<T>(index) {
            Some(value) => capture.append(value.clone()),
            None => tracing::warn!(
                call = call.id(),
                method = call.method(),
                index,
                expected = std::any::type_name::<T>(),
                "argument not available for capture"
            ),
        }));
        Ok(self)
    }
}

impl CapturesInto for RuleConfiguration {}
