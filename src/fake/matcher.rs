//! Matcher trait and implementations for argument matching.
//!
//! This module defines the [`ArgMatcher`] trait and the built-in matchers a call expression
//! uses to decide whether a rule applies to a call. Each matcher inspects exactly one
//! argument position.
//!
//! # Available Matchers
//!
//! | Matcher | Constructor | Description |
//! |---------|-------------|-------------|
//! | [`AnyMatcher`] | [`Arg::any`] | Any value of the given type |
//! | [`EqMatcher`] | [`Arg::eq`] | A value equal to the expected one |
//! | [`PredicateMatcher`] | [`Arg::that`] | A value accepted by a closure |
//!
//! # Evaluation
//!
//! Matchers are evaluated speculatively. While the rule manager searches for the rule that
//! will serve a call, it runs the matchers of every eligible candidate it looks at, in
//! argument order, stopping at the first matcher that rejects. A matcher running therefore
//! does not mean its rule gets applied. Matchers must not fail and should not have side
//! effects beyond what they park in the call's speculative slot.

use std::{any::Any, fmt::Debug, marker::PhantomData, sync::Arc};

use crate::{capture::BuildContext, fake::types::Call};

/// Trait for implementing argument matchers.
///
/// # Implementing Custom Matchers
///
/// ```rust
/// use std::any::Any;
/// use callcapture::fake::{ArgMatcher, Call};
///
/// struct EvenMatcher;
///
/// impl ArgMatcher for EvenMatcher {
///     fn matches(&self, arg: &(dyn Any + Send + Sync), _call: &Call) -> bool {
///         arg.downcast_ref::<i32>().is_some_and(|v| v % 2 == 0)
///     }
///
///     fn description(&self) -> String {
///         "even i32".to_string()
///     }
/// }
/// ```
///
/// # Thread Safety
///
/// Matchers must be `Send + Sync`, faked objects can be called from any thread.
pub trait ArgMatcher: Send + Sync {
    /// Checks if this matcher accepts the argument.
    ///
    /// # Arguments
    ///
    /// * `arg` - The argument at the matcher's position
    /// * `call` - The call being dispatched
    fn matches(&self, arg: &(dyn Any + Send + Sync), call: &Call) -> bool;

    /// Returns a description of this matcher for debugging.
    fn description(&self) -> String;
}

/// Conversion of an argument specification into an installed matcher.
///
/// This is the matcher registration hook of a call expression. The build context of the
/// expression is passed along so that specifications with capture side effects can register
/// themselves for later attachment.
pub trait IntoArgMatcher {
    /// Converts `self` into the matcher installed at one argument position.
    fn into_arg_matcher(self, context: &mut BuildContext) -> Box<dyn ArgMatcher>;
}

/// An argument specification produced by the [`Arg`] constructors.
pub struct ArgSpec(Box<dyn ArgMatcher>);

impl IntoArgMatcher for ArgSpec {
    fn into_arg_matcher(self, _context: &mut BuildContext) -> Box<dyn ArgMatcher> {
        self.0
    }
}

impl Debug for ArgSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ArgSpec").field(&self.0.description()).finish()
    }
}

/// Constructors for argument specifications.
///
/// # Examples
///
/// ```rust
/// use callcapture::{fake::Arg, CallSpec};
///
/// let spec = CallSpec::new("send")
///     .arg(Arg::eq(String::from("alice")))
///     .arg(Arg::any::<u32>())
///     .arg(Arg::that("positive", |v: &i64| *v > 0));
/// assert_eq!(spec.arg_count(), 3);
/// ```
pub struct Arg;

impl Arg {
    /// Matches any value of type `T`.
    #[must_use]
    pub fn any<T: Any>() -> ArgSpec {
        ArgSpec(Box::new(AnyMatcher::<T>::new()))
    }

    /// Matches values equal to `expected`.
    #[must_use]
    pub fn eq<T>(expected: T) -> ArgSpec
    where
        T: PartialEq + Debug + Send + Sync + 'static,
    {
        ArgSpec(Box::new(EqMatcher::new(expected)))
    }

    /// Matches values of type `T` accepted by `predicate`.
    #[must_use]
    pub fn that<T, F>(description: impl Into<String>, predicate: F) -> ArgSpec
    where
        T: Any,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        ArgSpec(Box::new(PredicateMatcher::new(description, predicate)))
    }

    /// Wraps a custom matcher.
    #[must_use]
    pub fn matcher<M: ArgMatcher + 'static>(matcher: M) -> ArgSpec {
        ArgSpec(Box::new(matcher))
    }
}

/// Matches any argument of type `T`.
pub struct AnyMatcher<T> {
    _type: PhantomData<fn() -> T>,
}

impl<T: Any> AnyMatcher<T> {
    /// Creates a new matcher for values of type `T`.
    #[must_use]
    pub fn new() -> Self {
        Self { _type: PhantomData }
    }
}

impl<T: Any> Default for AnyMatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Any> ArgMatcher for AnyMatcher<T> {
    fn matches(&self, arg: &(dyn Any + Send + Sync), _call: &Call) -> bool {
        arg.is::<T>()
    }

    fn description(&self) -> String {
        format!("any {}", std::any::type_name::<T>())
    }
}

/// Matches arguments equal to an expected value.
#[derive(Debug)]
pub struct EqMatcher<T> {
    expected: T,
}

impl<T> EqMatcher<T>
where
    T: PartialEq + Debug + Send + Sync + 'static,
{
    /// Creates a new equality matcher.
    #[must_use]
    pub fn new(expected: T) -> Self {
        Self { expected }
    }
}

impl<T> ArgMatcher for EqMatcher<T>
where
    T: PartialEq + Debug + Send + Sync + 'static,
{
    fn matches(&self, arg: &(dyn Any + Send + Sync), _call: &Call) -> bool {
        arg.downcast_ref::<T>().is_some_and(|v| *v == self.expected)
    }

    fn description(&self) -> String {
        format!("{:?}", self.expected)
    }
}

/// Type alias for argument predicates.
pub type ArgPredicate<T> = dyn Fn(&T) -> bool + Send + Sync;

/// Matches arguments of type `T` by running a closure over them.
///
/// # Performance
///
/// Predicates may run several times for one call (once per candidate rule). Keep them cheap.
pub struct PredicateMatcher<T> {
    predicate: Arc<ArgPredicate<T>>,
    description: String,
}

impl<T: Any> PredicateMatcher<T> {
    /// Creates a new predicate matcher.
    ///
    /// # Arguments
    ///
    /// * `description` - Human-readable description of what this matches
    /// * `predicate` - Function that returns `true` for accepted values
    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            description: description.into(),
        }
    }
}

impl<T: Any> ArgMatcher for PredicateMatcher<T> {
    fn matches(&self, arg: &(dyn Any + Send + Sync), _call: &Call) -> bool {
        arg.downcast_ref::<T>()
            .is_some_and(|value| (self.predicate)(value))
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}
