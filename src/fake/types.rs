//! Core types for the interception framework.
//!
//! This module defines the fundamental types used throughout the framework:
//!
//! - [`ArgValue`]: A type-erased argument or return value
//! - [`Call`]: Information about the call being dispatched
//! - [`RulePriority`]: Controls the order in which rules are evaluated
//! - [`RuleId`]: Identity of a configured rule segment
//! - [`CallOutcome`]: Result of dispatching a call through the rule manager
//! - [`CallRecord`]: Entry of a fake's received-call log
//! - [`ActionFn`] / [`ReturnFn`]: Type aliases for rule behavior closures

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

/// A type-erased argument or return value.
///
/// Arguments keep their concrete type inside the box so that matchers and captures can
/// downcast them with [`Call::arg`].
pub type ArgValue = Box<dyn Any + Send + Sync>;

/// Type alias for rule actions.
///
/// Actions run after a rule has been selected to serve a call, in the order they were
/// appended to the rule. They receive the call being served.
pub type ActionFn = Arc<dyn Fn(&Call) + Send + Sync>;

/// Type alias for return behaviors.
///
/// A return behavior produces the value handed back to the caller, or `None` for calls that
/// return nothing.
pub type ReturnFn = Arc<dyn Fn(&Call) -> Option<ArgValue> + Send + Sync>;

/// Type alias for whole-call predicates.
pub type CallPredicate = dyn Fn(&Call) -> bool + Send + Sync;

/// Priority level for rules, controlling evaluation order.
///
/// Higher priority rules are evaluated first. Within one priority level the most recently
/// configured rule is evaluated first, so a later `call_to` overrides an earlier one.
///
/// # Predefined Priorities
///
/// | Constant | Value | Use Case |
/// |----------|-------|----------|
/// | [`HIGHEST`](Self::HIGHEST) | 1000 | Override everything |
/// | [`HIGH`](Self::HIGH) | 500 | Specific patterns |
/// | [`NORMAL`](Self::NORMAL) | 0 | Default rules |
/// | [`LOW`](Self::LOW) | -500 | Fallback rules |
/// | [`LOWEST`](Self::LOWEST) | -1000 | Catch-all defaults |
///
/// # Examples
///
/// ```rust
/// use callcapture::fake::RulePriority;
///
/// assert!(RulePriority::HIGHEST > RulePriority::HIGH);
/// assert!(RulePriority::HIGH > RulePriority::NORMAL);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RulePriority(pub i32);

impl RulePriority {
    /// Highest priority - checked first (value: 1000).
    pub const HIGHEST: Self = Self(1000);

    /// High priority (value: 500).
    pub const HIGH: Self = Self(500);

    /// Normal priority - default (value: 0).
    pub const NORMAL: Self = Self(0);

    /// Low priority (value: -500).
    pub const LOW: Self = Self(-500);

    /// Lowest priority - checked last (value: -1000).
    pub const LOWEST: Self = Self(-1000);
}

impl Default for RulePriority {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Identity of one configured rule segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

/// A call received by a faked object.
///
/// The call owns its arguments for the duration of the dispatch. Besides the arguments it
/// carries a speculative slot: a small map where matchers can park data while the rule
/// manager searches for the rule that will serve the call. The slot is dropped together with
/// the call, so anything parked by a candidate that never gets selected disappears with it.
///
/// # Examples
///
/// ```rust
/// use callcapture::{args, fake::Call};
///
/// let call = Call::new(1, "clock", "delay", args![42_i32]);
/// assert_eq!(call.method(), "delay");
/// assert_eq!(call.arg::<i32>(0), Some(&42));
/// assert_eq!(call.arg::<u8>(0), None);
/// ```
pub struct Call {
    id: u64,
    fake: String,
    method: String,
    args: Vec<ArgValue>,
    speculative: Mutex<HashMap<u64, ArgValue>>,
}

impl Call {
    /// Creates a new call.
    ///
    /// # Arguments
    ///
    /// * `id` - Sequence number of the call on its fake
    /// * `fake` - Name of the faked object
    /// * `method` - Name of the invoked method
    /// * `args` - The boxed arguments, in declaration order
    #[must_use]
    pub fn new(
        id: u64,
        fake: impl Into<String>,
        method: impl Into<String>,
        args: Vec<ArgValue>,
    ) -> Self {
        Self {
            id,
            fake: fake.into(),
            method: method.into(),
            args,
            speculative: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the call's sequence number.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the name of the faked object.
    #[must_use]
    pub fn fake(&self) -> &str {
        &self.fake
    }

    /// Returns the invoked method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns all arguments.
    #[must_use]
    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Returns the argument at `index` if it exists and is a `T`.
    #[must_use]
    pub fn arg<T: Any>(&self, index: usize) -> Option<&T> {
        self.args.get(index).and_then(|arg| arg.downcast_ref::<T>())
    }

    /// Parks a value in the speculative slot, replacing any previous value under `key`.
    pub fn stash(&self, key: u64, value: ArgValue) {
        lock!(self.speculative).insert(key, value);
    }

    /// Removes and returns the value parked under `key`.
    pub fn take_stash(&self, key: u64) -> Option<ArgValue> {
        lock!(self.speculative).remove(&key)
    }

    /// Returns `true` if a value is parked under `key`.
    #[must_use]
    pub fn has_stash(&self, key: u64) -> bool {
        lock!(self.speculative).contains_key(&key)
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("id", &self.id)
            .field("fake", &self.fake)
            .field("method", &self.method)
            .field("arg_count", &self.args.len())
            .finish()
    }
}

/// Outcome of dispatching a call via [`RuleManager::dispatch`].
///
/// Errors are returned via `Result`, not as an outcome variant.
///
/// [`RuleManager::dispatch`]: crate::fake::RuleManager::dispatch
#[derive(Debug)]
pub enum CallOutcome {
    /// No rule applies to this call.
    NoMatch,

    /// A rule was selected and applied.
    Handled {
        /// The rule segment that served the call
        rule: RuleId,
        /// The value produced by the rule's return behavior
        value: Option<ArgValue>,
    },
}

/// One entry of a fake's received-call log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRecord {
    /// Sequence number of the call
    pub id: u64,
    /// The invoked method
    pub method: String,
    /// The rule that served the call, `None` if no rule applied
    pub rule: Option<RuleId>,
}
