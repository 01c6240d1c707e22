//! Call interception framework for test doubles.
//!
//! This module provides [`Fake`], a dynamically configured test double. A fake does not
//! implement any trait by itself; test code wraps it in a small adapter that forwards each
//! trait method to [`Fake::invoke`] with the boxed arguments. Behavior is configured with
//! rules:
//!
//! - **Call expressions**: Match by method name and per-argument matchers
//! - **Ordered actions**: Closures that run when the rule serves a call
//! - **Return behaviors**: Fixed values, lazily computed values, or nothing
//! - **Repetition and chaining**: `number_of_times(n)` followed by `then()`
//!
//! # Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | `types` | Core types: calls, priorities, outcomes, call records |
//! | `matcher` | Matcher trait and implementations |
//! | `rule` | The [`BehaviorRule`] and its [`CallMatch`] |
//! | `manager` | [`RuleManager`] for rule registration and dispatch |
//! | `configure` | The fluent [`CallSpec`] and configuration handles |
//! | `config` | [`FakeConfig`] presets |
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Fake                               │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │  RuleManager: rules (priority, then newest first)   │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │                          │                                  │
//! │                          ▼                                  │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │  find_and_claim(call) -> Option<Arc<BehaviorRule>>  │   │
//! │  │  apply(call) -> actions in order, then returns      │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │                                                             │
//! │  received: per-method counts      log: received calls      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Dispatch Flow
//!
//! ```text
//! invoke(method, args)
//!         │
//!         ▼
//! ┌───────────────────┐
//! │  Next eligible    │───► None left ───► strict? Err : Ok(None)
//! │  rule             │
//! └───────────────────┘
//!         │
//!         ▼
//! ┌───────────────────┐
//! │  Run matchers     │───► Rejected ───► next rule
//! └───────────────────┘
//!         │ Matched
//!         ▼
//! ┌───────────────────┐
//! │  Claim repeat     │───► Lost ───► next rule
//! └───────────────────┘
//!         │
//!         ▼
//! ┌───────────────────┐
//! │  Actions, returns │
//! └───────────────────┘
//! ```
//!
//! # Examples
//!
//! ## Faking a Trait
//!
//! ```rust
//! use callcapture::{args, fake::Arg, CallSpec, Fake};
//!
//! trait Clock {
//!     fn delay(&self, millis: i32) -> bool;
//! }
//!
//! struct FakeClock(Fake);
//!
//! impl Clock for FakeClock {
//!     fn delay(&self, millis: i32) -> bool {
//!         self.0
//!             .invoke_as::<bool>("delay", args![millis])
//!             .ok()
//!             .flatten()
//!             .unwrap_or_default()
//!     }
//! }
//!
//! let fake = Fake::new("clock");
//! fake.call_to(CallSpec::new("delay").arg(Arg::that("long", |v: &i32| *v > 100)))
//!     .returns(true);
//!
//! let clock = FakeClock(fake.clone());
//! assert!(clock.delay(500));
//! assert!(!clock.delay(5));
//! assert_eq!(fake.received("delay"), 2);
//! ```

mod config;
mod configure;
mod manager;
mod matcher;
mod rule;
mod types;

use std::{
    any::{type_name, Any},
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use dashmap::DashMap;

pub use config::FakeConfig;
pub use configure::{CallSpec, ConfigurationHandle, ReturnConfiguration, RuleConfiguration};
pub use manager::RuleManager;
pub use matcher::{
    AnyMatcher, Arg, ArgMatcher, ArgPredicate, ArgSpec, EqMatcher, IntoArgMatcher,
    PredicateMatcher,
};
pub use rule::{BehaviorRule, CallMatch};
pub use types::{
    ActionFn, ArgValue, Call, CallOutcome, CallPredicate, CallRecord, ReturnFn, RuleId,
    RulePriority,
};

use crate::{Error, Result};

struct FakeState {
    name: String,
    config: FakeConfig,
    manager: Arc<RuleManager>,
    next_call: AtomicU64,
    received: DashMap<String, usize>,
    log: boxcar::Vec<CallRecord>,
}

/// A dynamically configured test double.
///
/// `Fake` is a cheap handle; clones share the same rules and call history, and the fake can
/// be called from any number of threads.
#[derive(Clone)]
pub struct Fake {
    state: Arc<FakeState>,
}

impl Fake {
    /// Creates a loose fake.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, FakeConfig::default())
    }

    /// Creates a fake with the given configuration.
    pub fn with_config(name: impl Into<String>, config: FakeConfig) -> Self {
        Self {
            state: Arc::new(FakeState {
                name: name.into(),
                config,
                manager: Arc::new(RuleManager::new()),
                next_call: AtomicU64::new(0),
                received: DashMap::new(),
                log: boxcar::Vec::new(),
            }),
        }
    }

    /// Returns the fake's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Returns the fake's configuration.
    #[must_use]
    pub fn config(&self) -> &FakeConfig {
        &self.state.config
    }

    /// Registers a rule for calls matching `spec` and returns its configuration handle.
    ///
    /// The new rule takes precedence over every earlier rule of the same priority.
    pub fn call_to(&self, spec: CallSpec) -> RuleConfiguration {
        let (call_match, priority, context) = spec.into_parts();
        let manager = &self.state.manager;

        let rule = Arc::new(BehaviorRule::new(
            manager.next_rule_id(),
            priority,
            call_match,
            None,
        ));
        manager.register(Arc::clone(&rule));

        tracing::debug!(
            fake = %self.state.name,
            rule = %rule.id(),
            expression = %rule.call_match().description(),
            "configured rule"
        );

        RuleConfiguration::new(Arc::clone(manager), &rule, context)
    }

    /// Serves a call.
    ///
    /// The call is recorded, dispatched through the rules, and the value produced by the
    /// applied rule is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnconfiguredCall`] if the fake is strict and no rule applies.
    pub fn invoke(&self, method: &str, args: Vec<ArgValue>) -> Result<Option<ArgValue>> {
        let state = &self.state;
        let call = Call::new(
            state.next_call.fetch_add(1, Ordering::SeqCst) + 1,
            state.name.as_str(),
            method,
            args,
        );

        *state.received.entry(method.to_string()).or_insert(0) += 1;

        let (rule, value) = match state.manager.dispatch(&call, state.config.trace_dispatch) {
            CallOutcome::Handled { rule, value } => (Some(rule), value),
            CallOutcome::NoMatch => (None, None),
        };

        if state.config.record_calls {
            state.log.push(CallRecord {
                id: call.id(),
                method: method.to_string(),
                rule,
            });
        }

        if rule.is_none() {
            tracing::debug!(fake = %state.name, method, call = call.id(), "no rule applies");
            if state.config.strict {
                return Err(Error::UnconfiguredCall {
                    fake: state.name.clone(),
                    method: method.to_string(),
                });
            }
        }

        Ok(value)
    }

    /// Serves a call and downcasts the returned value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnconfiguredCall`] as [`Fake::invoke`] does, and
    /// [`Error::ReturnTypeMismatch`] if the applied rule returned a value of another type.
    pub fn invoke_as<R: Any>(&self, method: &str, args: Vec<ArgValue>) -> Result<Option<R>> {
        match self.invoke(method, args)? {
            None => Ok(None),
            Some(value) => value
                .downcast::<R>()
                .map(|value| Some(*value))
                .map_err(|_| Error::ReturnTypeMismatch {
                    method: method.to_string(),
                    expected: type_name::<R>(),
                }),
        }
    }

    /// Returns how many times `method` was called.
    #[must_use]
    pub fn received(&self, method: &str) -> usize {
        self.state.received.get(method).map_or(0, |count| *count)
    }

    /// Returns the recorded calls in the order they were recorded.
    #[must_use]
    pub fn received_calls(&self) -> Vec<CallRecord> {
        self.state
            .log
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Returns the number of registered rule segments.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.state.manager.len()
    }

    /// Removes every rule. Call history is kept.
    ///
    /// Configuration handles of removed rules stay usable but have no effect, and capture
    /// extensions report them as not locatable.
    pub fn clear_configuration(&self) {
        self.state.manager.clear();
        tracing::debug!(fake = %self.state.name, "configuration cleared");
    }
}

impl fmt::Debug for Fake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fake")
            .field("name", &self.state.name)
            .field("config", &self.state.config)
            .field("rules", &self.state.manager.len())
            .field("calls", &self.state.next_call.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_fake_returns_nothing() {
        let fake = Fake::new("clock");
        assert!(fake.invoke("delay", args![1_i32]).unwrap().is_none());
        assert_eq!(fake.received("delay"), 1);
        assert_eq!(fake.received("now"), 0);
    }

    #[test]
    fn test_strict_fake_rejects_unconfigured_calls() {
        let fake = Fake::with_config("clock", FakeConfig::strict());
        fake.call_to(CallSpec::new("delay").arg(Arg::eq(1_i32)))
            .does_nothing();

        assert!(fake.invoke("delay", args![1_i32]).is_ok());
        match fake.invoke("delay", args![2_i32]) {
            Err(Error::UnconfiguredCall { fake, method }) => {
                assert_eq!(fake, "clock");
                assert_eq!(method, "delay");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_invoke_as_checks_type() {
        let fake = Fake::new("clock");
        fake.call_to(CallSpec::new("now")).returns(7_u64);

        assert_eq!(fake.invoke_as::<u64>("now", args![]).unwrap(), Some(7));
        assert!(matches!(
            fake.invoke_as::<i32>("now", args![]),
            Err(Error::ReturnTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_received_calls_log() {
        let fake = Fake::new("clock");
        let rule = fake
            .call_to(CallSpec::new("delay").arg(Arg::any::<i32>()))
            .rule_id();

        fake.invoke("delay", args![1_i32]).unwrap();
        fake.invoke("now", args![]).unwrap();

        let calls = fake.received_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, "delay");
        assert_eq!(calls[0].rule, rule);
        assert_eq!(calls[1].rule, None);
        assert!(calls[0].id < calls[1].id);
    }

    #[test]
    fn test_record_calls_disabled() {
        let fake = Fake::with_config("clock", FakeConfig::loose().with_record_calls(false));
        fake.invoke("now", args![]).unwrap();

        assert!(fake.received_calls().is_empty());
        assert_eq!(fake.received("now"), 1);
    }

    #[test]
    fn test_returns_lazily_uses_call() {
        let fake = Fake::new("clock");
        fake.call_to(CallSpec::new("delay").arg(Arg::any::<i32>()))
            .returns_lazily(|call: &Call| call.arg::<i32>(0).copied().unwrap_or_default() + 1);

        assert_eq!(fake.invoke_as::<i32>("delay", args![41_i32]).unwrap(), Some(42));
    }

    #[test]
    fn test_invokes_runs_before_return() {
        let fake = Fake::new("clock");
        let other = Fake::new("log");
        let forward = other.clone();

        fake.call_to(CallSpec::new("delay").arg(Arg::any::<i32>()))
            .invokes(move |_call| {
                let _ = forward.invoke("write", args![]);
            })
            .returns(true);

        assert_eq!(fake.invoke_as::<bool>("delay", args![1_i32]).unwrap(), Some(true));
        assert_eq!(other.received("write"), 1);
    }

    #[test]
    fn test_clear_configuration_keeps_history() {
        let fake = Fake::new("clock");
        fake.call_to(CallSpec::new("now")).returns(1_u64);
        fake.invoke("now", args![]).unwrap();
        fake.clear_configuration();

        assert_eq!(fake.rule_count(), 0);
        assert_eq!(fake.invoke_as::<u64>("now", args![]).unwrap(), None);
        assert_eq!(fake.received("now"), 2);
    }
}
