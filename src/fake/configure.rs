//! Call expressions and fluent rule configuration.
//!
//! This module provides the fluent surface test authors use to configure a faked object:
//!
//! - [`CallSpec`] - The call expression: method name, argument matchers, optional predicate
//! - [`RuleConfiguration`] - Handle returned by [`crate::Fake::call_to`]
//! - [`ReturnConfiguration`] - Handle returned once a return behavior has been chosen
//! - [`ConfigurationHandle`] - What every handle exposes to extensions
//!
//! # Chaining
//!
//! [`ReturnConfiguration::then`] starts a new segment for the same call expression. The new
//! segment shares the expression's matchers and becomes eligible once the previous segment
//! has used up its [`number_of_times`](ReturnConfiguration::number_of_times).
//!
//! ```rust
//! use callcapture::{args, fake::Arg, CallSpec, Fake};
//!
//! let clock = Fake::new("clock");
//! clock
//!     .call_to(CallSpec::new("now").arg(Arg::any::<u8>()))
//!     .returns(1_u64)
//!     .number_of_times(2)
//!     .then()
//!     .returns(5_u64);
//!
//! let now = |fake: &Fake| fake.invoke_as::<u64>("now", args![0_u8]);
//! assert_eq!(now(&clock)?, Some(1));
//! assert_eq!(now(&clock)?, Some(1));
//! assert_eq!(now(&clock)?, Some(5));
//! assert_eq!(now(&clock)?, Some(5));
//! # Ok::<(), callcapture::Error>(())
//! ```
//!
//! # Handles and Rules
//!
//! Handles only hold a weak reference to their rule; the rule itself belongs to the fake.
//! Configuring a handle whose rule was removed by [`crate::Fake::clear_configuration`] has no
//! effect.

use std::{
    any::Any,
    fmt,
    sync::{Arc, Weak},
};

use crate::{
    capture::BuildContext,
    fake::{
        manager::RuleManager,
        matcher::{ArgMatcher, IntoArgMatcher},
        rule::{BehaviorRule, CallMatch},
        types::{ArgValue, Call, CallPredicate, RuleId, RulePriority},
    },
};

/// A call expression under construction.
///
/// The expression owns the [`BuildContext`] that tracks the capture containers installed in
/// it. The context travels on with the configuration handles.
pub struct CallSpec {
    method: String,
    matchers: Vec<Box<dyn ArgMatcher>>,
    predicate: Option<(String, Arc<CallPredicate>)>,
    priority: RulePriority,
    context: BuildContext,
}

impl CallSpec {
    /// Starts an expression for calls to `method`.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            matchers: Vec::new(),
            predicate: None,
            priority: RulePriority::default(),
            context: BuildContext::new(),
        }
    }

    /// Adds the matcher for the next argument position.
    #[must_use]
    pub fn arg(mut self, spec: impl IntoArgMatcher) -> Self {
        let matcher = spec.into_arg_matcher(&mut self.context);
        self.matchers.push(matcher);
        self
    }

    /// Adds a predicate over the whole call, checked after the argument matchers.
    #[must_use]
    pub fn when<F>(mut self, description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Call) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some((description.into(), Arc::new(predicate)));
        self
    }

    /// Sets the priority of the rules configured from this expression.
    #[must_use]
    pub fn with_priority(mut self, priority: RulePriority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the number of argument matchers.
    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.matchers.len()
    }

    /// Returns the priority.
    #[must_use]
    pub fn priority(&self) -> RulePriority {
        self.priority
    }

    /// Returns the expression's build context.
    #[must_use]
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub(crate) fn into_parts(self) -> (Arc<CallMatch>, RulePriority, BuildContext) {
        let call_match = CallMatch::new(self.method, self.matchers, self.predicate);
        (Arc::new(call_match), self.priority, self.context)
    }
}

impl fmt::Debug for CallSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.matchers.iter().map(|m| m.description()).collect();
        f.debug_struct("CallSpec")
            .field("method", &self.method)
            .field("args", &args)
            .field("predicate", &self.predicate.as_ref().map(|(d, _)| d))
            .field("priority", &self.priority)
            .finish()
    }
}

/// What a fluent configuration handle exposes to extensions.
///
/// Extensions such as [`crate::WithCapture`] are implemented for every type implementing
/// this trait. They reach the rule behind the handle through a
/// [`crate::capture::RuleLocator`], which inspects [`as_any`](Self::as_any).
pub trait ConfigurationHandle: Any {
    /// Returns the handle as [`Any`] so that locators can recognise it.
    fn as_any(&self) -> &dyn Any;

    /// Returns the build context of the handle's call expression.
    fn build_context_mut(&mut self) -> &mut BuildContext;

    /// Returns the handle's type name, used in diagnostics.
    fn handle_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Handle for configuring the behavior of one rule segment.
///
/// Returned by [`crate::Fake::call_to`] and [`ReturnConfiguration::then`].
pub struct RuleConfiguration {
    manager: Arc<RuleManager>,
    rule: Weak<BehaviorRule>,
    context: BuildContext,
}

impl RuleConfiguration {
    pub(crate) fn new(
        manager: Arc<RuleManager>,
        rule: &Arc<BehaviorRule>,
        context: BuildContext,
    ) -> Self {
        Self {
            manager,
            rule: Arc::downgrade(rule),
            context,
        }
    }

    pub(crate) fn rule_slot(&self) -> &Weak<BehaviorRule> {
        &self.rule
    }

    /// Returns the id of the configured rule, `None` once the rule was removed.
    #[must_use]
    pub fn rule_id(&self) -> Option<RuleId> {
        self.rule.upgrade().map(|rule| rule.id())
    }

    /// Appends an action that runs whenever the rule serves a call.
    #[must_use]
    pub fn invokes<F>(self, action: F) -> Self
    where
        F: Fn(&Call) + Send + Sync + 'static,
    {
        with_rule(&self.rule, |rule| rule.push_action(Arc::new(action)));
        self
    }

    /// Returns a clone of `value` from every call the rule serves.
    pub fn returns<R>(self, value: R) -> ReturnConfiguration
    where
        R: Clone + Send + Sync + 'static,
    {
        with_rule(&self.rule, |rule| {
            rule.set_returns(Arc::new(move |_call: &Call| {
                Some(Box::new(value.clone()) as ArgValue)
            }));
        });
        self.into_returns()
    }

    /// Computes the return value from the call.
    pub fn returns_lazily<R, F>(self, value: F) -> ReturnConfiguration
    where
        R: Send + Sync + 'static,
        F: Fn(&Call) -> R + Send + Sync + 'static,
    {
        with_rule(&self.rule, |rule| {
            rule.set_returns(Arc::new(move |call: &Call| {
                Some(Box::new(value(call)) as ArgValue)
            }));
        });
        self.into_returns()
    }

    /// Returns nothing from the calls the rule serves.
    pub fn does_nothing(self) -> ReturnConfiguration {
        with_rule(&self.rule, |rule| rule.set_returns(Arc::new(|_call: &Call| None)));
        self.into_returns()
    }

    fn into_returns(self) -> ReturnConfiguration {
        ReturnConfiguration {
            manager: self.manager,
            rule: self.rule,
            context: self.context,
        }
    }
}

impl ConfigurationHandle for RuleConfiguration {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn build_context_mut(&mut self) -> &mut BuildContext {
        &mut self.context
    }
}

impl fmt::Debug for RuleConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleConfiguration")
            .field("rule", &self.rule_id())
            .finish()
    }
}

/// Handle for configuring repetition and chaining once a return behavior is set.
pub struct ReturnConfiguration {
    manager: Arc<RuleManager>,
    rule: Weak<BehaviorRule>,
    context: BuildContext,
}

impl ReturnConfiguration {
    pub(crate) fn rule_slot(&self) -> &Weak<BehaviorRule> {
        &self.rule
    }

    /// Returns the id of the configured rule, `None` once the rule was removed.
    #[must_use]
    pub fn rule_id(&self) -> Option<RuleId> {
        self.rule.upgrade().map(|rule| rule.id())
    }

    /// Limits the rule to `times` applications.
    #[must_use]
    pub fn number_of_times(self, times: usize) -> Self {
        with_rule(&self.rule, |rule| rule.set_repeat(times));
        self
    }

    /// Limits the rule to a single application.
    #[must_use]
    pub fn once(self) -> Self {
        self.number_of_times(1)
    }

    /// Starts the next segment for the same call expression.
    ///
    /// The new segment shares the expression's matchers, keeps its priority and only
    /// becomes eligible once this segment is exhausted. A segment without a repeat limit is
    /// never exhausted, so a segment chained after it never applies.
    pub fn then(self) -> RuleConfiguration {
        let Some(current) = self.rule.upgrade() else {
            tracing::debug!("chaining after a removed rule");
            return RuleConfiguration {
                manager: self.manager,
                rule: Weak::new(),
                context: self.context,
            };
        };

        let next = Arc::new(BehaviorRule::new(
            self.manager.next_rule_id(),
            current.priority(),
            Arc::clone(current.call_match()),
            Some(Arc::clone(&current)),
        ));
        self.manager.register(Arc::clone(&next));

        tracing::debug!(
            rule = %next.id(),
            predecessor = %current.id(),
            "chained rule segment"
        );

        RuleConfiguration::new(self.manager, &next, self.context)
    }
}

impl ConfigurationHandle for ReturnConfiguration {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn build_context_mut(&mut self) -> &mut BuildContext {
        &mut self.context
    }
}

impl fmt::Debug for ReturnConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReturnConfiguration")
            .field("rule", &self.rule_id())
            .finish()
    }
}

fn with_rule(slot: &Weak<BehaviorRule>, configure: impl FnOnce(&BehaviorRule)) {
    match slot.upgrade() {
        Some(rule) => configure(&rule),
        None => tracing::debug!("configuring a removed rule has no effect"),
    }
}
