//! Behavior rule definition.
//!
//! This module provides [`BehaviorRule`], the unit the framework commits to when it serves a
//! call, and [`CallMatch`], the call expression a rule (and every segment chained after it)
//! matches against.

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, RwLock,
    },
};

use crate::fake::{
    matcher::ArgMatcher,
    types::{ActionFn, ArgValue, Call, CallPredicate, ReturnFn, RuleId, RulePriority},
};

const UNLIMITED: usize = usize::MAX;

/// The call expression of a rule: method name, positional matchers and an optional
/// predicate over the whole call.
///
/// All segments of one `then()` chain share the same `CallMatch`, so a matcher installed by
/// the expression backs every segment.
pub struct CallMatch {
    method: String,
    matchers: Vec<Box<dyn ArgMatcher>>,
    predicate: Option<(String, Arc<CallPredicate>)>,
}

impl CallMatch {
    pub(crate) fn new(
        method: String,
        matchers: Vec<Box<dyn ArgMatcher>>,
        predicate: Option<(String, Arc<CallPredicate>)>,
    ) -> Self {
        Self {
            method,
            matchers,
            predicate,
        }
    }

    /// Returns the matched method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Checks the call against the expression.
    ///
    /// Matchers run in argument order and evaluation stops at the first rejection. The
    /// whole-call predicate runs last.
    pub fn matches(&self, call: &Call) -> bool {
        if call.method() != self.method || call.arg_count() != self.matchers.len() {
            return false;
        }

        let args_match = self
            .matchers
            .iter()
            .zip(call.args())
            .all(|(matcher, arg)| matcher.matches(&**arg, call));

        args_match
            && self
                .predicate
                .as_ref()
                .is_none_or(|(_, predicate)| predicate(call))
    }

    /// Returns a description like `delay(any i32, 3) when <predicate>`.
    #[must_use]
    pub fn description(&self) -> String {
        let args: Vec<String> = self.matchers.iter().map(|m| m.description()).collect();
        match &self.predicate {
            Some((description, _)) => {
                format!("{}({}) when {}", self.method, args.join(", "), description)
            }
            None => format!("{}({})", self.method, args.join(", ")),
        }
    }
}

/// A configured behavior for calls matching a [`CallMatch`].
///
/// A rule bundles the call expression with an ordered list of actions, a return behavior
/// and an optional repeat count. Rules created by `then()` carry a predecessor and only
/// become eligible once the predecessor is exhausted.
///
/// # Application
///
/// When the rule manager selects a rule for a call it first claims one application (which
/// fails once the repeat count is used up), then runs every action in order and finally the
/// return behavior. Actions are appended while the rule is being configured; the capture
/// layer appends its commit triggers here.
pub struct BehaviorRule {
    id: RuleId,
    priority: RulePriority,
    call_match: Arc<CallMatch>,
    actions: RwLock<Vec<ActionFn>>,
    returns: RwLock<Option<ReturnFn>>,
    repeat: AtomicUsize,
    applied: AtomicUsize,
    predecessor: Option<Arc<BehaviorRule>>,
}

impl BehaviorRule {
    pub(crate) fn new(
        id: RuleId,
        priority: RulePriority,
        call_match: Arc<CallMatch>,
        predecessor: Option<Arc<BehaviorRule>>,
    ) -> Self {
        Self {
            id,
            priority,
            call_match,
            actions: RwLock::new(Vec::new()),
            returns: RwLock::new(None),
            repeat: AtomicUsize::new(UNLIMITED),
            applied: AtomicUsize::new(0),
            predecessor,
        }
    }

    /// Returns the rule's id.
    #[must_use]
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// Returns the rule's priority.
    #[must_use]
    pub fn priority(&self) -> RulePriority {
        self.priority
    }

    /// Returns the call expression shared by this rule's chain.
    #[must_use]
    pub fn call_match(&self) -> &Arc<CallMatch> {
        &self.call_match
    }

    /// Returns the segment this rule was chained after, if any.
    #[must_use]
    pub fn predecessor(&self) -> Option<&Arc<BehaviorRule>> {
        self.predecessor.as_ref()
    }

    /// Appends an action to the rule.
    pub fn push_action(&self, action: ActionFn) {
        write_lock!(self.actions).push(action);
    }

    /// Returns the number of actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        read_lock!(self.actions).len()
    }

    /// Replaces the return behavior.
    pub fn set_returns(&self, returns: ReturnFn) {
        *write_lock!(self.returns) = Some(returns);
    }

    /// Limits the rule to `times` applications.
    pub fn set_repeat(&self, times: usize) {
        self.repeat.store(times, Ordering::SeqCst);
    }

    /// Returns the repeat count, `None` for rules without a limit.
    #[must_use]
    pub fn repeat_count(&self) -> Option<usize> {
        match self.repeat.load(Ordering::SeqCst) {
            UNLIMITED => None,
            times => Some(times),
        }
    }

    /// Returns how many times the rule has been applied.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }

    /// Returns `true` once the repeat count is used up.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.repeat_count()
            .is_some_and(|limit| self.applied() >= limit)
    }

    /// Returns `true` if the rule may serve calls right now.
    ///
    /// A chained segment waits for its predecessor to be exhausted.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        !self.is_exhausted()
            && self
                .predecessor
                .as_ref()
                .is_none_or(|predecessor| predecessor.is_exhausted())
    }

    /// Checks the call against the rule's expression.
    pub fn matches(&self, call: &Call) -> bool {
        self.call_match.matches(call)
    }

    /// Claims one application.
    ///
    /// Returns `false` if a concurrent call took the last application first.
    pub fn try_claim(&self) -> bool {
        let limit = self.repeat.load(Ordering::SeqCst);
        if limit == UNLIMITED {
            self.applied.fetch_add(1, Ordering::SeqCst);
            return true;
        }

        self.applied
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |applied| {
                (applied < limit).then_some(applied + 1)
            })
            .is_ok()
    }

    /// Runs the actions and the return behavior for a claimed call.
    ///
    /// No lock is held while actions run, so an action may call back into any fake.
    pub fn apply(&self, call: &Call) -> Option<ArgValue> {
        let actions = read_lock!(self.actions).clone();
        for action in &actions {
            action(call);
        }

        let returns = read_lock!(self.returns).clone();
        returns.and_then(|returns| returns(call))
    }
}

impl fmt::Debug for BehaviorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorRule")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("call", &self.call_match.description())
            .field("action_count", &self.action_count())
            .field("repeat", &self.repeat_count())
            .field("applied", &self.applied())
            .field("predecessor", &self.predecessor.as_ref().map(|p| p.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::fake::matcher::{AnyMatcher, EqMatcher};

    fn delay_match() -> Arc<CallMatch> {
        Arc::new(CallMatch::new(
            "delay".to_string(),
            vec![Box::new(AnyMatcher::<i32>::new())],
            None,
        ))
    }

    #[test]
    fn test_call_match_method_and_arity() {
        let call_match = delay_match();

        assert!(call_match.matches(&Call::new(1, "clock", "delay", args![1_i32])));
        assert!(!call_match.matches(&Call::new(1, "clock", "sleep", args![1_i32])));
        assert!(!call_match.matches(&Call::new(1, "clock", "delay", args![1_i32, 2_i32])));
        assert!(!call_match.matches(&Call::new(1, "clock", "delay", args!["1"])));
    }

    #[test]
    fn test_call_match_predicate() {
        let predicate: Arc<CallPredicate> =
            Arc::new(|call: &Call| call.arg::<i32>(0).is_some_and(|v| *v > 10));
        let call_match = CallMatch::new(
            "delay".to_string(),
            vec![Box::new(AnyMatcher::<i32>::new())],
            Some(("long delays".to_string(), predicate)),
        );

        assert!(call_match.matches(&Call::new(1, "clock", "delay", args![11_i32])));
        assert!(!call_match.matches(&Call::new(1, "clock", "delay", args![10_i32])));
        assert_eq!(call_match.description(), "delay(any i32) when long delays");
    }

    #[test]
    fn test_call_match_description() {
        let call_match = CallMatch::new(
            "send".to_string(),
            vec![
                Box::new(EqMatcher::new(3_i32)),
                Box::new(AnyMatcher::<u8>::new()),
            ],
            None,
        );
        assert_eq!(call_match.description(), "send(3, any u8)");
    }

    #[test]
    fn test_repeat_claims() {
        let rule = BehaviorRule::new(RuleId(1), RulePriority::NORMAL, delay_match(), None);
        assert_eq!(rule.repeat_count(), None);

        rule.set_repeat(2);
        assert_eq!(rule.repeat_count(), Some(2));
        assert!(rule.try_claim());
        assert!(!rule.is_exhausted());
        assert!(rule.try_claim());
        assert!(rule.is_exhausted());
        assert!(!rule.try_claim());
        assert_eq!(rule.applied(), 2);
    }

    #[test]
    fn test_chained_segment_waits_for_predecessor() {
        let first = Arc::new(BehaviorRule::new(
            RuleId(1),
            RulePriority::NORMAL,
            delay_match(),
            None,
        ));
        first.set_repeat(1);
        let second = BehaviorRule::new(
            RuleId(2),
            RulePriority::NORMAL,
            first.call_match().clone(),
            Some(first.clone()),
        );

        assert!(first.is_eligible());
        assert!(!second.is_eligible());

        assert!(first.try_claim());
        assert!(!first.is_eligible());
        assert!(second.is_eligible());
    }

    #[test]
    fn test_apply_runs_actions_in_order_then_returns() {
        let rule = BehaviorRule::new(RuleId(1), RulePriority::NORMAL, delay_match(), None);
        let order = Arc::new(RwLock::new(Vec::new()));

        let first = order.clone();
        rule.push_action(Arc::new(move |_call: &Call| first.write().unwrap().push(1)));
        let second = order.clone();
        rule.push_action(Arc::new(move |_call: &Call| second.write().unwrap().push(2)));

        let returned = Arc::new(AtomicBool::new(false));
        let flag = returned.clone();
        rule.set_returns(Arc::new(move |call: &Call| {
            flag.store(true, Ordering::SeqCst);
            call.arg::<i32>(0).map(|v| Box::new(v * 2) as ArgValue)
        }));

        let value = rule.apply(&Call::new(1, "clock", "delay", args![21_i32]));

        assert_eq!(*order.read().unwrap(), vec![1, 2]);
        assert!(returned.load(Ordering::SeqCst));
        assert_eq!(value.and_then(|v| v.downcast::<i32>().ok()).map(|v| *v), Some(42));
        assert_eq!(rule.action_count(), 2);
    }
}
