//! Rule manager for registering rules and dispatching calls.
//!
//! This module provides [`RuleManager`], which maintains the rules of one faked object in
//! evaluation order and selects the rule that serves each call.

use std::{
    cmp::Reverse,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use crate::fake::{
    rule::BehaviorRule,
    types::{Call, CallOutcome, RuleId},
};

/// Manager for registering rules and dispatching calls.
///
/// The `RuleManager` keeps rules sorted by priority (highest first). Within one priority,
/// the most recently registered rule comes first.
///
/// # Rule Resolution
///
/// When a call is dispatched:
///
/// 1. Rules are visited in evaluation order
/// 2. Rules that are not eligible (exhausted, or waiting for their predecessor) are skipped
///    without running their matchers
/// 3. The matchers of the remaining rules run, speculatively, until one rule matches
/// 4. The matching rule claims one application; if a concurrent call took its last
///    application, the search restarts from the top with the updated eligibility
/// 5. The claimed rule is applied: actions in order, then the return behavior
///
/// Only one rule is applied per call. Because the search stops at the selected rule, the
/// selected rule is always the last candidate whose matchers ran. A restart runs the
/// matchers again, so a value parked by an earlier pass is overwritten by the final one.
#[derive(Default)]
pub struct RuleManager {
    rules: RwLock<Vec<Arc<BehaviorRule>>>,
    next_rule: AtomicU64,
}

impl RuleManager {
    /// Creates a new, empty rule manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the id for a new rule.
    pub fn next_rule_id(&self) -> RuleId {
        RuleId(self.next_rule.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Registers a rule.
    ///
    /// The rule is placed in front of every existing rule of the same priority.
    pub fn register(&self, rule: Arc<BehaviorRule>) {
        let mut rules = write_lock!(self.rules);
        rules.insert(0, rule);
        rules.sort_by_key(|r| Reverse(r.priority()));
    }

    /// Finds the rule that serves `call` and claims one application of it.
    ///
    /// A lost claim exhausts the rule, which can make a chained successor eligible that the
    /// pass already skipped. The search therefore starts over from a fresh snapshot. Claims
    /// only fail on rules with a finite repeat count, so the number of restarts is bounded.
    ///
    /// # Arguments
    ///
    /// * `call` - The call being dispatched
    /// * `trace` - Emit a trace event for every candidate looked at
    ///
    /// # Returns
    ///
    /// The claimed rule, or `None` if no rule applies.
    pub fn find_and_claim(&self, call: &Call, trace: bool) -> Option<Arc<BehaviorRule>> {
        'search: loop {
            for rule in self.snapshot() {
                if !rule.is_eligible() {
                    if trace {
                        tracing::trace!(call = call.id(), rule = %rule.id(), "skipping ineligible rule");
                    }
                    continue;
                }

                if !rule.matches(call) {
                    if trace {
                        tracing::trace!(
                            call = call.id(),
                            rule = %rule.id(),
                            expression = %rule.call_match().description(),
                            "candidate rejected"
                        );
                    }
                    continue;
                }

                if rule.try_claim() {
                    return Some(rule);
                }

                tracing::debug!(call = call.id(), rule = %rule.id(), "lost repeat claim, restarting search");
                continue 'search;
            }

            return None;
        }
    }

    /// Dispatches a call through the rules.
    ///
    /// This is the primary entry point for serving a call. The manager's lock is released
    /// before the selected rule is applied.
    ///
    /// # Returns
    ///
    /// * `CallOutcome::NoMatch` - No rule applies; the caller decides what that means
    /// * `CallOutcome::Handled { .. }` - A rule served the call
    pub fn dispatch(&self, call: &Call, trace: bool) -> CallOutcome {
        let Some(rule) = self.find_and_claim(call, trace) else {
            return CallOutcome::NoMatch;
        };

        tracing::debug!(
            call = call.id(),
            method = call.method(),
            rule = %rule.id(),
            applied = rule.applied(),
            "applying rule"
        );

        let value = rule.apply(call);
        CallOutcome::Handled {
            rule: rule.id(),
            value,
        }
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<BehaviorRule>> {
        read_lock!(self.rules).clone()
    }

    /// Removes every rule.
    pub fn clear(&self) {
        write_lock!(self.rules).clear();
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock!(self.rules).len()
    }

    /// Returns `true` if no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock!(self.rules).is_empty()
    }
}

impl std::fmt::Debug for RuleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleManager")
            .field("rule_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize},
        OnceLock,
    };

    use super::*;
    use crate::fake::{
        matcher::{AnyMatcher, ArgMatcher, EqMatcher},
        rule::CallMatch,
        types::{ArgValue, RulePriority},
    };

    fn rule(
        manager: &RuleManager,
        priority: RulePriority,
        matchers: Vec<Box<dyn ArgMatcher>>,
    ) -> Arc<BehaviorRule> {
        let call_match = Arc::new(CallMatch::new("delay".to_string(), matchers, None));
        let rule = Arc::new(BehaviorRule::new(
            manager.next_rule_id(),
            priority,
            call_match,
            None,
        ));
        manager.register(rule.clone());
        rule
    }

    fn delay(value: i32) -> Call {
        Call::new(1, "clock", "delay", args![value])
    }

    #[test]
    fn test_rule_manager_empty() {
        let manager = RuleManager::new();
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
        assert!(matches!(
            manager.dispatch(&delay(1), false),
            CallOutcome::NoMatch
        ));
    }

    #[test]
    fn test_newest_rule_wins_within_priority() {
        let manager = RuleManager::new();
        let older = rule(&manager, RulePriority::NORMAL, vec![Box::new(AnyMatcher::<i32>::new())]);
        let newer = rule(&manager, RulePriority::NORMAL, vec![Box::new(AnyMatcher::<i32>::new())]);

        match manager.dispatch(&delay(1), false) {
            CallOutcome::Handled { rule, .. } => assert_eq!(rule, newer.id()),
            CallOutcome::NoMatch => panic!("expected a rule to apply"),
        }
        assert_eq!(older.applied(), 0);
    }

    #[test]
    fn test_priority_sorting() {
        let manager = RuleManager::new();
        let low = rule(&manager, RulePriority::LOW, vec![Box::new(AnyMatcher::<i32>::new())]);
        let high = rule(&manager, RulePriority::HIGH, vec![Box::new(AnyMatcher::<i32>::new())]);
        let normal = rule(&manager, RulePriority::NORMAL, vec![Box::new(AnyMatcher::<i32>::new())]);

        let ids: Vec<_> = manager.snapshot().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![high.id(), normal.id(), low.id()]);
    }

    #[test]
    fn test_falls_through_rejecting_rules() {
        let manager = RuleManager::new();
        let fallback = rule(&manager, RulePriority::NORMAL, vec![Box::new(AnyMatcher::<i32>::new())]);
        let specific = rule(&manager, RulePriority::NORMAL, vec![Box::new(EqMatcher::new(3_i32))]);

        manager.dispatch(&delay(1), false);
        manager.dispatch(&delay(3), false);

        assert_eq!(fallback.applied(), 1);
        assert_eq!(specific.applied(), 1);
    }

    #[test]
    fn test_exhausted_rule_is_skipped() {
        let manager = RuleManager::new();
        let fallback = rule(&manager, RulePriority::NORMAL, vec![Box::new(AnyMatcher::<i32>::new())]);
        let once = rule(&manager, RulePriority::NORMAL, vec![Box::new(AnyMatcher::<i32>::new())]);
        once.set_repeat(1);

        manager.dispatch(&delay(1), false);
        manager.dispatch(&delay(2), false);
        manager.dispatch(&delay(3), false);

        assert_eq!(once.applied(), 1);
        assert_eq!(fallback.applied(), 2);
    }

    #[test]
    fn test_dispatch_returns_value() {
        let manager = RuleManager::new();
        let doubled = rule(&manager, RulePriority::NORMAL, vec![Box::new(AnyMatcher::<i32>::new())]);
        doubled.set_returns(Arc::new(|call: &Call| {
            call.arg::<i32>(0).map(|v| Box::new(v * 2) as ArgValue)
        }));

        match manager.dispatch(&delay(50), false) {
            CallOutcome::Handled { value, .. } => {
                assert_eq!(value.and_then(|v| v.downcast::<i32>().ok()).map(|v| *v), Some(100));
            }
            CallOutcome::NoMatch => panic!("expected a rule to apply"),
        }
    }

    #[test]
    fn test_ineligible_rules_do_not_run_matchers() {
        struct Counting(Arc<AtomicUsize>);

        impl ArgMatcher for Counting {
            fn matches(&self, _arg: &(dyn std::any::Any + Send + Sync), _call: &Call) -> bool {
                self.0.fetch_add(1, Ordering::SeqCst);
                true
            }

            fn description(&self) -> String {
                "counting".to_string()
            }
        }

        let probes = Arc::new(AtomicUsize::new(0));
        let manager = RuleManager::new();
        let counted = rule(&manager, RulePriority::NORMAL, vec![Box::new(Counting(probes.clone()))]);
        counted.set_repeat(1);

        manager.dispatch(&delay(1), true);
        manager.dispatch(&delay(2), true);

        assert_eq!(probes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lost_claim_reaches_chained_successor() {
        // Takes the first segment's only application while the dispatched call is still
        // matching it, the way a concurrent call would.
        struct TakesLastClaim {
            target: Arc<OnceLock<Arc<BehaviorRule>>>,
            fired: AtomicBool,
        }

        impl ArgMatcher for TakesLastClaim {
            fn matches(&self, _arg: &(dyn std::any::Any + Send + Sync), _call: &Call) -> bool {
                if !self.fired.swap(true, Ordering::SeqCst) {
                    if let Some(rule) = self.target.get() {
                        assert!(rule.try_claim());
                    }
                }
                true
            }

            fn description(&self) -> String {
                "takes last claim".to_string()
            }
        }

        let target = Arc::new(OnceLock::new());
        let manager = RuleManager::new();
        let call_match = Arc::new(CallMatch::new(
            "delay".to_string(),
            vec![Box::new(TakesLastClaim {
                target: target.clone(),
                fired: AtomicBool::new(false),
            })],
            None,
        ));

        let first = Arc::new(BehaviorRule::new(
            manager.next_rule_id(),
            RulePriority::NORMAL,
            call_match.clone(),
            None,
        ));
        first.set_repeat(1);
        manager.register(first.clone());
        let _ = target.set(first.clone());

        let second = Arc::new(BehaviorRule::new(
            manager.next_rule_id(),
            RulePriority::NORMAL,
            call_match,
            Some(first.clone()),
        ));
        manager.register(second.clone());

        match manager.dispatch(&delay(1), true) {
            CallOutcome::Handled { rule, .. } => assert_eq!(rule, second.id()),
            CallOutcome::NoMatch => panic!("the chained successor must serve the call"),
        }
        assert!(first.is_exhausted());
        assert_eq!(second.applied(), 1);
    }

    #[test]
    fn test_clear() {
        let manager = RuleManager::new();
        rule(&manager, RulePriority::NORMAL, vec![Box::new(AnyMatcher::<i32>::new())]);
        manager.clear();
        assert!(manager.is_empty());
    }
}
