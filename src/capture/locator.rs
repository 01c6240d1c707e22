//! Bridge from fluent configuration handles to the rules behind them.
//!
//! The framework's fluent surface hands out configuration handles that say nothing about the
//! rule they configure. Attaching a commit trigger needs that rule, so the capture layer goes
//! through a [`RuleLocator`]. The default [`StructuralLocator`] knows the layout of the
//! built-in handles; a custom locator can be passed to the `*_using` variants of
//! [`crate::WithCapture`] for other handle types.
//!
//! Every failure of the bridge surfaces as [`Error::RuleNotLocatable`] at configuration time.

use std::{fmt, sync::Arc};

use crate::{
    fake::{
        ActionFn, BehaviorRule, ConfigurationHandle, ReturnConfiguration, RuleConfiguration,
        RuleId,
    },
    Error, Result,
};

/// Mutable access to the rule behind a configuration handle.
///
/// The handle exposes the two things the capture layer needs: appending an action and
/// reading the repeat count.
#[derive(Clone)]
pub struct RuleHandle {
    rule: Arc<BehaviorRule>,
}

impl RuleHandle {
    /// Wraps a rule.
    #[must_use]
    pub fn new(rule: Arc<BehaviorRule>) -> Self {
        Self { rule }
    }

    /// Returns the rule's id.
    #[must_use]
    pub fn id(&self) -> RuleId {
        self.rule.id()
    }

    /// Appends an action to the rule's ordered action collection.
    pub fn push_action(&self, action: ActionFn) {
        self.rule.push_action(action);
    }

    /// Returns the number of actions attached to the rule.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.rule.action_count()
    }

    /// Returns the rule's repeat count, `None` for rules without a limit.
    #[must_use]
    pub fn repeat_count(&self) -> Option<usize> {
        self.rule.repeat_count()
    }
}

impl fmt::Debug for RuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleHandle")
            .field("rule", &self.rule.id())
            .finish()
    }
}

/// Trait for resolving a configuration handle to its rule.
pub trait RuleLocator {
    /// Returns the rule configured through `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuleNotLocatable`] if the handle is not understood or its rule is
    /// gone.
    fn locate(&self, handle: &dyn ConfigurationHandle) -> Result<RuleHandle>;
}

/// Locator for the framework's own configuration handles.
///
/// Recognises [`RuleConfiguration`] and [`ReturnConfiguration`] and follows their weak
/// reference to the rule. A rule removed by [`crate::Fake::clear_configuration`] can no
/// longer be located.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralLocator;

impl RuleLocator for StructuralLocator {
    fn locate(&self, handle: &dyn ConfigurationHandle) -> Result<RuleHandle> {
        let any = handle.as_any();
        let slot = if let Some(config) = any.downcast_ref::<RuleConfiguration>() {
            config.rule_slot()
        } else if let Some(config) = any.downcast_ref::<ReturnConfiguration>() {
            config.rule_slot()
        } else {
            return Err(not_locatable(handle, "handle does not expose a rule"));
        };

        slot.upgrade()
            .map(RuleHandle::new)
            .ok_or_else(|| not_locatable(handle, "rule is no longer registered with its fake"))
    }
}

fn not_locatable(handle: &dyn ConfigurationHandle, reason: &str) -> Error {
    tracing::warn!(handle = handle.handle_type(), reason, "rule lookup failed");
    Error::RuleNotLocatable {
        handle: handle.handle_type(),
        reason: reason.to_string(),
    }
}
