//! Commit trigger for deferred captures.

use std::{fmt, sync::Arc};

use crate::{
    capture::{container::Committable, locator::RuleHandle},
    fake::{ActionFn, Call},
};

/// Rule action that promotes the parked values of a set of containers.
///
/// The trigger runs only when the rule it is attached to is applied, which makes the value
/// seen by the *selected* rule's matchers the one that gets committed. A container without a
/// parked value for the call is skipped.
pub struct CommitTrigger {
    captures: Vec<Arc<dyn Committable>>,
}

impl CommitTrigger {
    /// Creates a trigger for the given containers.
    #[must_use]
    pub fn new(captures: Vec<Arc<dyn Committable>>) -> Self {
        Self { captures }
    }

    /// Promotes the parked value of every container, in order.
    pub fn fire(&self, call: &Call) {
        for capture in &self.captures {
            capture.promote(call);
        }
    }

    /// Returns the ids of the containers this trigger commits.
    #[must_use]
    pub fn capture_ids(&self) -> Vec<u64> {
        self.captures.iter().map(|c| c.capture_id()).collect()
    }

    /// Returns the number of containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Returns `true` if the trigger commits nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Appends the trigger to the actions of a rule.
    pub fn attach_to(self, rule: &RuleHandle) {
        tracing::debug!(
            rule = %rule.id(),
            captures = ?self.capture_ids(),
            "attaching commit trigger"
        );
        rule.push_action(self.into_action());
    }

    /// Converts the trigger into a rule action.
    #[must_use]
    pub fn into_action(self) -> ActionFn {
        Arc::new(move |call: &Call| self.fire(call))
    }
}

impl fmt::Debug for CommitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitTrigger")
            .field("captures", &self.capture_ids())
            .finish()
    }
}
