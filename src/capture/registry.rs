//! Open-capture registry and the build context of a call expression.
//!
//! Containers become *open* when their placeholder is installed in a call expression, and
//! stay open until a zero-argument `with_capture()` attaches them to a rule. The registry is
//! owned by the [`BuildContext`] of one expression, which is created with the
//! [`crate::CallSpec`] and handed from one fluent handle to the next. Two expressions built at
//! the same time, on the same thread or on different ones, never see each other's containers.

use std::{fmt, sync::Arc};

use crate::capture::container::Committable;

/// The containers of one call expression that are waiting to be attached.
#[derive(Default)]
pub struct CaptureRegistry {
    open: Vec<Arc<dyn Committable>>,
}

impl CaptureRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a container as open. A container that is already open is ignored.
    pub fn register_open(&mut self, capture: Arc<dyn Committable>) {
        if !self.contains(capture.capture_id()) {
            self.open.push(capture);
        }
    }

    /// Removes and returns every open container, in registration order.
    pub fn drain_open(&mut self) -> Vec<Arc<dyn Committable>> {
        std::mem::take(&mut self.open)
    }

    /// Removes a single container from the open set.
    pub fn remove(&mut self, capture_id: u64) {
        self.open.retain(|c| c.capture_id() != capture_id);
    }

    /// Forgets every open container.
    pub fn reset(&mut self) {
        self.open.clear();
    }

    /// Returns `true` if the container is open.
    #[must_use]
    pub fn contains(&self, capture_id: u64) -> bool {
        self.open.iter().any(|c| c.capture_id() == capture_id)
    }

    /// Returns the number of open containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Returns `true` if no container is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

impl fmt::Debug for CaptureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<u64> = self.open.iter().map(|c| c.capture_id()).collect();
        f.debug_struct("CaptureRegistry").field("open", &ids).finish()
    }
}

/// State threaded through the fluent configuration of one call expression.
///
/// Besides the open set, the context remembers every container it has attached so far. A
/// zero-argument `with_capture()` on a chained segment finds the open set already drained by
/// the first segment; it attaches the remembered containers instead, so that each segment of
/// the chain commits the expression's containers.
#[derive(Default)]
pub struct BuildContext {
    registry: CaptureRegistry,
    attached: Vec<Arc<dyn Committable>>,
}

impl BuildContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the open-capture registry.
    #[must_use]
    pub fn registry(&self) -> &CaptureRegistry {
        &self.registry
    }

    /// Returns the open-capture registry for modification.
    pub fn registry_mut(&mut self) -> &mut CaptureRegistry {
        &mut self.registry
    }

    /// Records a container as open.
    pub fn register_open(&mut self, capture: Arc<dyn Committable>) {
        self.registry.register_open(capture);
    }

    /// Returns the containers attached so far.
    #[must_use]
    pub fn attached(&self) -> &[Arc<dyn Committable>] {
        &self.attached
    }

    /// Drains the open set and returns every container of the expression to attach.
    ///
    /// The result holds the containers attached by earlier segments followed by the ones
    /// that were open.
    pub fn attach_open(&mut self) -> Vec<Arc<dyn Committable>> {
        for capture in self.registry.drain_open() {
            self.remember(capture);
        }
        self.attached.clone()
    }

    /// Marks an explicit list of containers as attached.
    ///
    /// Listed containers leave the open set. Open containers that are not listed stay open.
    pub fn attach_listed(&mut self, captures: &[Arc<dyn Committable>]) {
        for capture in captures {
            self.registry.remove(capture.capture_id());
            self.remember(Arc::clone(capture));
        }
    }

    fn remember(&mut self, capture: Arc<dyn Committable>) {
        let id = capture.capture_id();
        if !self.attached.iter().any(|c| c.capture_id() == id) {
            self.attached.push(capture);
        }
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attached: Vec<u64> = self.attached.iter().map(|c| c.capture_id()).collect();
        f.debug_struct("BuildContext")
            .field("registry", &self.registry)
            .field("attached", &attached)
            .finish()
    }
}
