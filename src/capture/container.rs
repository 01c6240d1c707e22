//! Capture container for argument values.
//!
//! This module provides [`CaptureContainer`], the object a test author creates to collect the
//! arguments a faked method was called with, and the [`Committable`] trait through which the
//! commit machinery drives containers of any value type.
//!
//! # Recording vs Committing
//!
//! A container receives values from two directions:
//!
//! - **Speculative recording**: the container's matcher runs while the framework is still
//!   searching for the rule that will serve a call. In [`CommitMode::Deferred`] the value is
//!   parked in the call's speculative slot; a later probe within the same call overwrites it.
//! - **Commit**: a commit trigger attached to the selected rule promotes the parked value into
//!   the committed sequence.
//!
//! A container that was never attached to a rule stays in [`CommitMode::Immediate`], in which
//! every probe commits at once.
//!
//! # Thread Safety
//!
//! The committed sequence is guarded by a mutex. Parked values live in the call, so
//! concurrent calls never overwrite each other's pending value and each applied call commits
//! exactly one value. The committed order is the order in which commits acquired the lock.

use std::{
    any::type_name,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use strum::{Display, EnumIter};

use crate::{
    capture::placeholder::{Placeholder, SpeculativeMatcher},
    fake::Call,
    Error, Result,
};

static NEXT_CAPTURE_ID: AtomicU64 = AtomicU64::new(1);

/// How a container treats values recorded by its matcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CommitMode {
    /// Every recorded value is committed at once.
    Immediate,
    /// Recorded values wait in the call until a commit trigger promotes them.
    Deferred,
}

/// Lifecycle of a container.
///
/// The call-scoped `Pending` state of the commit protocol is not stored on the container; it
/// is the presence of a parked value in a call's speculative slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CaptureState {
    /// Created, not yet used in a call expression.
    Declared,
    /// Converted into a placeholder, nothing committed yet.
    Armed,
    /// At least one value has been committed.
    Committed,
}

/// Type-erased view of a container used by the commit machinery.
///
/// Commit triggers and the capture registry hold containers of different value types side by
/// side through this trait.
pub trait Committable: Send + Sync {
    /// Returns the container's unique id.
    fn capture_id(&self) -> u64;

    /// Returns the name of the captured type.
    fn type_name(&self) -> &'static str;

    /// Promotes the value parked in `call`, if any.
    fn promote(&self, call: &Call);

    /// Switches the container to [`CommitMode::Deferred`].
    fn defer(&self);

    /// Returns a shared handle to the container.
    fn shared(&self) -> Arc<dyn Committable>;
}

struct Slots<T> {
    committed: Vec<T>,
    consumed: bool,
    mode: CommitMode,
}

struct ContainerState<T> {
    id: u64,
    slots: Mutex<Slots<T>>,
}

/// A container capturing the values passed for one argument of a faked method.
///
/// The container is a cheap handle: clones share the same state. Create one per argument to
/// capture, turn it into a placeholder for the call expression, then read the committed
/// values after exercising the code under test.
///
/// # Examples
///
/// ```rust
/// use callcapture::{args, CallSpec, CaptureContainer, Fake};
///
/// let clock = Fake::new("clock");
/// let delay = CaptureContainer::<i32>::new();
///
/// clock
///     .call_to(CallSpec::new("delay").arg(delay.to_placeholder()?))
///     .does_nothing();
///
/// clock.invoke("delay", args![250_i32])?;
///
/// assert_eq!(delay.value()?, 250);
/// # Ok::<(), callcapture::Error>(())
/// ```
pub struct CaptureContainer<T> {
    inner: Arc<ContainerState<T>>,
}

impl<T> CaptureContainer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a new, empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContainerState {
                id: NEXT_CAPTURE_ID.fetch_add(1, Ordering::Relaxed),
                slots: Mutex::new(Slots {
                    committed: Vec::new(),
                    consumed: false,
                    mode: CommitMode::Immediate,
                }),
            }),
        }
    }

    /// Returns the container's unique id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Returns the single committed value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCapture`] if nothing was committed and
    /// [`Error::MultipleValuesCaptured`] if more than one value was committed.
    pub fn value(&self) -> Result<T> {
        let slots = lock!(self.inner.slots);
        match slots.committed.as_slice() {
            [] => Err(Error::EmptyCapture {
                type_name: type_name::<T>(),
            }),
            [value] => Ok(value.clone()),
            values => Err(Error::MultipleValuesCaptured {
                count: values.len(),
            }),
        }
    }

    /// Returns the committed values in commit order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        lock!(self.inner.slots).committed.clone()
    }

    /// Returns `true` if at least one value was committed.
    #[must_use]
    pub fn has_values(&self) -> bool {
        !lock!(self.inner.slots).committed.is_empty()
    }

    /// Returns the number of committed values.
    #[must_use]
    pub fn len(&self) -> usize {
        lock!(self.inner.slots).committed.len()
    }

    /// Returns `true` if nothing was committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_values()
    }

    /// Returns the container's commit mode.
    #[must_use]
    pub fn mode(&self) -> CommitMode {
        lock!(self.inner.slots).mode
    }

    /// Returns the container's lifecycle state.
    #[must_use]
    pub fn state(&self) -> CaptureState {
        let slots = lock!(self.inner.slots);
        if !slots.committed.is_empty() {
            CaptureState::Committed
        } else if slots.consumed {
            CaptureState::Armed
        } else {
            CaptureState::Declared
        }
    }

    /// Converts the container into a placeholder for one call expression.
    ///
    /// The placeholder carries the container's speculative matcher, described as
    /// `captured parameter <type>`. Passing it to [`crate::CallSpec::arg`] installs the
    /// matcher and marks the container open for attachment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyConsumed`] if the container already backs a call expression.
    pub fn to_placeholder(&self) -> Result<Placeholder<T>> {
        {
            let mut slots = lock!(self.inner.slots);
            if slots.consumed {
                return Err(Error::AlreadyConsumed {
                    type_name: type_name::<T>(),
                });
            }
            slots.consumed = true;
        }

        tracing::trace!(capture = self.id(), ty = type_name::<T>(), "capture armed");
        Ok(Placeholder::new(SpeculativeMatcher::new(self.clone())))
    }

    /// Records a value seen by the container's matcher.
    ///
    /// In immediate mode the value is committed at once. In deferred mode it replaces the
    /// value parked in `call`. Always returns `true`: recording never changes which rule is
    /// selected.
    pub fn record_speculative(&self, call: &Call, value: T) -> bool {
        let mut slots = lock!(self.inner.slots);
        match slots.mode {
            CommitMode::Immediate => {
                slots.committed.push(value);
                tracing::trace!(capture = self.id(), call = call.id(), "captured immediately");
            }
            CommitMode::Deferred => {
                drop(slots);
                call.stash(self.id(), Box::new(value));
                tracing::trace!(capture = self.id(), call = call.id(), "captured speculatively");
            }
        }
        true
    }

    /// Promotes the value parked in `call` into the committed sequence.
    ///
    /// Does nothing if the call holds no value for this container.
    pub fn promote(&self, call: &Call) {
        let Some(parked) = call.take_stash(self.id()) else {
            return;
        };

        match parked.downcast::<T>() {
            Ok(value) => {
                let mut slots = lock!(self.inner.slots);
                slots.committed.push(*value);
                tracing::debug!(
                    capture = self.id(),
                    call = call.id(),
                    count = slots.committed.len(),
                    "capture committed"
                );
            }
            Err(_) => {
                tracing::warn!(
                    capture = self.id(),
                    call = call.id(),
                    expected = type_name::<T>(),
                    "parked value has an unexpected type"
                );
            }
        }
    }

    /// Commits a value directly, bypassing the speculative slot.
    pub(crate) fn append(&self, value: T) {
        lock!(self.inner.slots).committed.push(value);
    }

    pub(crate) fn set_mode(&self, mode: CommitMode) {
        lock!(self.inner.slots).mode = mode;
    }
}

impl<T> Committable for CaptureContainer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn capture_id(&self) -> u64 {
        self.id()
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn promote(&self, call: &Call) {
        CaptureContainer::promote(self, call);
    }

    fn defer(&self) {
        self.set_mode(CommitMode::Deferred);
    }

    fn shared(&self) -> Arc<dyn Committable> {
        Arc::new(self.clone())
    }
}

impl<T> Clone for CaptureContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for CaptureContainer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Display for CaptureContainer<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = lock!(self.inner.slots);
        match slots.committed.as_slice() {
            [] => write!(f, "No captured values"),
            [value] => write!(f, "{value}"),
            values => write!(f, "{} captured values", values.len()),
        }
    }
}

impl<T> fmt::Debug for CaptureContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = lock!(self.inner.slots);
        f.debug_struct("CaptureContainer")
            .field("id", &self.inner.id)
            .field("type", &type_name::<T>())
            .field("committed", &slots.committed.len())
            .field("consumed", &slots.consumed)
            .field("mode", &slots.mode)
            .finish()
    }
}
