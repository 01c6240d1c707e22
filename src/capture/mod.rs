//! Speculative argument capture.
//!
//! This module lets a test collect the arguments a faked method was called with, while using
//! the capture itself as an argument matcher of the call expression.
//!
//! # The Problem
//!
//! A fake evaluates the matchers of several rules while searching for the one that serves a
//! call. A capture that records every value its matcher sees therefore also records values
//! for calls that end up being served by some other rule. In a chain like
//! `returns(..).number_of_times(1).then()`, every segment shares the same matchers, so a
//! naive capture would record one value per probed segment.
//!
//! # The Protocol
//!
//! Capturing is split in two phases:
//!
//! 1. **Speculative recording**: the container's [`SpeculativeMatcher`] accepts any value of
//!    its type and parks it in the call. Later probes within the same call overwrite it.
//! 2. **Commit**: [`WithCapture::with_capture`] appends a [`CommitTrigger`] to the rule. The
//!    trigger only runs when that rule is applied, and promotes the parked value.
//!
//! Since a fake stops searching at the rule it applies, the parked value is always the one
//! seen by the selected rule.
//!
//! Containers that are never attached with `with_capture` commit every recorded value at
//! once, which is exact as long as the expression is the only one for its method.
//!
//! # Usage
//!
//! ```rust
//! use callcapture::{args, CallSpec, CaptureContainer, Fake, WithCapture};
//!
//! let clock = Fake::new("clock");
//! let delay = CaptureContainer::<i32>::new();
//!
//! clock
//!     .call_to(CallSpec::new("delay").arg(delay.to_placeholder()?))
//!     .returns(true)
//!     .number_of_times(1)
//!     .with_capture()?
//!     .then()
//!     .returns(false)
//!     .with_capture()?;
//!
//! assert_eq!(clock.invoke_as::<bool>("delay", args![10_i32])?, Some(true));
//! assert_eq!(clock.invoke_as::<bool>("delay", args![20_i32])?, Some(false));
//! assert_eq!(delay.values(), vec![10, 20]);
//! # Ok::<(), callcapture::Error>(())
//! ```
//!
//! # Key Components
//!
//! - [`CaptureContainer`] - Holds the committed values of one argument
//! - [`Placeholder`] / [`SpeculativeMatcher`] - The container's view inside a call expression
//! - [`CommitTrigger`] - Rule action promoting parked values
//! - [`RuleLocator`] / [`StructuralLocator`] - Bridge from configuration handles to rules
//! - [`BuildContext`] / [`CaptureRegistry`] - Open containers of one call expression
//! - [`WithCapture`] / [`CapturesInto`] - Fluent extensions

mod commit;
mod container;
mod extensions;
mod locator;
mod placeholder;
mod registry;

pub use commit::CommitTrigger;
pub use container::{CaptureContainer, CaptureState, CommitMode, Committable};
pub use extensions::{CapturesInto, WithCapture};
pub use locator::{RuleHandle, RuleLocator, StructuralLocator};
pub use placeholder::{Placeholder, SpeculativeMatcher};
pub use registry::{BuildContext, CaptureRegistry};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fake::Arg,
        test::{init_tracing, Clock, FakeClock},
        CallSpec,
    };

    #[test]
    fn test_only_selected_rule_commits() {
        init_tracing();
        let clock = FakeClock::new();
        let delay = CaptureContainer::<i32>::new();

        clock
            .fake
            .call_to(CallSpec::new("delay").arg(delay.to_placeholder().unwrap()))
            .returns(true)
            .with_capture()
            .unwrap();
        clock
            .fake
            .call_to(CallSpec::new("delay").arg(Arg::eq(3_i32)))
            .returns(false);

        assert!(clock.delay(1));
        assert!(!clock.delay(3));
        assert!(clock.delay(2));

        assert_eq!(delay.values(), vec![1, 2]);
        assert_eq!(delay.state(), CaptureState::Committed);
    }

    #[test]
    fn test_chained_segments_commit_once_per_call() {
        init_tracing();
        let clock = FakeClock::new();
        let delay = CaptureContainer::<i32>::new();

        clock
            .fake
            .call_to(CallSpec::new("delay").arg(delay.to_placeholder().unwrap()))
            .returns(true)
            .number_of_times(2)
            .with_capture()
            .unwrap()
            .then()
            .returns(false)
            .with_capture()
            .unwrap();

        let results: Vec<bool> = [10, 20, 30, 40].iter().map(|v| clock.delay(*v)).collect();

        assert_eq!(results, vec![true, true, false, false]);
        assert_eq!(delay.values(), vec![10, 20, 30, 40]);
        assert_eq!(clock.now(), 0);
    }
}
