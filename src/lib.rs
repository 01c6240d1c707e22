// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # callcapture
//!
//! Argument capture for call-intercepting test doubles.
//!
//! A test double built on `callcapture` evaluates the argument matchers of several rules
//! while it searches for the rule that serves a call. `callcapture` lets a test use a
//! capture container as one of those matchers, and still end up with exactly the values of
//! the calls served by the rule the container was attached to.
//!
//! ## Features
//!
//! - **Speculative recording** - Matchers park the value they see in the call itself
//! - **Commit on apply** - Only the rule that serves the call commits its parked values
//! - **Chained segments** - `number_of_times(n).then()` chains capture once per call
//! - **Thread safe** - Concurrent calls each commit their own value
//! - **Minimal fake framework** - Rules, matchers, priorities, strict mode and call history
//!
//! ## Quick Start
//!
//! ```rust
//! use callcapture::prelude::*;
//!
//! let clock = Fake::new("clock");
//! let delay = CaptureContainer::<i32>::new();
//!
//! clock
//!     .call_to(CallSpec::new("delay").arg(delay.to_placeholder()?))
//!     .returns(true)
//!     .with_capture()?;
//!
//! clock.invoke("delay", args![3_i32])?;
//! clock.invoke("delay", args![4_i32])?;
//!
//! assert_eq!(delay.values(), vec![3, 4]);
//! assert!(matches!(delay.value(), Err(Error::MultipleValuesCaptured { count: 2 })));
//! # Ok::<(), callcapture::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`fake`] - The interception framework: calls, matchers, rules and the [`Fake`] itself
//! - [`capture`] - Capture containers, placeholders, commit triggers and the rule bridge
//! - [`prelude`] - Commonly used types and traits
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], see [`Error`] for the variants.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `debug` for configuration, applied rules and commits,
//! `trace` for speculative recording and (with [`FakeConfig::trace_dispatch`]) every rule
//! candidate, `warn` for type mismatches and failed rule lookups. Install any subscriber to
//! see them.

#[macro_use]
pub(crate) mod macros;

pub(crate) mod error;

#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// ```rust
/// use callcapture::prelude::*;
///
/// let capture = CaptureContainer::<String>::new();
/// assert!(!capture.has_values());
/// ```
pub mod prelude;

/// Call interception framework.
///
/// See [`Fake`] for the entry point and [`fake::CallSpec`] for call expressions.
pub mod fake;

/// Speculative argument capture.
///
/// See [`CaptureContainer`] and [`WithCapture`].
pub mod capture;

/// `callcapture` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `callcapture` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;

/// The faked object and its call expression builder.
pub use fake::{CallSpec, Fake, FakeConfig};

/// Capture containers and the extensions that attach them.
pub use capture::{CaptureContainer, CapturesInto, Placeholder, WithCapture};
