//! Shared fixtures for unit tests.

use tracing_subscriber::EnvFilter;

use crate::{args, Fake};

/// Installs a test subscriber once. Set `RUST_LOG` to see the crate's events.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("callcapture=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// The collaborator faked throughout the unit tests.
pub trait Clock {
    fn delay(&self, millis: i32) -> bool;
    fn now(&self) -> u64;
}

/// Adapter forwarding [`Clock`] calls to a [`Fake`].
pub struct FakeClock {
    pub fake: Fake,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            fake: Fake::new("clock"),
        }
    }
}

impl Clock for FakeClock {
    fn delay(&self, millis: i32) -> bool {
        self.fake
            .invoke_as::<bool>("delay", args![millis])
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    fn now(&self) -> u64 {
        self.fake
            .invoke_as::<u64>("now", args![])
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}
