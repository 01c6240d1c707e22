//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use callcapture::{args, Fake};
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once. Set `RUST_LOG=callcapture=trace` to follow dispatch.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("callcapture=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub trait Clock {
    fn delay(&self, millis: i32);
    fn delay_even_more(&self, label: &str);
}

pub trait SecondClock {
    fn invoke(&self, label: &str);
}

/// Forwards [`Clock`] calls to a fake.
#[derive(Clone)]
pub struct FakeClock(pub Fake);

impl FakeClock {
    pub fn new() -> Self {
        init_tracing();
        Self(Fake::new("clock"))
    }
}

impl Clock for FakeClock {
    fn delay(&self, millis: i32) {
        self.0
            .invoke("delay", args![millis])
            .expect("loose fakes accept every call");
    }

    fn delay_even_more(&self, label: &str) {
        self.0
            .invoke("delay_even_more", args![label.to_string()])
            .expect("loose fakes accept every call");
    }
}

/// Forwards [`SecondClock`] calls to a fake.
#[derive(Clone)]
pub struct FakeSecondClock(pub Fake);

impl FakeSecondClock {
    pub fn new() -> Self {
        init_tracing();
        Self(Fake::new("second_clock"))
    }
}

impl SecondClock for FakeSecondClock {
    fn invoke(&self, label: &str) {
        self.0
            .invoke("invoke", args![label.to_string()])
            .expect("loose fakes accept every call");
    }
}
