//! Test doubles shared by unit tests (in `src/`) and integration tests
//! (in `tests/`).
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature so the
//! integration suites can wire the real services against in-memory ports.

mod auth;
mod clock;
mod harness;
mod memory;
mod push;

pub use auth::StaticTokenVerifier;
pub use clock::FixedClock;
pub use harness::{DEFAULT_RADIUS_M, FALLBACK_IMAGE_URL, TEST_TOPIC_ARN, TestHarness};
pub use memory::InMemoryStore;
pub use push::RecordingPushGateway;
