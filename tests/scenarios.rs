//! End-to-end lifecycle scenarios, exercised against the process-wide
//! singleton via the public free-function surface. Each `tests/*.rs` file
//! is its own test binary, so this doesn't race other suites that use
//! `Pool::new_for_test`/`new_for_test_leaked` standalone instances.

use rng_core::{rng_did_slow_poll, rng_did_start, rng_fetch, rng_start, rng_stop};

// Both scenarios below exercise the process-wide singleton through
// `Pool::global()`, so they run as one test rather than two: `cargo test`
// runs tests within a binary concurrently by default, and two tests
// independently starting/stopping the same singleton would race.
#[test]
fn start_fetch_stop_lifecycle() {
    // Consumers wire up their own logger; this just demonstrates that the
    // crate's `log` calls are harmless when nothing is installed, and
    // visible when something is.
    let _ = env_logger::try_init();

    assert!(rng_start());
    assert!(rng_did_start());
    assert!(!rng_did_slow_poll(), "a fresh process must not report a slow poll before the first fetch");

    let mut buf = [0u8; 64];
    assert!(rng_fetch(&mut buf));
    assert!(rng_did_slow_poll());

    rng_stop();
    assert!(!rng_did_start());

    // restart after stop is idempotent and works
    assert!(rng_start());
    assert!(rng_start(), "init must be idempotent");
    let mut buf2 = [0u8; 32];
    assert!(rng_fetch(&mut buf2));
    rng_stop();
    rng_stop();
    assert!(!rng_did_start());
}
