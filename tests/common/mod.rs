use std::sync::Once;

use hivewatch::Hive;
use tempfile::TempDir;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// A hive rooted in a fresh temp directory.
///
/// Keep the `TempDir` alive for the duration of the test.
pub fn test_hive() -> (TempDir, Hive) {
    let dir = tempfile::tempdir().expect("create temp hive dir");
    let hive = Hive::new(dir.path());
    (dir, hive)
}
