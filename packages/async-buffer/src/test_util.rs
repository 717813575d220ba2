// helpers shared by the unit tests.

use std::sync::Once;
use tokio::runtime::Runtime;

// install a tracing subscriber filtered by RUST_LOG, once per test binary.
pub(crate) fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// multi-threaded runtime for tests which drive the buffer from plain threads.
pub(crate) fn runtime() -> Runtime {
    init_tracing();
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("buffer-test-worker")
        .build()
        .unwrap()
}
