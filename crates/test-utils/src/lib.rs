//! Test helpers: an in-memory DID method and tracing setup.

mod docstore;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub use crate::docstore::DocStore;

static INIT: Once = Once::new();

/// Install a `fmt` subscriber for test output, once per process. Honors
/// `RUST_LOG`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}
