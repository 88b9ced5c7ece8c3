//! Console and log-file output built on `tracing`.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::Log;
pub use utils::LOG_DIR_ENV;

/// A [`Logger`] whose events land in `<tmp>/test.log` through a thread-local
/// subscriber.
///
/// Keep the returned guard alive for the whole test; dropping it restores the
/// previous dispatcher.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

    let tmp = tempfile::tempdir().expect("create temp dir");
    let file = subscriber::FileLayer::create(&tmp.path().join("test.log"), "test")
        .expect("create file layer");
    let dispatch = tracing::Dispatch::new(
        tracing_subscriber::registry().with(file.with_filter(LevelFilter::DEBUG)),
    );
    let guard = tracing::dispatcher::set_default(&dispatch);
    (Logger::new("test"), tmp, guard)
}
