// src/logging.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init(default_filter: &str) {
    let env =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .try_init();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));
}

/// Test-only subscriber writing through the libtest capture.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,euroscraper=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
