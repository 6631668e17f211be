//! Tracing setup for hosts embedding the engine.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the application. The viewer binary calls [`init_default_tracing`].

/// Installs a compact fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` if the host already installed a global subscriber.
#[must_use]
pub fn init_default_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
