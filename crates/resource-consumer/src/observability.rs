//! # Observability & Tracing
//!
//! Consumers log through `tracing`. Each consumer owns a `consumer` span tagged with
//! its resource prefix, and every request made through it is recorded inside that
//! span at `debug` level:
//!
//! ```text
//! DEBUG consumer{prefix=widgets}: Sending request method=GET uri=widgets/42
//! DEBUG consumer{prefix=widgets}: Received response method=GET uri=widgets/42 status=200
//! ```
//!
//! The typed [`Consumer`](crate::Consumer) adds no events of its own.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run            # Application events only
//! RUST_LOG=debug cargo run           # Every request and response status
//! RUST_LOG=resource_consumer=debug cargo run
//! ```

/// Initializes the tracing subscriber for binaries and demos.
///
/// Filtering comes from the `RUST_LOG` environment variable. Output uses the
/// compact format with module targets hidden, so span context (`consumer{prefix=..}`)
/// carries the location instead.
///
/// Calling it more than once is harmless; later calls leave the first subscriber in place.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
