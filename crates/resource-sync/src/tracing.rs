//! # Tracing Setup

/// Initializes structured logging for the process.
///
/// Filtering is controlled by `RUST_LOG`:
/// - `RUST_LOG=info` - lifecycle, additions, removals, poll counters
/// - `RUST_LOG=debug` - every fetch, listing and transaction boundary
/// - `RUST_LOG=resource_sync=debug,info` - engine detail only
///
/// # Example
///
/// ```ignore
/// setup_tracing();
/// tracing::info!("Mirror started");
/// ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
