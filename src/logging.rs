//! Log output
//!
//! The crate emits `tracing` events. Applications that do not install their
//! own subscriber can call [`init`].

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`)
///
/// Calling it again, or after another subscriber was installed, does nothing.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice() {
        init();
        init();
        tracing::debug!("logging initialized");
    }
}
