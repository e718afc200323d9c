//! Environment variable helpers for tests.

use env_lock::{EnvGuard as LockedEnvGuard, lock_env};
use tracing::{instrument, trace};

/// RAII guard to restore environment variables on drop.
pub struct EnvGuard<'a> {
    _guard: LockedEnvGuard<'a>,
}

impl<'a> EnvGuard<'a> {
    #[must_use]
    #[instrument]
    pub fn set(key: &'a str, value: &str) -> Self {
        trace!(key, value, "Setting env var");
        let guard = lock_env([(key, Some(value))]);
        Self { _guard: guard }
    }

    #[must_use]
    #[instrument]
    pub fn remove(key: &'a str) -> Self {
        trace!(key, "Removing env var");
        let guard = lock_env([(key, None::<&str>)]);
        Self { _guard: guard }
    }
}

/// Point `RIPPER_SETTINGS` at `path` for the guard's lifetime.
#[must_use]
pub fn with_settings(path: &str) -> EnvGuard<'static> {
    EnvGuard::set("RIPPER_SETTINGS", path)
}

#[must_use]
pub fn without_settings() -> EnvGuard<'static> {
    EnvGuard::remove("RIPPER_SETTINGS")
}
