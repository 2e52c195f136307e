//! Mode gate: decides whether outgoing requests are answered by fixtures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Environment variable that forces requests through the real transport.
pub const FORCE_REAL_ENV: &str = "PETCARE_USE_REAL_API";

/// Interception ships enabled in debug and release builds alike.
const ACTIVE_BY_DEFAULT: bool = true;

/// Process-wide interception flag.
///
/// Clones share the same flag, so every transport and client built from one
/// gate observes [`ModeGate::set_active`] on its next request.
#[derive(Debug, Clone)]
pub struct ModeGate {
    active: Arc<AtomicBool>,
}

impl ModeGate {
    pub fn new(active: bool) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(active)),
        }
    }

    pub fn active() -> Self {
        Self::new(true)
    }

    pub fn inactive() -> Self {
        Self::new(false)
    }

    /// Build the gate from `PETCARE_USE_REAL_API` and build defaults.
    pub fn from_env() -> Self {
        Self::from_override(false)
    }

    /// Build the gate from an explicit force-real flag (usually the config file)
    /// combined with the environment override.
    pub fn from_override(force_real: bool) -> Self {
        let env_value = std::env::var(FORCE_REAL_ENV).ok();
        let active = resolve_active(force_real, env_value.as_deref());
        info!(
            "Mock interception {}",
            if active { "enabled" } else { "disabled (real API)" }
        );
        Self::new(active)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }
}

impl Default for ModeGate {
    fn default() -> Self {
        Self::new(ACTIVE_BY_DEFAULT)
    }
}

/// The explicit override is read first; without one the build default applies.
fn resolve_active(force_real: bool, env_value: Option<&str>) -> bool {
    if force_real {
        return false;
    }
    match env_value.map(parse_flag) {
        Some(Some(true)) => false,
        Some(Some(false)) => true,
        _ => ACTIVE_BY_DEFAULT,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
