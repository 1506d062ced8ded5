//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is not set, per profile level
const CRATES: &[&str] = &[
    "slotguard_core",
    "slotguard_snapshot",
    "slotguard_engine",
    "slotguard_cli",
];

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for CI log collectors
    Production,
}

static INIT_ONCE: Once = Once::new();

fn default_filter(level: &str) -> EnvFilter {
    let directives: Vec<String> = CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect();
    EnvFilter::new(directives.join(","))
}

/// Initialize the logging facility
///
/// This function should be called once at application startup. Later calls
/// are ignored. `RUST_LOG` overrides the profile's default level.
///
/// # Profiles
///
/// - **Development**: Human-readable logs on stderr with debug level
/// - **Production**: JSON structured logs on stderr with info level
///
/// # Example
///
/// ```
/// use slotguard_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter("debug")),
                )
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter("info")),
                )
                .init();
        }
    });
}
