//! Provider logging setup
//!
//! Terraform reads plugin logs from stderr and honours `TF_LOG_PROVIDER`
//! (falling back to `TF_LOG`) for the level. Stdout is reserved for the
//! plugin handshake, so nothing here ever writes to it.

use std::env;
use std::str::FromStr;
use tracing::Level;

/// Log level for the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level from `TF_LOG_PROVIDER`, then `TF_LOG`, else `Warn`
    pub fn from_env() -> Self {
        ["TF_LOG_PROVIDER", "TF_LOG"]
            .iter()
            .find_map(|var| env::var(var).ok().and_then(|v| v.parse().ok()))
            .unwrap_or(LogLevel::Warn)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            // Terraform's JSON mode logs everything
            "TRACE" | "JSON" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Install a stderr fmt subscriber at `level`. Returns false when a global
/// subscriber was already set, which is fine on reconfigure.
pub fn init_logging(level: LogLevel) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(Level::from(level))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// `init_logging` with the level taken from the environment
pub fn init_from_env() -> bool {
    init_logging(LogLevel::from_env())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parses_terraform_levels() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("JSON".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!(" Error ".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    #[serial]
    fn provider_variable_takes_precedence() {
        env::set_var("TF_LOG", "ERROR");
        env::set_var("TF_LOG_PROVIDER", "DEBUG");
        assert_eq!(LogLevel::from_env(), LogLevel::Debug);

        env::remove_var("TF_LOG_PROVIDER");
        assert_eq!(LogLevel::from_env(), LogLevel::Error);

        env::remove_var("TF_LOG");
    }

    #[test]
    #[serial]
    fn unset_or_unknown_means_warn() {
        env::remove_var("TF_LOG_PROVIDER");
        env::set_var("TF_LOG", "chatty");
        assert_eq!(LogLevel::from_env(), LogLevel::Warn);

        env::remove_var("TF_LOG");
        assert_eq!(LogLevel::from_env(), LogLevel::Warn);
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LogLevel::Info);
        assert!(!init_logging(LogLevel::Debug));
    }
}
