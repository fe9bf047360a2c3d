use std::fmt;
use std::str::FromStr;

/// Verbosity for this crate's own targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Chatty in development, quieter in production.
    pub fn default_for(is_production: bool) -> Self {
        if is_production {
            LogLevel::Info
        } else {
            LogLevel::Debug
        }
    }

    /// `LOG_LEVEL` if it names a level, otherwise the environment default.
    pub fn resolve(configured: Option<&str>, is_production: bool) -> Self {
        configured
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| Self::default_for(is_production))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub fn default_directive(level: LogLevel) -> String {
    format!("portfolio_cms={level},tower_http=debug,axum=info,sqlx=warn")
}
