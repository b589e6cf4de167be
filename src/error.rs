use std::path::PathBuf;

use thiserror::Error;

/// Configuration failures. Each variant carries a stable numeric code so
/// scripts wrapping the CLI can tell them apart.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("1000: Config file not found ({})", .0.display())]
    FileNotFound(PathBuf),
    #[error("1001: No config elements have been defined")]
    NothingDefined,
    #[error("1002: Missing config value {0}")]
    MissingValue(&'static str),
    #[error("1003: Invalid config value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

impl ConfigError {
    pub fn code(&self) -> u16 {
        match self {
            ConfigError::FileNotFound(_) => 1000,
            ConfigError::NothingDefined => 1001,
            ConfigError::MissingValue(_) => 1002,
            ConfigError::InvalidValue { .. } => 1003,
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            ConfigError::FileNotFound(_) => "check the path passed with --config",
            ConfigError::NothingDefined => {
                "set TROLS_LEAGUES (e.g. nejta=AA;dvta=TN,HN) or TROLS_MAIN_RESULTS"
            }
            ConfigError::MissingValue(_) => "add the value to .env or the process environment",
            ConfigError::InvalidValue { .. } => "leagues are written as league=CODE[,CODE];...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigError;

    #[test]
    fn display_leads_with_code() {
        let err = ConfigError::NothingDefined;
        assert_eq!(err.code(), 1001);
        assert_eq!(err.to_string(), "1001: No config elements have been defined");
        assert!(
            ConfigError::FileNotFound("trols.env".into())
                .to_string()
                .starts_with("1000: Config file not found")
        );
    }
}
