use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting '{setting}'. Set {env} or add `{setting}` to the config file")]
    MissingSetting {
        setting: &'static str,
        env: &'static str,
    },

    #[error("Invalid account_sid '{0}': account SIDs start with 'AC'")]
    InvalidAccountSid(String),

    #[error("Invalid selection policy '{0}'. Expected 'take_first' or 'fail_on_multiple'")]
    InvalidSelectionPolicy(String),

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
