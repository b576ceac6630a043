//! Account configuration for telflow
//!
//! Credentials and provider-wide settings are read once per process and
//! shared read-only by every lifecycle verb.
//!
//! Settings are resolved in this order (later wins):
//! 1. the config file (see [`find_config_file`])
//! 2. environment variables (`TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`,
//!    `TWILIO_ENDPOINT`, `TELFLOW_SELECTION_POLICY`)

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
pub const ENV_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
pub const ENV_ENDPOINT: &str = "TWILIO_ENDPOINT";
pub const ENV_SELECTION_POLICY: &str = "TELFLOW_SELECTION_POLICY";
pub const ENV_CONFIG_PATH: &str = "TELFLOW_CONFIG_PATH";

/// How a single candidate is picked when several remote objects qualify.
///
/// Applies both to lookups and to the number picked from an availability
/// search before purchase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// First qualifying candidate in server order.
    #[default]
    TakeFirst,
    /// More than one qualifying candidate is an error.
    FailOnMultiple,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::TakeFirst => write!(f, "take_first"),
            SelectionPolicy::FailOnMultiple => write!(f, "fail_on_multiple"),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "take_first" | "first" => Ok(SelectionPolicy::TakeFirst),
            "fail_on_multiple" | "strict" => Ok(SelectionPolicy::FailOnMultiple),
            other => Err(ConfigError::InvalidSelectionPolicy(other.to_string())),
        }
    }
}

/// On-disk layout of the config file. Every key is optional so the
/// environment can fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub endpoint: Option<String>,
    pub selection_policy: Option<SelectionPolicy>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Resolved provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Overrides the API host. Blank means the public endpoints.
    pub endpoint: Option<String>,
    pub selection_policy: SelectionPolicy,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("selection_policy", &self.selection_policy)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            endpoint: None,
            selection_policy: SelectionPolicy::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection_policy = policy;
        self
    }

    /// Load from the discovered config file (if any) and the process environment.
    pub fn load() -> Result<Self> {
        let file = match find_config_file() {
            Some(path) => {
                tracing::debug!("Loading config file: {}", path.display());
                ConfigFile::load(&path)?
            }
            None => ConfigFile::default(),
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a config file with an environment lookup. Non-blank environment
    /// values win over file values.
    pub fn from_sources<F>(file: ConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let account_sid = env_value(ENV_ACCOUNT_SID)
            .or(file.account_sid)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingSetting {
                setting: "account_sid",
                env: ENV_ACCOUNT_SID,
            })?;
        if !account_sid.starts_with("AC") {
            return Err(ConfigError::InvalidAccountSid(account_sid));
        }

        let auth_token = env_value(ENV_AUTH_TOKEN)
            .or(file.auth_token)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingSetting {
                setting: "auth_token",
                env: ENV_AUTH_TOKEN,
            })?;

        let endpoint = env_value(ENV_ENDPOINT)
            .or(file.endpoint)
            .filter(|v| !v.trim().is_empty());

        let selection_policy = match env_value(ENV_SELECTION_POLICY) {
            Some(raw) => raw.parse()?,
            None => file.selection_policy.unwrap_or_default(),
        };

        Ok(Self {
            account_sid,
            auth_token,
            endpoint,
            selection_policy,
        })
    }
}

/// Find the config file.
///
/// Search order:
/// 1. `TELFLOW_CONFIG_PATH`
/// 2. current directory: `telflow.local.yaml`, `telflow.yaml`
/// 3. `./.telflow/config.yaml`
/// 4. `~/.config/telflow/config.yaml`
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(current_dir) = std::env::current_dir() {
        for filename in ["telflow.local.yaml", "telflow.yaml"] {
            let path = current_dir.join(filename);
            if path.exists() {
                return Some(path);
            }
        }

        let project_config = current_dir.join(".telflow").join("config.yaml");
        if project_config.exists() {
            return Some(project_config);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("telflow").join("config.yaml");
        if global_config.exists() {
            return Some(global_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::fs;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile {
            account_sid: Some("ACfile".to_string()),
            auth_token: Some("file-token".to_string()),
            endpoint: Some("https://file.example".to_string()),
            selection_policy: Some(SelectionPolicy::FailOnMultiple),
        };
        let config = ProviderConfig::from_sources(
            file,
            env_of(&[(ENV_ACCOUNT_SID, "ACenv"), (ENV_SELECTION_POLICY, "take_first")]),
        )
        .unwrap();

        assert_eq!(config.account_sid, "ACenv");
        assert_eq!(config.auth_token, "file-token");
        assert_eq!(config.endpoint.as_deref(), Some("https://file.example"));
        assert_eq!(config.selection_policy, SelectionPolicy::TakeFirst);
    }

    #[test]
    fn test_missing_auth_token() {
        let result =
            ProviderConfig::from_sources(ConfigFile::default(), env_of(&[(ENV_ACCOUNT_SID, "AC1")]));
        match result {
            Err(ConfigError::MissingSetting { setting, .. }) => assert_eq!(setting, "auth_token"),
            other => panic!("Expected MissingSetting, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_account_sid() {
        let result = ProviderConfig::from_sources(
            ConfigFile::default(),
            env_of(&[(ENV_ACCOUNT_SID, "XX123"), (ENV_AUTH_TOKEN, "t")]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidAccountSid(_))));
    }

    #[test]
    fn test_blank_endpoint_is_none() {
        let config = ProviderConfig::from_sources(
            ConfigFile::default(),
            env_of(&[
                (ENV_ACCOUNT_SID, "AC1"),
                (ENV_AUTH_TOKEN, "t"),
                (ENV_ENDPOINT, "  "),
            ]),
        )
        .unwrap();
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ProviderConfig::new("AC1", "super-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_selection_policy_parse() {
        assert_eq!(
            "fail_on_multiple".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::FailOnMultiple
        );
        assert_eq!(
            "TAKE_FIRST".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::TakeFirst
        );
        assert!("random".parse::<SelectionPolicy>().is_err());
    }

    #[test]
    fn test_config_file_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("telflow.yaml");
        fs::write(
            &path,
            "account_sid: AC123\nauth_token: abc\nselection_policy: fail_on_multiple\n",
        )
        .unwrap();

        let file = ConfigFile::load(&path).unwrap();
        assert_eq!(file.account_sid.as_deref(), Some("AC123"));
        assert_eq!(file.selection_policy, Some(SelectionPolicy::FailOnMultiple));
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "account_sid: AC1\n").unwrap();

        temp_env::with_var(ENV_CONFIG_PATH, Some(config_path.to_str().unwrap()), || {
            assert_eq!(find_config_file(), Some(config_path.clone()));
        });
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("telflow.yaml"), "# shared").unwrap();
        fs::write(temp_dir.path().join("telflow.local.yaml"), "# local").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let found = temp_env::with_var_unset(ENV_CONFIG_PATH, find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(found.unwrap().ends_with("telflow.local.yaml"));
    }

    #[test]
    #[serial]
    fn test_load_from_environment() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = temp_env::with_vars(
            [
                (ENV_CONFIG_PATH, None),
                (ENV_ACCOUNT_SID, Some("ACenv")),
                (ENV_AUTH_TOKEN, Some("token")),
                (ENV_ENDPOINT, None),
                (ENV_SELECTION_POLICY, Some("fail_on_multiple")),
            ],
            ProviderConfig::load,
        );
        std::env::set_current_dir(original_dir).unwrap();

        let config = result.unwrap();
        assert_eq!(config.account_sid, "ACenv");
        assert_eq!(config.selection_policy, SelectionPolicy::FailOnMultiple);
    }
}
