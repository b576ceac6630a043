use crate::manifest::Manifest;
use crate::state::StateManager;
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use telflow_provider::{LifecycleController, ProviderConfig, ProviderContext, ResourceKind};
use telflow_twilio::TwilioClient;

/// Project directory from `-C`, or the current directory
pub fn project_root(dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match dir {
        Some(dir) if dir.is_dir() => Ok(dir),
        Some(dir) => Err(anyhow::anyhow!(
            "Project directory not found: {}",
            dir.display()
        )),
        None => Ok(std::env::current_dir()?),
    }
}

/// Load account configuration and build a controller backed by the Twilio
/// REST API
pub fn connect() -> anyhow::Result<LifecycleController> {
    let config = ProviderConfig::load()?;
    let client = TwilioClient::new(&config)?;
    tracing::debug!(account_sid = %config.account_sid, "Connected provider client");
    Ok(LifecycleController::new(ProviderContext::new(
        Arc::new(client),
        config,
    )))
}

/// Replace sensitive attribute values for display
pub fn redact(kind: ResourceKind, attributes: &Map<String, Value>) -> Map<String, Value> {
    attributes
        .iter()
        .map(|(key, value)| {
            let sensitive = kind.schema().field(key).is_some_and(|spec| spec.sensitive);
            if sensitive && !value.is_null() {
                (key.clone(), Value::String("(sensitive)".to_string()))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

/// Show which files the command reads
pub fn print_loaded_files(project_root: &Path) {
    println!("📄 Files:");

    let manifest = Manifest::path(project_root);
    if manifest.exists() {
        println!("  • {}", manifest.display().to_string().cyan());
    } else {
        println!(
            "  • {} {}",
            manifest.display().to_string().dimmed(),
            "(not found, nothing declared)".dimmed()
        );
    }

    let state = StateManager::new(project_root).state_path();
    if state.exists() {
        println!("  • {}", state.display().to_string().cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redact_hides_secrets_only() {
        let attributes = json!({ "friendly_name": "ci", "secret": "s3cr3t" });
        let redacted = redact(ResourceKind::ApiKey, attributes.as_object().unwrap());
        assert_eq!(redacted["friendly_name"], "ci");
        assert_eq!(redacted["secret"], "(sensitive)");
    }

    #[test]
    fn test_project_root_must_exist() {
        let missing = PathBuf::from("/nonexistent/telflow-project");
        assert!(project_root(Some(missing)).is_err());
    }
}
