//! Declared resources file (`telflow.resources.yaml`)
//!
//! ```yaml
//! resources:
//!   - name: alerts
//!     type: twilio_messaging_service
//!     attributes:
//!       friendly_name: alerts
//!   - name: support-line
//!     type: twilio_phone_number
//!     attributes:
//!       country_code: US
//!       area_code: "415"
//!       service_sid: "{{ alerts.id }}"
//! ```
//!
//! String attributes may reference other resources with `{{ <name>.id }}` or
//! `{{ <name>.<attribute> }}`, and the environment with `{{ env.VAR }}`.

use crate::state::GlobalState;
use anyhow::{Context, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use telflow_provider::ResourceKind;

pub const MANIFEST_FILE: &str = "telflow.resources.yaml";

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_-]+)\.([A-Za-z0-9_]+)\s*\}\}").expect("valid reference pattern")
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<DeclaredResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclaredResource {
    pub name: String,

    /// Resource type, e.g. `twilio_phone_number`
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl DeclaredResource {
    pub fn kind(&self) -> anyhow::Result<ResourceKind> {
        self.type_name
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{} (resource '{}')", e, self.name))
    }

    /// Names of the resources this one references
    pub fn dependencies(&self) -> Vec<String> {
        let mut names = Vec::new();
        for value in self.attributes.values() {
            collect_references(value, &mut names);
        }
        names.sort();
        names.dedup();
        names
    }
}

fn collect_references(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in REFERENCE.captures_iter(s) {
                if &caps[1] != "env" {
                    names.push(caps[1].to_string());
                }
            }
        }
        Value::Object(map) => map.values().for_each(|v| collect_references(v, names)),
        _ => {}
    }
}

impl Manifest {
    pub fn path(project_root: &Path) -> PathBuf {
        project_root.join(MANIFEST_FILE)
    }

    /// Load and check the declared resources of a project. A missing file
    /// declares nothing.
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let path = Self::path(project_root);
        if !path.exists() {
            tracing::debug!("No {} found, nothing declared", MANIFEST_FILE);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content)?;
        manifest.check()?;
        Ok(manifest)
    }

    /// Unique names, known types, and references only to earlier resources
    fn check(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            if resource.name.trim().is_empty() {
                bail!("resource names must not be empty");
            }
            resource.kind()?;
            for dependency in resource.dependencies() {
                if !seen.contains(dependency.as_str()) {
                    bail!(
                        "resource '{}' references '{}', which must be declared before it",
                        resource.name,
                        dependency
                    );
                }
            }
            if !seen.insert(resource.name.as_str()) {
                bail!("resource '{}' is declared twice", resource.name);
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DeclaredResource> {
        self.resources.iter().find(|r| r.name == name)
    }
}

/// A reference that cannot be resolved yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved(pub String);

/// Expand references in `attributes` against tracked state and the
/// environment. Fails with the first reference that has no value yet.
pub fn resolve_references(
    attributes: &Map<String, Value>,
    state: &GlobalState,
) -> Result<Map<String, Value>, Unresolved> {
    attributes
        .iter()
        .map(|(key, value)| Ok((key.clone(), resolve_value(value, state)?)))
        .collect()
}

fn resolve_value(value: &Value, state: &GlobalState) -> Result<Value, Unresolved> {
    match value {
        Value::String(s) => resolve_string(s, state).map(Value::String),
        Value::Object(map) => resolve_references(map, state).map(Value::Object),
        other => Ok(other.clone()),
    }
}

fn resolve_string(s: &str, state: &GlobalState) -> Result<String, Unresolved> {
    let mut missing = None;
    let expanded = REFERENCE.replace_all(s, |caps: &regex::Captures| {
        let (target, field) = (&caps[1], &caps[2]);
        let value = if target == "env" {
            std::env::var(field).ok()
        } else {
            state.get(target).and_then(|tracked| match field {
                "id" => Some(tracked.id.clone()),
                _ => tracked
                    .attributes
                    .get(field)
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            })
        };
        value.unwrap_or_else(|| {
            missing.get_or_insert_with(|| format!("{}.{}", target, field));
            String::new()
        })
    });
    match missing {
        Some(reference) => Err(Unresolved(reference)),
        None => Ok(expanded.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use telflow_provider::ResourceData;

    const EXAMPLE: &str = r#"
resources:
  - name: alerts
    type: twilio_messaging_service
    attributes:
      friendly_name: alerts
      validity_period: 600
  - name: support-line
    type: twilio_phone_number
    attributes:
      country_code: US
      area_code: "415"
      service_sid: "{{ alerts.id }}"
      voice:
        primary_url: "https://example.com/voice"
"#;

    #[test]
    fn test_parse() {
        let manifest = Manifest::parse(EXAMPLE).unwrap();
        assert_eq!(manifest.resources.len(), 2);

        let line = manifest.get("support-line").unwrap();
        assert_eq!(line.kind().unwrap(), ResourceKind::PhoneNumber);
        assert_eq!(line.dependencies(), vec!["alerts".to_string()]);
        assert_eq!(line.attributes["voice"]["primary_url"], "https://example.com/voice");
        assert_eq!(
            manifest.get("alerts").unwrap().attributes["validity_period"],
            json!(600)
        );
    }

    #[test]
    fn test_rejects_forward_reference_and_duplicates() {
        let forward = r#"
resources:
  - name: line
    type: twilio_phone_number
    attributes: { country_code: US, service_sid: "{{ svc.id }}" }
  - name: svc
    type: twilio_messaging_service
"#;
        assert!(Manifest::parse(forward).is_err());

        let duplicate = r#"
resources:
  - { name: a, type: twilio_api_key }
  - { name: a, type: twilio_api_key }
"#;
        let err = Manifest::parse(duplicate).unwrap_err();
        assert!(err.to_string().contains("declared twice"));

        let unknown = "resources:\n  - { name: a, type: twilio_queue }\n";
        assert!(Manifest::parse(unknown).is_err());
    }

    #[test]
    fn test_resolve_references() {
        let mut state = GlobalState::new();
        let mut svc = ResourceData::new(ResourceKind::MessagingService);
        telflow_provider::ConfigStore::set(&mut svc, "friendly_name", json!("alerts")).unwrap();
        state.upsert("alerts", &svc, "MG1");

        let attributes = json!({
            "service_sid": "{{ alerts.id }}",
            "friendly_name": "line for {{alerts.friendly_name}}",
            "sms": { "primary_url": "https://example.com/{{ alerts.id }}" }
        });
        let resolved =
            resolve_references(attributes.as_object().unwrap(), &state).unwrap();

        assert_eq!(resolved["service_sid"], "MG1");
        assert_eq!(resolved["friendly_name"], "line for alerts");
        assert_eq!(resolved["sms"]["primary_url"], "https://example.com/MG1");

        let pending = json!({ "service_sid": "{{ other.id }}" });
        assert_eq!(
            resolve_references(pending.as_object().unwrap(), &state),
            Err(Unresolved("other.id".to_string()))
        );
    }
}
