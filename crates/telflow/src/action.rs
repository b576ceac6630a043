//! Plan of actions that brings tracked resources in line with the declared
//! resources file

use crate::manifest::{Manifest, Unresolved, resolve_references};
use crate::state::GlobalState;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use telflow_provider::ResourceKind;
use telflow_provider::schema::{Access, FieldSpec, FieldType};

/// A planned action for one declared or tracked resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Name in the declared resources file
    pub name: String,

    pub kind: ResourceKind,

    pub action_type: ActionType,

    /// Remote SID, when the resource is tracked
    pub id: Option<String>,

    pub changes: Vec<AttributeChange>,
}

impl Action {
    fn new(name: &str, kind: ResourceKind, action_type: ActionType, id: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            action_type,
            id: id.map(str::to_string),
            changes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Update,
    Delete,
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// One attribute that differs between tracked and declared state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute path, `block.field` for nested fields
    pub field: String,
    pub before: Option<Value>,
    pub after: ChangeValue,
    pub sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeValue {
    Known(Option<Value>),
    /// Depends on a resource that is not created yet
    KnownAfterApply(String),
}

impl std::fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let render = |value: &Option<Value>| match value {
            _ if self.sensitive => "(sensitive)".to_string(),
            Some(Value::String(s)) => format!("\"{}\"", s),
            Some(other) => other.to_string(),
            None => "null".to_string(),
        };
        match &self.after {
            ChangeValue::Known(after) => {
                write!(f, "{}: {} -> {}", self.field, render(&self.before), render(after))
            }
            ChangeValue::KnownAfterApply(reference) => write!(
                f,
                "{}: {} -> (known after apply: {})",
                self.field,
                render(&self.before),
                reference
            ),
        }
    }
}

/// Result of applying actions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    pub succeeded: Vec<ActionResult>,
    pub failed: Vec<ActionResult>,
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, name: &str, message: String) {
        self.succeeded.push(ActionResult {
            name: name.to_string(),
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, name: &str, error: String) {
        self.failed.push(ActionResult {
            name: name.to_string(),
            message: String::new(),
            error: Some(error),
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub name: String,
    pub message: String,
    pub error: Option<String>,
}

/// Ordered actions: deletions of undeclared resources last, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    /// Compare the declared resources with tracked state. No remote call is
    /// made; drift is only visible after a refresh.
    pub fn build(manifest: &Manifest, state: &GlobalState) -> anyhow::Result<Self> {
        let mut actions = Vec::new();

        for declared in &manifest.resources {
            let kind = declared.kind()?;
            let resolved = resolve_references(&declared.attributes, state);

            let Some(tracked) = state.get(&declared.name) else {
                let mut action = Action::new(&declared.name, kind, ActionType::Create, None);
                action.changes = creation_changes(kind, &declared.attributes, &resolved)?;
                actions.push(action);
                continue;
            };

            if tracked.kind != kind {
                let mut delete =
                    Action::new(&tracked.name, tracked.kind, ActionType::Delete, Some(&tracked.id));
                delete.changes = removal_changes(tracked.kind, &tracked.attributes);
                actions.push(delete);

                let mut create = Action::new(&declared.name, kind, ActionType::Create, None);
                create.changes = creation_changes(kind, &declared.attributes, &resolved)?;
                actions.push(create);
                continue;
            }

            let changes = match resolved {
                Ok(attributes) => diff_attributes(kind, &tracked.attributes, attributes)?,
                Err(Unresolved(reference)) => {
                    pending_changes(kind, &tracked.attributes, &declared.attributes, &reference)
                }
            };
            let action_type = if changes.is_empty() {
                ActionType::NoOp
            } else {
                ActionType::Update
            };
            let mut action = Action::new(&declared.name, kind, action_type, Some(&tracked.id));
            action.changes = changes;
            actions.push(action);
        }

        for tracked in state.resources.iter().rev() {
            if manifest.get(&tracked.name).is_none() {
                let mut action =
                    Action::new(&tracked.name, tracked.kind, ActionType::Delete, Some(&tracked.id));
                action.changes = removal_changes(tracked.kind, &tracked.attributes);
                actions.push(action);
            }
        }

        Ok(Self::new(actions))
    }

    /// Delete every tracked resource, newest first
    pub fn destroy(state: &GlobalState) -> Self {
        let actions = state
            .resources
            .iter()
            .rev()
            .map(|tracked| {
                Action::new(&tracked.name, tracked.kind, ActionType::Delete, Some(&tracked.id))
            })
            .collect();
        Self::new(actions)
    }

    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

fn normalize(kind: ResourceKind, declared: Map<String, Value>) -> anyhow::Result<Map<String, Value>> {
    kind.schema()
        .normalize_declared(declared)
        .map_err(|e| anyhow::anyhow!("Invalid {} configuration: {}", kind, e))
}

fn creation_changes(
    kind: ResourceKind,
    declared: &Map<String, Value>,
    resolved: &Result<Map<String, Value>, Unresolved>,
) -> anyhow::Result<Vec<AttributeChange>> {
    let attributes = match resolved {
        Ok(attributes) => normalize(kind, attributes.clone())?,
        Err(_) => normalize(kind, declared.clone())?,
    };
    let pending = resolved.as_ref().err();

    let mut changes = Vec::new();
    for spec in kind.schema().fields.iter() {
        let Some(value) = attributes.get(spec.name) else {
            continue;
        };
        let after = match pending {
            Some(Unresolved(reference)) if mentions(value, reference) => {
                ChangeValue::KnownAfterApply(reference.clone())
            }
            _ => ChangeValue::Known(Some(value.clone())),
        };
        changes.push(AttributeChange {
            field: spec.name.to_string(),
            before: None,
            after,
            sensitive: spec.sensitive,
        });
    }
    Ok(changes)
}

fn removal_changes(kind: ResourceKind, attributes: &Map<String, Value>) -> Vec<AttributeChange> {
    kind.schema()
        .fields
        .iter()
        .filter(|spec| spec.is_declarable())
        .filter_map(|spec| {
            attributes.get(spec.name).map(|value| AttributeChange {
                field: spec.name.to_string(),
                before: Some(value.clone()),
                after: ChangeValue::Known(None),
                sensitive: spec.sensitive,
            })
        })
        .collect()
}

/// Attributes referencing a resource without a value yet are reported as
/// known after apply; everything else is diffed as usual.
fn pending_changes(
    kind: ResourceKind,
    prior: &Map<String, Value>,
    declared: &Map<String, Value>,
    reference: &str,
) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    for (key, value) in declared {
        if mentions(value, reference) {
            let sensitive = kind.schema().field(key).is_some_and(|spec| spec.sensitive);
            changes.push(AttributeChange {
                field: key.clone(),
                before: prior.get(key).cloned(),
                after: ChangeValue::KnownAfterApply(reference.to_string()),
                sensitive,
            });
        }
    }
    changes
}

fn mentions(value: &Value, reference: &str) -> bool {
    match value {
        Value::String(s) => s.contains(reference),
        Value::Object(map) => map.values().any(|v| mentions(v, reference)),
        _ => false,
    }
}

/// Differences between tracked attributes and resolved declared ones.
///
/// Operator-owned fields differ when their values differ, including a
/// removed declaration. Optional+computed fields are only compared when
/// declared, and blocks only on their declared sub-fields.
pub fn diff_attributes(
    kind: ResourceKind,
    prior: &Map<String, Value>,
    declared: Map<String, Value>,
) -> anyhow::Result<Vec<AttributeChange>> {
    let declared = normalize(kind, declared)?;
    let mut changes = Vec::new();

    for spec in kind.schema().fields.iter() {
        let before = prior.get(spec.name).filter(|v| !v.is_null());
        let after = declared.get(spec.name);
        match spec.access {
            Access::Computed => {}
            Access::OptionalComputed if after.is_none() => {}
            _ => diff_field(spec, spec.name, before, after, &mut changes),
        }
    }
    Ok(changes)
}

fn diff_field(
    spec: &FieldSpec,
    path: &str,
    before: Option<&Value>,
    after: Option<&Value>,
    changes: &mut Vec<AttributeChange>,
) {
    if let (FieldType::Block(_), Some(Value::Object(declared))) = (&spec.ty, after) {
        let prior_block = before.and_then(Value::as_object);
        for (key, value) in declared {
            let sub_before = prior_block.and_then(|b| b.get(key)).filter(|v| !v.is_null());
            let sub_spec = spec.sub_field(key);
            let ignore_case = sub_spec.is_some_and(|s| s.ignore_case);
            if !same_value(ignore_case, sub_before, Some(value)) {
                changes.push(AttributeChange {
                    field: format!("{}.{}", path, key),
                    before: sub_before.cloned(),
                    after: ChangeValue::Known(Some(value.clone())),
                    sensitive: sub_spec.is_some_and(|s| s.sensitive),
                });
            }
        }
        return;
    }

    if !same_value(spec.ignore_case, before, after) {
        changes.push(AttributeChange {
            field: path.to_string(),
            before: before.cloned(),
            after: ChangeValue::Known(after.cloned()),
            sensitive: spec.sensitive,
        });
    }
}

fn same_value(ignore_case: bool, before: Option<&Value>, after: Option<&Value>) -> bool {
    match (before, after) {
        (Some(Value::String(a)), Some(Value::String(b))) if ignore_case => a.eq_ignore_ascii_case(b),
        _ => before == after,
    }
}
