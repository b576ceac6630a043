use crate::utils;
use colored::Colorize;
use serde_json::json;
use telflow_provider::{ConfigStore, LookupQuery, ResourceKind};

pub struct LookupArgs {
    pub friendly_name: Option<String>,
    pub number: Option<String>,
    pub search: Option<String>,
    pub area_code: Option<String>,
}

impl LookupArgs {
    fn query(self) -> LookupQuery {
        let mut query = LookupQuery::new();
        if let Some(v) = self.friendly_name {
            query = query.friendly_name(v);
        }
        if let Some(v) = self.number {
            query = query.number(v);
        }
        if let Some(v) = self.search {
            query = query.search(v);
        }
        if let Some(v) = self.area_code {
            query = query.area_code(v);
        }
        query
    }
}

/// Resolve one existing remote object and print it as JSON
pub async fn handle(kind: ResourceKind, args: LookupArgs) -> anyhow::Result<()> {
    let controller = utils::connect()?;
    let data = controller.lookup(kind, &args.query()).await?;

    let id = data.id().unwrap_or_default().to_string();
    eprintln!("{} found {} {}", "✓".green(), kind.label(), id.cyan());

    let output = json!({
        "type": kind.type_name(),
        "id": id,
        "attributes": utils::redact(kind, data.attributes()),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
