use crate::state::StateManager;
use crate::utils;
use colored::Colorize;
use std::path::Path;

/// Print tracked resources from the state file
pub async fn handle(project_root: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let state = StateManager::new(project_root).load().await?;

    if let Some(name) = name {
        let tracked = state
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("'{}' is not tracked", name))?;
        let output = serde_json::json!({
            "name": tracked.name,
            "type": tracked.kind.type_name(),
            "id": tracked.id,
            "attributes": utils::redact(tracked.kind, &tracked.attributes),
            "updated_at": tracked.updated_at,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if state.resources.is_empty() {
        println!("{}", "Nothing is tracked yet.".dimmed());
        return Ok(());
    }

    println!(
        "{:<24} {:<28} {:<36} {}",
        "NAME".bold(),
        "TYPE".bold(),
        "ID".bold(),
        "UPDATED".bold()
    );
    for tracked in &state.resources {
        println!(
            "{:<24} {:<28} {:<36} {}",
            tracked.name.cyan(),
            tracked.kind.type_name(),
            tracked.id,
            tracked.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
