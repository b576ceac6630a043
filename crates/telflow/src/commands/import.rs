use crate::state::StateManager;
use crate::utils;
use colored::Colorize;
use std::path::Path;
use telflow_provider::{ResourceData, ResourceKind};

/// Start tracking an existing remote object under `name`
pub async fn handle(
    project_root: &Path,
    name: &str,
    kind: ResourceKind,
    id: &str,
) -> anyhow::Result<()> {
    println!("{}", "Importing...".blue().bold());

    let manager = StateManager::new(project_root);
    let lock = manager.acquire_lock("import").await?;
    let mut state = manager.load().await?;

    if let Some(existing) = state.get(name) {
        lock.release().await?;
        return Err(anyhow::anyhow!(
            "'{}' already tracks {} {}",
            name,
            existing.kind,
            existing.id
        ));
    }

    let controller = utils::connect()?;
    let mut data = ResourceData::new(kind);
    if let Err(err) = controller.import(&mut data, id).await {
        lock.release().await?;
        return Err(err.into());
    }

    state.upsert(name, &data, id);
    manager.save(&state).await?;
    lock.release().await?;

    println!(
        "{} {} {} is now tracked as {}",
        "✓".green(),
        kind,
        id,
        name.cyan()
    );
    Ok(())
}
