use crate::state::StateManager;
use crate::utils;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::Path;
use telflow_provider::{ConfigStore, ProviderError};

/// Read every tracked resource back from the remote and record drift.
/// Resources gone remotely stay tracked unless `prune` is set.
pub async fn handle(project_root: &Path, prune: bool) -> anyhow::Result<()> {
    println!("{}", "Refreshing tracked resources...".blue().bold());
    utils::print_loaded_files(project_root);

    let manager = StateManager::new(project_root);
    let lock = manager.acquire_lock("refresh").await?;
    let mut state = manager.load().await?;
    if state.resources.is_empty() {
        println!("{}", "Nothing is tracked yet.".dimmed());
        lock.release().await?;
        return Ok(());
    }

    let controller = utils::connect()?;
    let mut missing = Vec::new();

    println!();
    for tracked in state.resources.clone() {
        let mut data = tracked.to_data();
        match controller.read(&mut data).await {
            Ok(_) => {
                let keys: BTreeSet<&str> = data
                    .attributes()
                    .keys()
                    .chain(tracked.attributes.keys())
                    .map(String::as_str)
                    .collect();
                let drifted: Vec<&str> = keys
                    .into_iter()
                    .filter(|key| data.has_change(key))
                    .collect();
                if drifted.is_empty() {
                    println!("  {} {} ({})", "✓".green(), tracked.name.cyan(), tracked.id);
                } else {
                    println!(
                        "  {} {} ({}) drifted: {}",
                        "~".yellow(),
                        tracked.name.cyan(),
                        tracked.id,
                        drifted.join(", ")
                    );
                }
                state.upsert(&tracked.name, &data, &tracked.id);
            }
            Err(err @ ProviderError::RemoteObjectMissing { .. }) => {
                println!("  {} {}: {}", "✗".red(), tracked.name.cyan(), err);
                missing.push(tracked.name.clone());
            }
            Err(err) => {
                manager.save(&state).await?;
                lock.release().await?;
                return Err(err.into());
            }
        }
    }

    if prune {
        for name in &missing {
            state.remove(name);
            println!("  {} stopped tracking {}", "-".red(), name.cyan());
        }
    }

    manager.save(&state).await?;
    lock.release().await?;

    if missing.is_empty() || prune {
        println!();
        println!("{}", "State refreshed.".green());
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{} tracked resource(s) no longer exist remotely: {}. Run `telflow refresh --prune` to stop tracking them",
            missing.len(),
            missing.join(", ")
        ))
    }
}
