use crate::action::{Action, ActionType, ApplyResult, Plan};
use crate::commands::plan::print_plan;
use crate::manifest::{Manifest, Unresolved, resolve_references};
use crate::state::{GlobalState, StateManager};
use crate::utils;
use colored::Colorize;
use std::path::Path;
use std::time::Instant;
use telflow_provider::{ConfigStore, LifecycleController, LifecycleState, ResourceData};

pub async fn handle(project_root: &Path, yes: bool) -> anyhow::Result<()> {
    println!("{}", "Applying declared resources...".blue().bold());
    utils::print_loaded_files(project_root);

    let manifest = Manifest::load(project_root)?;
    let manager = StateManager::new(project_root);
    let lock = manager.acquire_lock("apply").await?;
    let mut state = manager.load().await?;
    let plan = Plan::build(&manifest, &state)?;

    println!();
    print_plan(&plan);
    if !plan.has_changes {
        lock.release().await?;
        return Ok(());
    }

    if !yes {
        println!();
        println!("{}", "Warning: this changes remote resources.".yellow());
        println!("Run with --yes to apply these changes");
        lock.release().await?;
        return Ok(());
    }

    println!();
    let controller = utils::connect()?;
    let result = execute(&controller, &manager, &mut state, &manifest, &plan).await;
    lock.release().await?;

    print_result(&result?)
}

/// Run the plan's actions in order, saving state after each one. Stops at
/// the first failure.
pub async fn execute(
    controller: &LifecycleController,
    manager: &StateManager,
    state: &mut GlobalState,
    manifest: &Manifest,
    plan: &Plan,
) -> anyhow::Result<ApplyResult> {
    let started = Instant::now();
    let mut result = ApplyResult::new();

    for action in plan.actions.iter().filter(|a| a.action_type != ActionType::NoOp) {
        println!(
            "{} {} {}...",
            "→".blue(),
            action.action_type,
            action.name.cyan()
        );
        let outcome = run_action(controller, state, manifest, action).await;
        manager.save(state).await?;

        match outcome {
            Ok(message) => {
                println!("  {} {}", "✓".green(), message);
                result.add_success(&action.name, message);
            }
            Err(err) => {
                println!("  {} {}", "✗".red(), err);
                result.add_failure(&action.name, format!("{:#}", err));
                break;
            }
        }
    }

    result.duration_ms = started.elapsed().as_millis() as u64;
    Ok(result)
}

async fn run_action(
    controller: &LifecycleController,
    state: &mut GlobalState,
    manifest: &Manifest,
    action: &Action,
) -> anyhow::Result<String> {
    match action.action_type {
        ActionType::Create => {
            let declared = declared_attributes(manifest, state, action)?;
            let mut data = ResourceData::from_config(action.kind, declared)?;
            let outcome = controller.create(&mut data).await;
            // a resource created before a later step failed is still tracked
            if let Some(id) = data.id().map(str::to_string) {
                state.upsert(&action.name, &data, &id);
            }
            outcome?;
            Ok(format!("created {}", data.id().unwrap_or_default()))
        }
        ActionType::Update => {
            let tracked = state
                .get(&action.name)
                .ok_or_else(|| anyhow::anyhow!("'{}' is not tracked", action.name))?;
            let declared = declared_attributes(manifest, state, action)?;
            let mut data = ResourceData::planned(
                action.kind,
                tracked.id.clone(),
                tracked.attributes.clone(),
                declared,
            )?;
            controller.update(&mut data).await?;
            let id = tracked.id.clone();
            state.upsert(&action.name, &data, &id);
            Ok(format!("updated {}", id))
        }
        ActionType::Delete => {
            let tracked = state
                .get(&action.name)
                .filter(|t| t.kind == action.kind)
                .ok_or_else(|| anyhow::anyhow!("'{}' is not tracked", action.name))?;
            let id = tracked.id.clone();
            let mut data = tracked.to_data();
            let outcome = controller.delete(&mut data).await?;
            state.remove(&action.name);
            match outcome {
                LifecycleState::Closed => Ok(format!("closed {}", id)),
                _ => Ok(format!("deleted {}", id)),
            }
        }
        ActionType::NoOp => Ok("unchanged".to_string()),
    }
}

fn declared_attributes(
    manifest: &Manifest,
    state: &GlobalState,
    action: &Action,
) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    let declared = manifest
        .get(&action.name)
        .ok_or_else(|| anyhow::anyhow!("'{}' is not declared", action.name))?;
    resolve_references(&declared.attributes, state).map_err(|Unresolved(reference)| {
        anyhow::anyhow!(
            "'{}' references {{{{ {} }}}}, which has no value",
            action.name,
            reference
        )
    })
}

pub fn print_result(result: &ApplyResult) -> anyhow::Result<()> {
    println!();
    if result.is_success() {
        println!(
            "{} {} action(s) completed in {}ms",
            "✓".green().bold(),
            result.succeeded.len(),
            result.duration_ms
        );
        return Ok(());
    }

    let failed: Vec<String> = result
        .failed
        .iter()
        .map(|f| format!("{}: {}", f.name, f.error.as_deref().unwrap_or_default()))
        .collect();
    println!(
        "{} {} succeeded, {} failed",
        "✗".red().bold(),
        result.succeeded.len(),
        result.failed.len()
    );
    Err(anyhow::anyhow!("Apply failed\n{}", failed.join("\n")))
}
