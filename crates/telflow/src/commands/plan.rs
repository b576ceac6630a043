use crate::action::{ActionType, Plan};
use crate::manifest::Manifest;
use crate::state::StateManager;
use crate::utils;
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path) -> anyhow::Result<()> {
    println!("{}", "Planning...".blue().bold());
    utils::print_loaded_files(project_root);

    let manifest = Manifest::load(project_root)?;
    let state = StateManager::new(project_root).load().await?;
    let plan = Plan::build(&manifest, &state)?;

    println!();
    print_plan(&plan);
    Ok(())
}

pub fn print_plan(plan: &Plan) {
    if !plan.has_changes {
        println!("{}", "No changes. Tracked resources match the declaration.".green());
        return;
    }

    for action in &plan.actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update => "~".yellow(),
            ActionType::Delete => "-".red(),
            ActionType::NoOp => continue,
        };
        let id = action
            .id
            .as_deref()
            .map(|id| format!(" ({})", id))
            .unwrap_or_default();
        println!(
            "  {} {} {}{}",
            marker,
            action.kind.to_string().dimmed(),
            action.name.cyan(),
            id.dimmed()
        );
        for change in &action.changes {
            println!("      {}", change);
        }
    }

    println!();
    println!("{} {}", "Plan:".bold(), plan.summary());
}
