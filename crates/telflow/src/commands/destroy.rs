use crate::action::Plan;
use crate::commands::apply::{execute, print_result};
use crate::commands::plan::print_plan;
use crate::manifest::Manifest;
use crate::state::StateManager;
use crate::utils;
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path, yes: bool) -> anyhow::Result<()> {
    println!("{}", "Destroying tracked resources...".red().bold());
    utils::print_loaded_files(project_root);

    let manager = StateManager::new(project_root);
    let lock = manager.acquire_lock("destroy").await?;
    let mut state = manager.load().await?;
    let plan = Plan::destroy(&state);

    println!();
    print_plan(&plan);
    if !plan.has_changes {
        lock.release().await?;
        return Ok(());
    }

    if !yes {
        println!();
        println!(
            "{}",
            "Warning: phone numbers are released and subaccounts closed. This cannot be undone."
                .yellow()
        );
        println!("Run with --yes to destroy these resources");
        lock.release().await?;
        return Ok(());
    }

    println!();
    let controller = utils::connect()?;
    let result = execute(
        &controller,
        &manager,
        &mut state,
        &Manifest::default(),
        &plan,
    )
    .await;
    lock.release().await?;

    print_result(&result?)
}
