use crate::core::{
    error::Result,
    print_info, print_section_header, print_success,
    workspace::Workspace,
};
use colored::*;
use std::path::PathBuf;

pub async fn execute_add(workspace: &Workspace, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let record = workspace.add_repository(path).await?;
        let status = workspace.status_reader().get_status(&record.path);
        let note = if status.is_broken() {
            format!(" {}", "(not a usable git repository yet)".bright_black())
        } else {
            String::new()
        };
        print_success(&format!("Added {}{note}", record.path.display()));
    }
    println!();
    Ok(())
}

pub async fn execute_remove(workspace: &Workspace, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let record = workspace.remove_repository(path).await?;
        print_success(&format!("Removed {}", record.path.display()));
    }
    println!();
    Ok(())
}

/// List tracked repositories without running git.
pub fn execute_list(workspace: &Workspace, json: bool) -> Result<()> {
    let repositories = workspace.active_repositories();
    if json {
        println!("{}", serde_json::to_string_pretty(&repositories)?);
        return Ok(());
    }

    if repositories.is_empty() {
        print_info("No repositories tracked.");
        return Ok(());
    }

    let config = workspace.config().current();
    let header = match config.selected_workspace.as_deref() {
        Some(name) => format!("Repositories in {name}"),
        None => "Repositories".to_string(),
    };
    print_section_header(&header);
    for record in &repositories {
        println!(
            "{} {}",
            record.effective_name().white(),
            record.path.display().to_string().bright_black()
        );
    }
    println!();
    Ok(())
}
