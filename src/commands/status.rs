use crate::core::{
    error::{FleetError, Result},
    output::{format_counters, format_repository_line},
    print_info, print_section_header,
    state::{RepositoryStatus, StatusCounters},
    workspace::Workspace,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct StatusRow {
    path: PathBuf,
    name: String,
    status: RepositoryStatus,
}

pub async fn execute_status(workspace: &Workspace, json: bool) -> Result<()> {
    if !workspace.is_ready() {
        return Err(FleetError::GitExecutableUnresolved);
    }
    workspace.refresh_all().await;

    let reader = workspace.status_reader();
    let repositories = workspace.active_repositories();

    if json {
        let rows: Vec<StatusRow> = repositories
            .iter()
            .map(|record| StatusRow {
                path: record.path.clone(),
                name: record.effective_name().to_string(),
                status: reader.get_status(&record.path),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if repositories.is_empty() {
        print_info("No repositories tracked. Add one with 'git-fleet add <path>'.");
        return Ok(());
    }

    print_section_header("Repositories");
    let statuses: Vec<RepositoryStatus> = repositories
        .iter()
        .map(|record| reader.get_status(&record.path))
        .collect();
    for (record, status) in repositories.iter().zip(&statuses) {
        println!("{}", format_repository_line(record, status));
    }

    let counters = StatusCounters::from_statuses(&statuses);
    println!("\n{}\n", format_counters(repositories.len(), &counters));
    Ok(())
}
