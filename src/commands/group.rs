use crate::core::{error::Result, print_info, print_success, workspace::Workspace};
use std::path::Path;

pub async fn execute_group_create(workspace: &Workspace, name: &str) -> Result<()> {
    if workspace.create_workspace(name).await? {
        print_success(&format!("Created workspace {name}"));
        println!();
    } else {
        print_info(&format!("Workspace {name} already exists."));
    }
    Ok(())
}

/// Select `name`, or clear the selection when `None`.
pub async fn execute_group_select(workspace: &Workspace, name: Option<&str>) -> Result<()> {
    workspace.select_workspace(name).await?;
    match name {
        Some(name) => print_success(&format!("Selected workspace {name}")),
        None => print_success("Cleared workspace selection"),
    }
    println!();
    Ok(())
}

pub async fn execute_group_assign(workspace: &Workspace, name: &str, path: &Path) -> Result<()> {
    let path = tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf());
    workspace.assign_to_workspace(name, &path).await?;
    print_success(&format!("Added {} to {name}", path.display()));
    println!();
    Ok(())
}
