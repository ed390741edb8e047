use crate::core::{
    error::{FleetError, Result},
    output::format_global_branch,
    print_info, print_section_header,
    workspace::Workspace,
};

/// List protected branches that some active repositories could switch to.
pub async fn execute_branches(workspace: &Workspace, json: bool) -> Result<()> {
    if !workspace.is_ready() {
        return Err(FleetError::GitExecutableUnresolved);
    }
    workspace.refresh_all().await;
    let branches = workspace.global_branches().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&branches)?);
        return Ok(());
    }

    if branches.is_empty() {
        print_info("Every repository is already on its protected branches.");
        return Ok(());
    }

    print_section_header("Protected Branches");
    for info in &branches {
        println!("{}", format_global_branch(info));
    }
    println!();
    Ok(())
}
