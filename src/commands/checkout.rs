use crate::core::{
    error::{FleetError, Result},
    output::format_checkout_result,
    print_info, print_section_header,
    workspace::Workspace,
};

/// Switch every active repository that has `branch` to it. Returns the number
/// of repositories whose checkout failed.
pub async fn execute_checkout(workspace: &Workspace, branch: &str) -> Result<usize> {
    if !workspace.is_ready() {
        return Err(FleetError::GitExecutableUnresolved);
    }
    workspace.refresh_all().await;
    let results = workspace.checkout_across(branch).await?;

    if results.is_empty() {
        print_info(&format!("No repository needs switching to '{branch}'."));
        return Ok(0);
    }

    print_section_header(&format!("Checking out {branch}"));
    for result in &results {
        println!("{}", format_checkout_result(result));
    }
    println!();

    Ok(results.iter().filter(|r| r.result.is_err()).count())
}
