//! Unified output formatting for consistent CLI presentation.
//!
//! # Design Principles
//! - **Consistent color scheme**: red for errors and broken repositories, yellow
//!   for repositories needing attention, green for clean ones, blue for branches
//! - **Standardized spacing**: a blank line before and after each command's output
//! - **Muted decoration**: brackets, parentheses and paths in bright_black

use crate::core::branch_aggregator::GlobalBranchInfo;
use crate::core::config::RepositoryRecord;
use crate::core::state::{RepositoryStatus, StatusCounters};
use crate::core::workspace::CheckoutResult;
use colored::*;

/// Formats and prints an error message with consistent styling
///
/// # Format
/// ```text
///
/// ✕ Error: <message>
///
/// ```
pub fn print_error(message: &str) {
    eprintln!("\n{} {}\n", "✕ Error:".red(), message.white());
}

/// Formats and prints a success message: a green checkmark and the message
pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green(), message.white());
}

pub fn print_info(message: &str) {
    println!("\n{}\n", message.white());
}

/// Formats and prints a section header followed by a blank line
pub fn print_section_header(header: &str) {
    println!("\n{}:\n", header.white());
}

/// ` (+2/−1)`, ` (+2)`, ` (-1)` or nothing when in sync.
pub fn format_ahead_behind(ahead: u32, behind: u32) -> String {
    if ahead > 0 && behind > 0 {
        format!(
            " {}+{}/−{}{}",
            "(".bright_black(),
            ahead.to_string().white(),
            behind.to_string().white(),
            ")".bright_black()
        )
    } else if ahead > 0 {
        format!(
            " {}+{}{}",
            "(".bright_black(),
            ahead.to_string().white(),
            ")".bright_black()
        )
    } else if behind > 0 {
        format!(
            " {}-{}{}",
            "(".bright_black(),
            behind.to_string().white(),
            ")".bright_black()
        )
    } else {
        String::new()
    }
}

/// Short colored label describing a repository's state.
pub fn format_status_label(status: &RepositoryStatus) -> ColoredString {
    match status {
        RepositoryStatus::Unknown => "unknown".bright_black(),
        RepositoryStatus::Broken { reason } => format!("broken: {reason}").red(),
        RepositoryStatus::Analyzed(snapshot) if snapshot.has_uncommitted_changes => {
            "dirty".yellow()
        }
        RepositoryStatus::Analyzed(_) if status.is_divergent() => "diverged".yellow(),
        RepositoryStatus::Analyzed(_) => "clean".green(),
    }
}

/// One line of the fleet status table:
/// `[name] branch (+a/−b) label  path`
pub fn format_repository_line(record: &RepositoryRecord, status: &RepositoryStatus) -> String {
    let branch = match status.snapshot() {
        Some(snapshot) if snapshot.is_detached => "(detached)".bright_black(),
        Some(snapshot) => snapshot
            .current_branch
            .as_deref()
            .unwrap_or("-none-")
            .blue(),
        None => "-".bright_black(),
    };
    let favorite = if record.is_favorite { "★ " } else { "" };
    format!(
        "{}{}{}{} {}{} {}  {}",
        "[".bright_black(),
        favorite.yellow(),
        record.effective_name().white(),
        "]".bright_black(),
        branch,
        format_ahead_behind(status.commits_ahead(), status.commits_behind()),
        format_status_label(status),
        record.path.display().to_string().bright_black()
    )
}

pub fn format_counters(total: usize, counters: &StatusCounters) -> String {
    format!(
        "{} repositories, {} need attention ({} broken, {} with incoming/outgoing, {} uncommitted)",
        total.to_string().white(),
        counters.needs_attention.to_string().yellow(),
        counters.broken.to_string().red(),
        counters.incoming_outgoing.to_string().white(),
        counters.uncommitted.to_string().white()
    )
}

/// `main  2/5  api, web`
pub fn format_global_branch(info: &GlobalBranchInfo) -> String {
    let names: Vec<&str> = info.switchable.iter().map(|r| r.name.as_str()).collect();
    format!(
        "{}  {}{}{}  {}",
        info.branch_name.blue(),
        info.switchable_count.to_string().white(),
        "/".bright_black(),
        info.total_repositories.to_string().bright_black(),
        names.join(", ").bright_black()
    )
}

pub fn format_checkout_result(result: &CheckoutResult) -> String {
    match &result.result {
        Ok(()) => format!("{} {}", "✓".green(), result.name.white()),
        Err(e) => format!("{} {} {}", "✕".red(), result.name.white(), e.to_string().bright_black()),
    }
}
