use crate::core::{
    error::{FleetError, Result},
    output::{format_counters, format_repository_line},
    print_info,
    status_cache::StatusEvent,
    workspace::Workspace,
};
use tokio::sync::broadcast::error::RecvError;

/// Watch every tracked repository and print status changes until interrupted.
pub async fn execute_watch(workspace: &Workspace) -> Result<()> {
    if !workspace.is_ready() {
        return Err(FleetError::GitExecutableUnresolved);
    }

    let reader = workspace.status_reader();
    let mut events = reader.subscribe();
    let startup = workspace.spawn_startup_refresh();
    let watched = workspace.enable_watching();
    print_info(&format!(
        "Watching {watched} repositories. Press Ctrl-C to stop."
    ));

    if let Ok(Some(summary)) = startup.await {
        log::debug!("Startup refresh finished: {summary:?}");
        println!(
            "{}\n",
            format_counters(reader.len(), &reader.counters())
        );
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(StatusEvent::Updated(path)) => {
                    let config = workspace.config().current();
                    if let Some(record) = config.repository(&path) {
                        println!("{}", format_repository_line(record, &reader.get_status(&path)));
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Missed {skipped} status events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    if let Some(watcher) = workspace.watcher() {
        watcher.shutdown();
    }
    Ok(())
}
