//! Implementation of the `foreman team` command.

use anyhow::Result;

use crate::cli::output::format_team_status_table;

use super::open_coordinator;

/// Print the team-wide status summary.
pub async fn execute(json: bool) -> Result<()> {
    let coordinator = open_coordinator().await?;
    let status = coordinator.team_status().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", format_team_status_table(&status));
    }
    Ok(())
}
