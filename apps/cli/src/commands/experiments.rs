//! Experiments command implementation.

use crate::config::Config;
use crate::ExperimentsCommand;
use anvil_platform::{ServicePrincipal, TokenClient};
use anvil_tracking::TrackingClient;
use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::Table;

async fn client(config: &Config) -> Result<TrackingClient> {
    let coords = config.coordinates()?;
    let principal = ServicePrincipal::from_env()?;
    let token = TokenClient::new()
        .acquire(&principal, &config.tracking_resource())
        .await
        .context("Failed to acquire tracking token")?;
    Ok(TrackingClient::new(coords.tracking_base(config.tracking_host()), token))
}

/// Execute the experiments command.
pub async fn execute(command: ExperimentsCommand, config: &Config) -> Result<()> {
    match command {
        ExperimentsCommand::List { json } => {
            let experiments = client(config).await?.list_experiments().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&experiments)?);
                return Ok(());
            }

            if experiments.is_empty() {
                println!("{}", "No experiments in this workspace".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["ID", "NAME", "STAGE"]);
            for e in &experiments {
                table.add_row(vec![
                    e.experiment_id.clone(),
                    e.name.clone(),
                    e.lifecycle_stage.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        ExperimentsCommand::Show { experiment_id, runs } => {
            let tracking = client(config).await?;
            let experiment = tracking.get_experiment(&experiment_id).await?;

            println!("{}", experiment.name.bold().cyan());
            println!("  id:       {}", experiment.experiment_id);
            if let Some(stage) = &experiment.lifecycle_stage {
                println!("  stage:    {stage}");
            }
            if let Some(location) = &experiment.artifact_location {
                println!("  location: {location}");
            }

            if runs {
                let runs = tracking.search_runs(&experiment_id, None).await?;
                println!();
                let mut table = Table::new();
                table.set_header(vec!["RUN", "STATUS"]);
                for run in &runs {
                    table.add_row(vec![
                        run.info.run_id.clone(),
                        run.info.status.clone().unwrap_or_default(),
                    ]);
                }
                println!("{table}");
            }
        }
    }

    Ok(())
}
