//! Compute command implementation.

use crate::config::Config;
use crate::ComputeCommand;
use anvil_compute::{ComputeClient, ComputeIdentity, SparkComputeSpec};
use anvil_platform::{ServicePrincipal, TokenClient};
use anyhow::{Context, Result};
use colored::Colorize;

async fn client(config: &Config) -> Result<ComputeClient> {
    let coords = config.coordinates()?;
    let principal = ServicePrincipal::from_env()?;
    let token = TokenClient::new()
        .acquire(&principal, &config.management_resource())
        .await
        .context("Failed to acquire management token")?;
    Ok(ComputeClient::new(coords.management_base(config.management_host()), token))
}

/// Execute the compute command.
pub async fn execute(command: ComputeCommand, config: &Config) -> Result<()> {
    match command {
        ComputeCommand::Attach { name, resource_id, system_identity, identity_client_id } => {
            let mut spec = SparkComputeSpec::new(&name, resource_id);
            if system_identity {
                spec = spec.with_identity(ComputeIdentity::SystemAssigned);
            } else if let Some(client_id) = identity_client_id {
                spec = spec.with_identity(ComputeIdentity::UserAssigned { client_id });
            }

            let resource = client(config).await?.attach(&spec).await?;
            println!("{} attached compute '{}'", "✓".green(), resource.name.bold());
        }
        ComputeCommand::Detach { name } => {
            client(config).await?.detach(&name).await?;
            println!("{} detached compute '{}'", "✓".green(), name.bold());
        }
        ComputeCommand::Show { name } => {
            let resource = client(config).await?.get(&name).await?;
            println!("{}", name.bold().cyan());
            println!("{}", serde_json::to_string_pretty(&resource.properties)?);
        }
    }

    Ok(())
}
