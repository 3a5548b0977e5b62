//! Models command implementation: the local bundle registry.

use crate::ModelsCommand;
use anvil_abstraction::{Frame, Signature};
use anvil_bundle::{LogModelRequest, ModelStore};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use comfy_table::Table;
use std::path::{Path, PathBuf};

/// Execute the models command.
pub fn execute(command: ModelsCommand, workspace_root: &Path) -> Result<()> {
    let store = ModelStore::new(workspace_root);

    match command {
        ModelsCommand::Log {
            name,
            flavor,
            state,
            loader,
            loader_artifact,
            artifacts,
            sources,
            signature,
        } => {
            let mut request = match (flavor, loader) {
                (Some(flavor), None) => {
                    let state_path =
                        state.context("--state is required when logging with --flavor")?;
                    let text = std::fs::read_to_string(&state_path)
                        .with_context(|| format!("failed to read {}", state_path.display()))?;
                    let state = serde_json::from_str(&text)
                        .with_context(|| format!("invalid state JSON in {}", state_path.display()))?;
                    LogModelRequest::embedded(&name, flavor, state)
                }
                (None, Some(loader)) => LogModelRequest::deferred(&name, loader, loader_artifact),
                _ => bail!("exactly one of --flavor or --loader is required"),
            };

            for pair in &artifacts {
                let (artifact_name, path) = pair.split_once('=').with_context(|| {
                    format!("invalid --artifact '{pair}' (expected NAME=PATH)")
                })?;
                request = request.with_artifact(artifact_name, PathBuf::from(path));
            }
            for source in sources {
                request = request.with_source(source);
            }
            if let Some(signature_path) = signature {
                let text = std::fs::read_to_string(&signature_path).with_context(|| {
                    format!("failed to read {}", signature_path.display())
                })?;
                let signature: Signature = serde_json::from_str(&text).with_context(|| {
                    format!("invalid signature JSON in {}", signature_path.display())
                })?;
                request = request.with_signature(signature);
            }

            let manifest = store.log_model(request)?;
            println!(
                "{} logged '{}' version {} (run {})",
                "✓".green(),
                manifest.name.bold(),
                manifest.version,
                manifest.run_id
            );
        }
        ModelsCommand::List { json } => {
            let entries = store.list()?;

            if json {
                let manifests: Vec<_> = entries.iter().map(|e| &e.manifest).collect();
                println!("{}", serde_json::to_string_pretty(&manifests)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("{}", "No models logged in this workspace".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["NAME", "VERSION", "ENTRY POINT", "CREATED"]);
            for entry in &entries {
                table.add_row(vec![
                    entry.name.clone(),
                    entry.version.to_string(),
                    entry.manifest.entry_point.id().to_string(),
                    entry.manifest.created_at.to_rfc3339(),
                ]);
            }
            println!("{table}");
        }
        ModelsCommand::Show { name, version } => {
            let manifest = store.manifest(&name, version)?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        ModelsCommand::Predict { name, version, input, json } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let frame: Frame = serde_json::from_str(&text)
                .with_context(|| format!("invalid frame JSON in {}", input.display()))?;

            let handle = store.load(&name, version)?;
            let output = handle.predict(&frame)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(output.columns.clone());
            for row in &output.rows {
                table.add_row(row.iter().map(ToString::to_string));
            }
            println!("{table}");
        }
        ModelsCommand::Verify { name, version } => {
            store.verify(&name, version)?;
            println!("{} artifacts verified for '{}'", "✓".green(), name.bold());
        }
    }

    Ok(())
}
