use crate::cli::BuildArgs;
use crate::config::PartialBuildConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use polymerist::engine::progress::ProgressReporter;
use polymerist::workflows;
use tracing::info;

pub async fn run(args: BuildArgs) -> Result<()> {
    let partial_config = PartialBuildConfig::from_file(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args)?;

    println!(
        "Building a chain of degree of polymerization {} from {}...",
        final_config.polymer.degree_of_polymerization,
        args.monomers.display()
    );
    info!("Invoking the core build workflow...");

    let result = tokio::task::spawn_blocking(move || {
        let progress_handler = CliProgressHandler::new();
        let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
        workflows::build::run(&final_config, &reporter)
    })
    .await
    .map_err(|e| CliError::Other(anyhow::anyhow!("Build task failed: {}", e)))??;

    let polymer = &result.polymer;
    info!(
        atoms = polymer.atom_count(),
        residues = polymer.n_residues(),
        "Build workflow finished"
    );
    println!(
        "✓ Built {} atoms in {} residues ({})",
        polymer.atom_count(),
        polymer.n_residues(),
        polymer.residue_sequence.join("-")
    );
    if let Some(path) = &result.output_path {
        println!("  Structure written to: {}", path.display());
    }
    Ok(())
}
