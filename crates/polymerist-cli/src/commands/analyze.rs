use crate::cli::AnalyzeArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use polymerist::analysis::trajectory::Trajectory;
use polymerist::engine::progress::ProgressReporter;
use polymerist::workflows;
use tracing::{info, warn};

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let partial_config = PartialAnalysisConfig::from_file(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args)?;

    info!("Loading trajectory from {:?}", &args.input);
    let input = args.input.clone();
    let time_step = final_config.time_step;
    let report = tokio::task::spawn_blocking(move || -> Result<_> {
        let trajectory = Trajectory::from_pdb_path(&input, time_step)?;
        if trajectory.n_frames() == 1 {
            warn!("Trajectory has a single frame; time series will have one row.");
        }
        let progress_handler = CliProgressHandler::new();
        let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
        Ok(workflows::analyze::run(&trajectory, &final_config, &reporter)?)
    })
    .await
    .map_err(|e| CliError::Other(anyhow::anyhow!("Analysis task failed: {}", e)))??;

    report.properties.write_csv_path(&args.output)?;
    println!(
        "✓ {} properties over {} frames written to: {}",
        report.properties.n_columns().saturating_sub(1),
        report.properties.n_rows(),
        args.output.display()
    );

    if let (Some(rdfs), Some(path)) = (&report.rdfs, &args.rdf_output) {
        rdfs.write_csv_path(path)?;
        println!(
            "✓ {} radial distribution functions written to: {}",
            rdfs.n_columns().saturating_sub(1),
            path.display()
        );
    }
    Ok(())
}
