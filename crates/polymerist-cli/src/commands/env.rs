use crate::cli::{EnvArgs, EnvCommands};
use crate::error::{CliError, Result};
use polymerist::core::environment::EnvironmentAudit;
use polymerist::engine::error::EngineError;
use polymerist::workflows::environment;
use tracing::info;

pub async fn run(args: EnvArgs) -> Result<()> {
    match args.command {
        EnvCommands::Check { manifest } => {
            let env = environment::check(&manifest)?;
            println!(
                "✓ {} is valid: {} channel(s), {} conda and {} pip dependencies",
                manifest.display(),
                env.channels().len(),
                env.conda_dependencies().len(),
                env.pip_dependencies().len()
            );
        }
        EnvCommands::Merge {
            manifests,
            output,
            name,
        } => {
            let merged = environment::merge(&manifests, name.as_deref())?;
            merged.write_to_path(&output).map_err(EngineError::from)?;
            info!("Merged manifest written to {:?}", &output);
            println!(
                "✓ Merged {} manifests into {}",
                manifests.len(),
                output.display()
            );
        }
        EnvCommands::Audit {
            manifest,
            installed,
            format,
        } => {
            let report = environment::audit(&manifest, &installed, format.into())?;
            print_audit(&report);
            if !report.is_clean() {
                return Err(CliError::AuditFailed {
                    missing: report.missing.len(),
                    unsatisfied: report.unsatisfied.len(),
                });
            }
        }
    }
    Ok(())
}

fn print_audit(report: &EnvironmentAudit) {
    if report.is_clean() {
        println!("✓ Every declared dependency is installed and satisfied.");
        return;
    }
    for spec in &report.missing {
        println!("  missing: {}", spec);
    }
    for entry in &report.unsatisfied {
        println!(
            "  unsatisfied: {} (installed {})",
            entry.specifier,
            entry.installed.as_str()
        );
    }
}
