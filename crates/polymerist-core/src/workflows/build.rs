use crate::core::io::pdb::{PdbFile, PdbMetadata};
use crate::core::monomers::group::MonomerGroup;
use crate::engine::building::{BuiltPolymer, build_linear_polymer_with_progress};
use crate::engine::config::BuildConfig;
use crate::engine::error::EngineError;
use crate::engine::estimation::estimate_chain_len_linear;
use crate::engine::progress::{Progress, ProgressReporter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub polymer: BuiltPolymer,
    /// Atom count predicted before building, with ends capped and bracket
    /// hydrogens expanded.
    pub estimated_atoms: usize,
    pub output_path: Option<PathBuf>,
}

#[instrument(skip_all, name = "build_workflow")]
pub fn run(config: &BuildConfig, reporter: &ProgressReporter) -> Result<BuildResult, EngineError> {
    // === Phase 1: Load and inspect monomers ===
    let group = reporter.phase("Loading monomers", || {
        MonomerGroup::from_path(&config.monomers_path)
    })?;
    let (n_middle, n_terminal) = group.num_mid_and_term();
    info!(
        path = %config.monomers_path.display(),
        n_middle,
        n_terminal,
        homopolymer = group.is_homopolymer(),
        "Loaded monomer group"
    );

    let polymer_config = &config.polymer;
    let estimated_atoms = estimate_chain_len_linear(
        &group,
        polymer_config.degree_of_polymerization,
        &polymer_config.sequence,
    )?;

    // === Phase 2: Assemble the chain ===
    let polymer = reporter.phase("Building chain", || {
        build_linear_polymer_with_progress(&group, polymer_config, reporter)
    })?;
    let fully_hydrogenated = polymer_config.add_hydrogens && polymer_config.expand_hydrogens;
    if fully_hydrogenated && polymer.atom_count() != estimated_atoms {
        warn!(
            built = polymer.atom_count(),
            estimated = estimated_atoms,
            "Built chain size differs from the estimate"
        );
    }

    // === Phase 3: Write the structure ===
    if let Some(path) = &config.output_path {
        reporter.phase("Writing structure", || write_structure(&polymer, config, path))?;
        reporter.report(Progress::Message(format!(
            "Wrote {} atoms to {}",
            polymer.atom_count(),
            path.display()
        )));
        info!(path = %path.display(), "Wrote polymer structure");
    }

    Ok(BuildResult {
        polymer,
        estimated_atoms,
        output_path: config.output_path.clone(),
    })
}

fn write_structure(
    polymer: &BuiltPolymer,
    config: &BuildConfig,
    path: &Path,
) -> Result<(), EngineError> {
    let io_error = |source| EngineError::Io {
        path: path.display().to_string(),
        source,
    };
    let metadata = PdbMetadata {
        title: Some(format!(
            "Linear polymer, {} units ({})",
            polymer.n_residues(),
            config.polymer.sequence
        )),
        remarks: vec!["Generated by polymerist".to_string()],
        ..Default::default()
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    PdbFile::write_with_options(&polymer.system, &metadata, &config.output, &mut writer)?;
    writer.flush().map_err(io_error)?;
    Ok(())
}
