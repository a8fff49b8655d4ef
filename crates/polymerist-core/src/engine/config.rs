use crate::analysis::properties::PropertyKind;
use crate::analysis::rdf::{MAX_RDF_BINS, bin_count};
use crate::core::io::pdb::PdbWriteOptions;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SEQUENCE: &str = "A";
pub const DEFAULT_CHAIN_ID: char = 'A';
/// Distance in angstroms between the linker atoms of adjacent residues.
pub const DEFAULT_MONOMER_SPACING: f64 = 1.5;
pub const DEFAULT_RDF_BIN_WIDTH: f64 = 0.005;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearBuildConfig {
    /// End groups plus the number of times the sequence block is repeated.
    /// Equals the residue count for single-character sequences.
    pub degree_of_polymerization: usize,
    /// Block sequence of middle monomers, one character per distinct monomer.
    pub sequence: String,
    /// Cap ports left open at the chain ends with hydrogen.
    pub add_hydrogens: bool,
    /// Expand bracket hydrogen counts (`[CH2]`) into explicit atoms.
    pub expand_hydrogens: bool,
    pub chain_id: char,
    pub monomer_spacing: f64,
}

#[derive(Default)]
pub struct LinearBuildConfigBuilder {
    degree_of_polymerization: Option<usize>,
    sequence: Option<String>,
    add_hydrogens: Option<bool>,
    expand_hydrogens: Option<bool>,
    chain_id: Option<char>,
    monomer_spacing: Option<f64>,
}

impl LinearBuildConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn degree_of_polymerization(mut self, dop: usize) -> Self {
        self.degree_of_polymerization = Some(dop);
        self
    }
    pub fn sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }
    pub fn add_hydrogens(mut self, add: bool) -> Self {
        self.add_hydrogens = Some(add);
        self
    }
    pub fn expand_hydrogens(mut self, expand: bool) -> Self {
        self.expand_hydrogens = Some(expand);
        self
    }
    pub fn chain_id(mut self, id: char) -> Self {
        self.chain_id = Some(id);
        self
    }
    pub fn monomer_spacing(mut self, spacing: f64) -> Self {
        self.monomer_spacing = Some(spacing);
        self
    }

    pub fn build(self) -> Result<LinearBuildConfig, ConfigError> {
        let degree_of_polymerization = self
            .degree_of_polymerization
            .ok_or(ConfigError::MissingParameter("degree_of_polymerization"))?;
        if degree_of_polymerization < 2 {
            return Err(invalid(
                "degree_of_polymerization",
                format!("a linear chain needs at least 2 units, got {degree_of_polymerization}"),
            ));
        }

        let sequence = self
            .sequence
            .unwrap_or_else(|| DEFAULT_SEQUENCE.to_string());
        if sequence.is_empty() {
            return Err(invalid("sequence", "must name at least one monomer"));
        }

        let monomer_spacing = self.monomer_spacing.unwrap_or(DEFAULT_MONOMER_SPACING);
        if !(monomer_spacing.is_finite() && monomer_spacing > 0.0) {
            return Err(invalid(
                "monomer_spacing",
                format!("must be a positive distance, got {monomer_spacing}"),
            ));
        }

        Ok(LinearBuildConfig {
            degree_of_polymerization,
            sequence,
            add_hydrogens: self.add_hydrogens.unwrap_or(false),
            expand_hydrogens: self.expand_hydrogens.unwrap_or(false),
            chain_id: self.chain_id.unwrap_or(DEFAULT_CHAIN_ID),
            monomer_spacing,
        })
    }
}

/// Inputs and outputs of a complete build run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub monomers_path: PathBuf,
    /// When unset the built system is returned without being written.
    pub output_path: Option<PathBuf>,
    pub polymer: LinearBuildConfig,
    pub output: PdbWriteOptions,
}

#[derive(Default)]
pub struct BuildConfigBuilder {
    monomers_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    polymer: Option<LinearBuildConfig>,
    output: Option<PdbWriteOptions>,
}

impl BuildConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn monomers_path(mut self, path: PathBuf) -> Self {
        self.monomers_path = Some(path);
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
    pub fn polymer(mut self, polymer: LinearBuildConfig) -> Self {
        self.polymer = Some(polymer);
        self
    }
    pub fn output(mut self, options: PdbWriteOptions) -> Self {
        self.output = Some(options);
        self
    }

    pub fn build(self) -> Result<BuildConfig, ConfigError> {
        Ok(BuildConfig {
            monomers_path: self
                .monomers_path
                .ok_or(ConfigError::MissingParameter("monomers_path"))?,
            output_path: self.output_path,
            polymer: self
                .polymer
                .ok_or(ConfigError::MissingParameter("polymer"))?,
            output: self.output.unwrap_or_default(),
        })
    }
}

/// Radial distribution function sampling, all distances in nanometers.
#[derive(Debug, Clone, PartialEq)]
pub struct RdfConfig {
    pub min_radius: f64,
    pub max_radius: f64,
    pub bin_width: f64,
}

impl Default for RdfConfig {
    fn default() -> Self {
        Self {
            min_radius: 0.0,
            max_radius: 1.0,
            bin_width: DEFAULT_RDF_BIN_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Time between consecutive trajectory frames, in nanoseconds.
    pub time_step: f64,
    pub properties: Vec<PropertyKind>,
    /// RDFs are skipped when unset.
    pub rdf: Option<RdfConfig>,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    time_step: Option<f64>,
    properties: Option<Vec<PropertyKind>>,
    rdf: Option<RdfConfig>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_step(mut self, time_step_ns: f64) -> Self {
        self.time_step = Some(time_step_ns);
        self
    }
    pub fn properties(mut self, properties: Vec<PropertyKind>) -> Self {
        self.properties = Some(properties);
        self
    }
    pub fn rdf(mut self, rdf: RdfConfig) -> Self {
        self.rdf = Some(rdf);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let time_step = self
            .time_step
            .ok_or(ConfigError::MissingParameter("time_step"))?;
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(invalid(
                "time_step",
                format!("must be a positive duration, got {time_step}"),
            ));
        }

        if let Some(rdf) = &self.rdf {
            if !(rdf.min_radius >= 0.0 && rdf.max_radius > rdf.min_radius) {
                return Err(invalid(
                    "rdf",
                    format!(
                        "radius range [{}, {}] is empty",
                        rdf.min_radius, rdf.max_radius
                    ),
                ));
            }
            if !(rdf.bin_width > 0.0) {
                return Err(invalid("rdf", "bin width must be positive"));
            }
            bin_count(rdf.min_radius, rdf.max_radius, rdf.bin_width).map_err(|_| {
                invalid(
                    "rdf",
                    format!(
                        "radii and bin width must be finite and give at most {MAX_RDF_BINS} bins"
                    ),
                )
            })?;
        }

        Ok(AnalysisConfig {
            time_step,
            properties: self
                .properties
                .unwrap_or_else(|| PropertyKind::DEFAULTS.to_vec()),
            rdf: self.rdf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_build_requires_dop_and_fills_defaults() {
        assert_eq!(
            LinearBuildConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("degree_of_polymerization"))
        );

        let config = LinearBuildConfigBuilder::new()
            .degree_of_polymerization(10)
            .build()
            .unwrap();
        assert_eq!(config.sequence, "A");
        assert_eq!(config.chain_id, 'A');
        assert!(!config.add_hydrogens);
        assert!(!config.expand_hydrogens);
        assert_eq!(config.monomer_spacing, DEFAULT_MONOMER_SPACING);
    }

    #[test]
    fn linear_build_rejects_short_chains_and_empty_sequences() {
        let short = LinearBuildConfigBuilder::new()
            .degree_of_polymerization(1)
            .build();
        assert!(matches!(
            short,
            Err(ConfigError::InvalidParameter {
                name: "degree_of_polymerization",
                ..
            })
        ));

        let empty = LinearBuildConfigBuilder::new()
            .degree_of_polymerization(4)
            .sequence("")
            .build();
        assert!(matches!(
            empty,
            Err(ConfigError::InvalidParameter { name: "sequence", .. })
        ));
    }

    #[test]
    fn build_config_requires_inputs() {
        assert_eq!(
            BuildConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("monomers_path"))
        );
        let polymer = LinearBuildConfigBuilder::new()
            .degree_of_polymerization(3)
            .build()
            .unwrap();
        let config = BuildConfigBuilder::new()
            .monomers_path("peg.json".into())
            .polymer(polymer)
            .build()
            .unwrap();
        assert!(config.output_path.is_none());
        assert_eq!(config.output, PdbWriteOptions::default());
    }

    #[test]
    fn analysis_requires_time_step_and_validates_rdf_range() {
        assert_eq!(
            AnalysisConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("time_step"))
        );

        let config = AnalysisConfigBuilder::new().time_step(0.5).build().unwrap();
        assert_eq!(config.properties, PropertyKind::DEFAULTS.to_vec());
        assert!(config.rdf.is_none());

        let inverted = AnalysisConfigBuilder::new()
            .time_step(0.5)
            .rdf(RdfConfig {
                min_radius: 1.0,
                max_radius: 0.5,
                bin_width: 0.01,
            })
            .build();
        assert!(matches!(
            inverted,
            Err(ConfigError::InvalidParameter { name: "rdf", .. })
        ));

        for rdf in [
            RdfConfig {
                max_radius: f64::INFINITY,
                ..RdfConfig::default()
            },
            RdfConfig {
                bin_width: 1e-12,
                ..RdfConfig::default()
            },
        ] {
            let unbounded = AnalysisConfigBuilder::new().time_step(0.5).rdf(rdf).build();
            assert!(matches!(
                unbounded,
                Err(ConfigError::InvalidParameter { name: "rdf", .. })
            ));
        }
    }
}
