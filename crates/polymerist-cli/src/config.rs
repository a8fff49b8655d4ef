use crate::cli::{AnalyzeArgs, BuildArgs};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use indexmap::IndexMap;
use polymerist::analysis::properties::PropertyKind;
use polymerist::core::io::pdb::PdbWriteOptions;
use polymerist::engine::config as core_config;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

fn load_toml<T: for<'de> Deserialize<'de> + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    debug!("Loading configuration from file: {:?}", path);
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!(
        "Unsupported configuration key for --set: '{}'",
        key
    ))
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialPolymerConfig {
    #[serde(alias = "dop")]
    degree_of_polymerization: Option<usize>,
    sequence: Option<String>,
    add_hydrogens: Option<bool>,
    expand_hydrogens: Option<bool>,
    chain_id: Option<char>,
    monomer_spacing: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialOutputConfig {
    uniquify_atom_names: Option<bool>,
    num_atom_digits: Option<usize>,
    write_conect: Option<bool>,
    residue_names: Option<IndexMap<String, String>>,
}

impl PartialOutputConfig {
    fn into_options(self) -> PdbWriteOptions {
        let defaults = PdbWriteOptions::default();
        PdbWriteOptions {
            uniquify_atom_names: self
                .uniquify_atom_names
                .unwrap_or(defaults.uniquify_atom_names),
            num_atom_digits: self.num_atom_digits.unwrap_or(defaults.num_atom_digits),
            residue_name_map: self.residue_names.unwrap_or(defaults.residue_name_map),
            write_conect: self.write_conect.unwrap_or(defaults.write_conect),
        }
    }
}

/// Build settings as read from a TOML file, before CLI overrides.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialBuildConfig {
    polymer: Option<PartialPolymerConfig>,
    output: Option<PartialOutputConfig>,
}

impl PartialBuildConfig {
    pub fn from_file(path: Option<&Path>) -> Result<Self> {
        load_toml(path)
    }

    /// Layers defaults < file < `-S` assignments < explicit flags.
    pub fn merge_with_cli(mut self, args: &BuildArgs) -> Result<core_config::BuildConfig> {
        self.apply_set_values(&args.set_values)?;

        let polymer = self.polymer.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();

        let mut polymer_builder = core_config::LinearBuildConfigBuilder::new()
            .sequence(
                args.sequence
                    .clone()
                    .or(polymer.sequence)
                    .unwrap_or_else(|| core_config::DEFAULT_SEQUENCE.to_string()),
            )
            .add_hydrogens(args.add_hydrogens || polymer.add_hydrogens.unwrap_or(false))
            .expand_hydrogens(args.expand_hydrogens || polymer.expand_hydrogens.unwrap_or(false))
            .chain_id(polymer.chain_id.unwrap_or(core_config::DEFAULT_CHAIN_ID))
            .monomer_spacing(
                polymer
                    .monomer_spacing
                    .unwrap_or(core_config::DEFAULT_MONOMER_SPACING),
            );
        if let Some(dop) = args
            .degree_of_polymerization
            .or(polymer.degree_of_polymerization)
        {
            polymer_builder = polymer_builder.degree_of_polymerization(dop);
        }
        let polymer_config = polymer_builder
            .build()
            .map_err(|e| CliError::Config(format!("{e} (set `polymer.dop` or pass --dop)")))?;

        core_config::BuildConfigBuilder::new()
            .monomers_path(args.monomers.clone())
            .output_path(args.output.clone())
            .polymer(polymer_config)
            .output(output.into_options())
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for assignment in set_values {
            let (key, value) = parser::parse_assignment(assignment)?;
            match key {
                "polymer.dop" | "polymer.degree-of-polymerization" => {
                    self.polymer_mut().degree_of_polymerization =
                        Some(parser::parse_value(key, value, "integer")?);
                }
                "polymer.sequence" => {
                    self.polymer_mut().sequence = Some(value.to_string());
                }
                "polymer.add-hydrogens" => {
                    self.polymer_mut().add_hydrogens =
                        Some(parser::parse_value(key, value, "boolean")?);
                }
                "polymer.expand-hydrogens" => {
                    self.polymer_mut().expand_hydrogens =
                        Some(parser::parse_value(key, value, "boolean")?);
                }
                "polymer.chain-id" => {
                    self.polymer_mut().chain_id =
                        Some(parser::parse_value(key, value, "character")?);
                }
                "polymer.monomer-spacing" => {
                    self.polymer_mut().monomer_spacing =
                        Some(parser::parse_value(key, value, "float")?);
                }
                "output.uniquify-atom-names" => {
                    self.output_mut().uniquify_atom_names =
                        Some(parser::parse_value(key, value, "boolean")?);
                }
                "output.num-atom-digits" => {
                    self.output_mut().num_atom_digits =
                        Some(parser::parse_value(key, value, "integer")?);
                }
                "output.write-conect" => {
                    self.output_mut().write_conect =
                        Some(parser::parse_value(key, value, "boolean")?);
                }
                _ => match key.strip_prefix("output.residue-names.") {
                    Some(residue) if !residue.is_empty() => {
                        self.output_mut()
                            .residue_names
                            .get_or_insert_with(|| PdbWriteOptions::default().residue_name_map)
                            .insert(residue.to_string(), value.to_string());
                    }
                    _ => return Err(unsupported_key(key)),
                },
            }
        }
        Ok(())
    }

    fn polymer_mut(&mut self) -> &mut PartialPolymerConfig {
        self.polymer.get_or_insert_with(Default::default)
    }

    fn output_mut(&mut self) -> &mut PartialOutputConfig {
        self.output.get_or_insert_with(Default::default)
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialRdfConfig {
    min_radius: Option<f64>,
    max_radius: Option<f64>,
    bin_width: Option<f64>,
}

impl PartialRdfConfig {
    fn into_config(self) -> core_config::RdfConfig {
        let defaults = core_config::RdfConfig::default();
        core_config::RdfConfig {
            min_radius: self.min_radius.unwrap_or(defaults.min_radius),
            max_radius: self.max_radius.unwrap_or(defaults.max_radius),
            bin_width: self.bin_width.unwrap_or(defaults.bin_width),
        }
    }
}

/// Analysis settings as read from a TOML file, before CLI overrides.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialAnalysisConfig {
    time_step: Option<f64>,
    properties: Option<Vec<PropertyKind>>,
    rdf: Option<PartialRdfConfig>,
}

impl PartialAnalysisConfig {
    pub fn from_file(path: Option<&Path>) -> Result<Self> {
        load_toml(path)
    }

    /// RDFs are only configured when an RDF output path was requested.
    pub fn merge_with_cli(mut self, args: &AnalyzeArgs) -> Result<core_config::AnalysisConfig> {
        self.apply_set_values(&args.set_values)?;

        let mut builder = core_config::AnalysisConfigBuilder::new();
        if let Some(time_step) = args.time_step.or(self.time_step) {
            builder = builder.time_step(time_step);
        }
        if let Some(properties) = self.properties.take() {
            builder = builder.properties(properties);
        }
        if args.rdf_output.is_some() {
            builder = builder.rdf(self.rdf.take().unwrap_or_default().into_config());
        }
        builder
            .build()
            .map_err(|e| CliError::Config(format!("{e} (set `time-step` or pass --time-step)")))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for assignment in set_values {
            let (key, value) = parser::parse_assignment(assignment)?;
            match key {
                "time-step" => {
                    self.time_step = Some(parser::parse_value(key, value, "float")?);
                }
                "properties" => {
                    let properties: Vec<PropertyKind> = parser::parse_list(key, value, "property")?;
                    if properties.is_empty() {
                        return Err(ParseError::EmptyComponent {
                            component: "value",
                            assignment: assignment.clone(),
                        }
                        .into());
                    }
                    self.properties = Some(properties);
                }
                "rdf.min-radius" => {
                    self.rdf_mut().min_radius = Some(parser::parse_value(key, value, "float")?);
                }
                "rdf.max-radius" => {
                    self.rdf_mut().max_radius = Some(parser::parse_value(key, value, "float")?);
                }
                "rdf.bin-width" => {
                    self.rdf_mut().bin_width = Some(parser::parse_value(key, value, "float")?);
                }
                _ => return Err(unsupported_key(key)),
            }
        }
        Ok(())
    }

    fn rdf_mut(&mut self) -> &mut PartialRdfConfig {
        self.rdf.get_or_insert_with(Default::default)
    }
}
