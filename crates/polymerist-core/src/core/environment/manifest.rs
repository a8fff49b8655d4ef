use super::specifier::{DependencySource, DependencySpecifier, SpecifierError, normalize_pip_name};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid {source_kind} dependency '{entry}': {source}")]
    Specifier {
        entry: String,
        source_kind: DependencySource,
        source: SpecifierError,
    },
    #[error("Manifest declares more than one 'pip' dependency section")]
    MultiplePipSections,
    #[error("Dependency '{name}' is listed more than once among {source_kind} dependencies")]
    DuplicateDependency {
        name: String,
        source_kind: DependencySource,
    },
    #[error("Dependency '{name}' is a {found} specifier listed among {expected} dependencies")]
    MisplacedDependency {
        name: String,
        expected: DependencySource,
        found: DependencySource,
    },
    #[error("Channel names must be non-empty")]
    EmptyChannel,
    #[error("Channel '{0}' is listed more than once")]
    DuplicateChannel(String),
    #[error("Conflicting exact pins for '{name}': {left} vs {right}")]
    ConflictingPins {
        name: String,
        left: String,
        right: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    channels: Vec<String>,
    #[serde(default)]
    dependencies: Vec<RawDependency>,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    variables: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum RawDependency {
    Conda(String),
    Pip { pip: Vec<String> },
}

#[derive(Debug, Serialize)]
struct ManifestLayout<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    channels: Vec<String>,
    dependencies: Vec<RawDependency>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    variables: IndexMap<String, serde_yaml::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<&'a str>,
}

/// A conda environment manifest: name, channels and conda/pip dependency lists.
///
/// Values are validated on construction and are not mutated afterwards;
/// [`Environment::union`] produces a new manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    name: Option<String>,
    channels: Vec<String>,
    conda: Vec<DependencySpecifier>,
    pip: Vec<DependencySpecifier>,
    prefix: Option<String>,
    variables: IndexMap<String, serde_yaml::Value>,
}

impl Environment {
    pub fn new(
        name: Option<String>,
        channels: Vec<String>,
        conda: Vec<DependencySpecifier>,
        pip: Vec<DependencySpecifier>,
    ) -> Result<Self, ManifestError> {
        let env = Self {
            name,
            channels,
            conda,
            pip,
            prefix: None,
            variables: IndexMap::new(),
        };
        env.validate()?;
        Ok(env)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_yaml::from_str(content)?;

        let mut conda = Vec::new();
        let mut pip_section: Option<Vec<String>> = None;
        for dep in raw.dependencies {
            match dep {
                RawDependency::Conda(entry) => conda.push(parse_entry(&entry, DependencySource::Conda)?),
                RawDependency::Pip { pip } => {
                    if pip_section.replace(pip).is_some() {
                        return Err(ManifestError::MultiplePipSections);
                    }
                }
            }
        }
        let pip = pip_section
            .unwrap_or_default()
            .iter()
            .map(|entry| parse_entry(entry, DependencySource::Pip))
            .collect::<Result<Vec<_>, _>>()?;

        let env = Self {
            name: raw.name.filter(|n| !n.trim().is_empty()),
            channels: raw.channels,
            conda,
            pip,
            prefix: raw.prefix,
            variables: raw.variables,
        };
        env.validate()?;
        debug!(
            name = env.name.as_deref().unwrap_or("<unnamed>"),
            conda = env.conda.len(),
            pip = env.pip.len(),
            "Loaded environment manifest"
        );
        Ok(env)
    }

    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen_channels = HashSet::new();
        for channel in &self.channels {
            let channel = channel.trim();
            if channel.is_empty() {
                return Err(ManifestError::EmptyChannel);
            }
            if !seen_channels.insert(channel) {
                return Err(ManifestError::DuplicateChannel(channel.to_string()));
            }
        }

        for (deps, source) in [
            (&self.conda, DependencySource::Conda),
            (&self.pip, DependencySource::Pip),
        ] {
            let mut seen = HashSet::new();
            for dep in deps {
                if dep.name.trim().is_empty() {
                    return Err(ManifestError::Specifier {
                        entry: dep.to_string(),
                        source_kind: source,
                        source: SpecifierError::MissingName(dep.to_string()),
                    });
                }
                if dep.source != source {
                    return Err(ManifestError::MisplacedDependency {
                        name: dep.name.clone(),
                        expected: source,
                        found: dep.source,
                    });
                }
                if !seen.insert(dep.normalized_name()) {
                    return Err(ManifestError::DuplicateDependency {
                        name: dep.name.clone(),
                        source_kind: source,
                    });
                }
            }
        }

        if !self.pip.is_empty() && !self.conda.iter().any(|d| d.normalized_name() == "pip") {
            warn!("Manifest declares pip dependencies but does not list 'pip' among its conda dependencies");
        }
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn conda_dependencies(&self) -> &[DependencySpecifier] {
        &self.conda
    }

    pub fn pip_dependencies(&self) -> &[DependencySpecifier] {
        &self.pip
    }

    /// All dependencies, conda first then pip.
    pub fn iter_dependencies(&self) -> impl Iterator<Item = &DependencySpecifier> {
        self.conda.iter().chain(self.pip.iter())
    }

    /// Looks a dependency up by name, checking conda entries before pip ones.
    pub fn dependency(&self, name: &str) -> Option<&DependencySpecifier> {
        let conda_name = name.trim().to_lowercase();
        let pip_name = normalize_pip_name(name);
        self.conda
            .iter()
            .find(|d| d.normalized_name() == conda_name)
            .or_else(|| self.pip.iter().find(|d| d.normalized_name() == pip_name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependency(name).is_some()
    }

    /// Returns a copy renamed to `name`.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self.clone()
        }
    }

    /// Combines two manifests. Channels keep first-occurrence order; dependencies
    /// with the same normalized name have their constraints conjoined.
    pub fn union(&self, other: &Environment) -> Result<Environment, ManifestError> {
        let channels: IndexSet<String> = self
            .channels
            .iter()
            .chain(other.channels.iter())
            .cloned()
            .collect();

        let mut variables = self.variables.clone();
        for (key, value) in &other.variables {
            variables.entry(key.clone()).or_insert_with(|| value.clone());
        }

        let merged = Self {
            name: self.name.clone().or_else(|| other.name.clone()),
            channels: channels.into_iter().collect(),
            conda: merge_dependencies(&self.conda, &other.conda)?,
            pip: merge_dependencies(&self.pip, &other.pip)?,
            prefix: self.prefix.clone().or_else(|| other.prefix.clone()),
            variables,
        };
        merged.validate()?;
        Ok(merged)
    }

    pub fn to_yaml_string(&self) -> Result<String, ManifestError> {
        let mut dependencies: Vec<RawDependency> = self
            .conda
            .iter()
            .map(|d| RawDependency::Conda(d.to_string()))
            .collect();
        if !self.pip.is_empty() {
            dependencies.push(RawDependency::Pip {
                pip: self.pip.iter().map(|d| d.to_string()).collect(),
            });
        }

        let layout = ManifestLayout {
            name: self.name.as_deref(),
            channels: self.channels.clone(),
            dependencies,
            variables: self.variables.clone(),
            prefix: self.prefix.as_deref(),
        };
        Ok(serde_yaml::to_string(&layout)?)
    }

    pub fn write_to_path(&self, path: &Path) -> Result<(), ManifestError> {
        let content = self.to_yaml_string()?;
        std::fs::write(path, content).map_err(|e| ManifestError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}

fn parse_entry(entry: &str, source: DependencySource) -> Result<DependencySpecifier, ManifestError> {
    DependencySpecifier::parse(entry, source).map_err(|e| ManifestError::Specifier {
        entry: entry.to_string(),
        source_kind: source,
        source: e,
    })
}

fn merge_dependencies(
    left: &[DependencySpecifier],
    right: &[DependencySpecifier],
) -> Result<Vec<DependencySpecifier>, ManifestError> {
    let mut merged: IndexMap<String, DependencySpecifier> = IndexMap::new();
    for dep in left.iter().chain(right.iter()) {
        match merged.get_mut(&dep.normalized_name()) {
            None => {
                merged.insert(dep.normalized_name(), dep.clone());
            }
            Some(existing) => {
                let constraint = existing.constraint.conjoin(&dep.constraint);
                if let [first, second, ..] = constraint.exact_pins().as_slice() {
                    return Err(ManifestError::ConflictingPins {
                        name: existing.name.clone(),
                        left: first.to_string(),
                        right: second.to_string(),
                    });
                }
                existing.constraint = constraint;
                existing.channel = existing.channel.take().or_else(|| dep.channel.clone());
                existing.build = existing.build.take().or_else(|| dep.build.clone());
                existing.marker = existing.marker.take().or_else(|| dep.marker.clone());
                existing.url = existing.url.take().or_else(|| dep.url.clone());
                for extra in &dep.extras {
                    if !existing.extras.contains(extra) {
                        existing.extras.push(extra.clone());
                    }
                }
            }
        }
    }
    Ok(merged.into_values().collect())
}
