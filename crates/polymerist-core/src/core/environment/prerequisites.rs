use super::manifest::Environment;
use super::specifier::{DependencySource, DependencySpecifier, Version, normalize_pip_name};
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Anything that can answer whether a package is present, and at which version.
pub trait PackageRegistry {
    /// `None` if the package is absent, `Some(None)` if present with an unknown version.
    fn installed_version(&self, name: &str) -> Option<Option<&Version>>;

    fn is_installed(&self, name: &str) -> bool {
        self.installed_version(name).is_some()
    }
}

impl PackageRegistry for Environment {
    fn installed_version(&self, name: &str) -> Option<Option<&Version>> {
        self.dependency(name).map(|_| None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstalledFormat {
    /// `conda list --export`: `name=version=build` per line.
    CondaExport,
    /// `pip freeze`: `name==version` per line.
    PipFreeze,
}

impl InstalledFormat {
    /// Whether a listing in this format reports packages from `source`.
    /// Conda exports include pip-installed packages; pip freeze never lists conda ones.
    pub fn lists(&self, source: DependencySource) -> bool {
        match self {
            Self::CondaExport => true,
            Self::PipFreeze => source == DependencySource::Pip,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: Option<Version>,
    pub build: Option<String>,
    pub source: DependencySource,
}

/// Packages reported as present by an installer listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstalledPackages {
    packages: IndexMap<String, InstalledPackage>,
}

impl InstalledPackages {
    pub fn parse(text: &str, format: InstalledFormat) -> Self {
        let mut installed = Self::default();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with('@') || line.starts_with('-') {
                continue;
            }
            let package = match format {
                InstalledFormat::CondaExport => parse_conda_export_line(line),
                InstalledFormat::PipFreeze => parse_pip_freeze_line(line),
            };
            match package {
                Some(package) => installed.insert(package),
                None => debug!(line, "Skipping unrecognized package listing line"),
            }
        }
        installed
    }

    pub fn from_conda_export(text: &str) -> Self {
        Self::parse(text, InstalledFormat::CondaExport)
    }

    pub fn from_pip_freeze(text: &str) -> Self {
        Self::parse(text, InstalledFormat::PipFreeze)
    }

    pub fn insert(&mut self, package: InstalledPackage) {
        self.packages.insert(normalize_pip_name(&package.name), package);
    }

    pub fn get(&self, name: &str) -> Option<&InstalledPackage> {
        self.packages.get(&normalize_pip_name(name))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.packages.values()
    }
}

impl PackageRegistry for InstalledPackages {
    fn installed_version(&self, name: &str) -> Option<Option<&Version>> {
        self.get(name).map(|p| p.version.as_ref())
    }
}

fn parse_conda_export_line(line: &str) -> Option<InstalledPackage> {
    let mut parts = line.split('=');
    let name = parts.next()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(InstalledPackage {
        name: name.to_string(),
        version: parts.next().and_then(Version::parse),
        build: parts.next().map(str::to_string).filter(|b| !b.is_empty()),
        source: DependencySource::Conda,
    })
}

fn parse_pip_freeze_line(line: &str) -> Option<InstalledPackage> {
    let (name, version) = match line.split_once("==") {
        Some((name, version)) => (name.trim(), Version::parse(version)),
        None => (line.split_once('@').map_or(line, |(n, _)| n).trim(), None),
    };
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(InstalledPackage {
        name: name.to_string(),
        version,
        build: None,
        source: DependencySource::Pip,
    })
}

pub fn package_installed<R: PackageRegistry + ?Sized>(registry: &R, name: &str) -> bool {
    registry.is_installed(name)
}

/// True only if every named package is present.
pub fn packages_installed<R, I, S>(registry: &R, names: I) -> bool
where
    R: PackageRegistry + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().all(|name| registry.is_installed(name.as_ref()))
}

/// Raised when an optional dependency is absent, with instructions for installing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPrerequisitePackage {
    pub importing_package: String,
    pub use_case: String,
    pub install_link: String,
    pub dependency_name: String,
    pub dependency_name_formal: String,
}

impl MissingPrerequisitePackage {
    pub fn new(
        importing_package: impl Into<String>,
        use_case: impl Into<String>,
        install_link: impl Into<String>,
        dependency_name: impl Into<String>,
        dependency_name_formal: Option<String>,
    ) -> Self {
        let dependency_name = dependency_name.into();
        Self {
            importing_package: importing_package.into(),
            use_case: use_case.into(),
            install_link: install_link.into(),
            dependency_name_formal: dependency_name_formal.unwrap_or_else(|| dependency_name.clone()),
            dependency_name,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

impl fmt::Display for MissingPrerequisitePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} require(s) {}, which was not found in the current environment",
            capitalize(&self.use_case),
            self.dependency_name_formal
        )?;
        writeln!(
            f,
            "Please install `{}` by following the installation instructions at {}",
            self.dependency_name, self.install_link
        )?;
        write!(f, "Then try importing from \"{}\" again", self.importing_package)
    }
}

impl std::error::Error for MissingPrerequisitePackage {}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrerequisiteError {
    #[error("No installation found for package \"{0}\"")]
    NotInstalled(String),
    #[error(transparent)]
    Missing(#[from] MissingPrerequisitePackage),
}

/// Runs `f` only if every named package is present, otherwise reports the first missing one.
pub fn requires_packages<R, T, F>(registry: &R, names: &[&str], f: F) -> Result<T, PrerequisiteError>
where
    R: PackageRegistry + ?Sized,
    F: FnOnce() -> T,
{
    requires_packages_or(
        registry,
        names,
        |missing| PrerequisiteError::NotInstalled(missing.to_string()),
        f,
    )
}

/// Like [`requires_packages`], but the first missing name is turned into an
/// error by `on_missing`.
pub fn requires_packages_or<R, T, E, M, F>(
    registry: &R,
    names: &[&str],
    on_missing: M,
    f: F,
) -> Result<T, E>
where
    R: PackageRegistry + ?Sized,
    M: FnOnce(&str) -> E,
    F: FnOnce() -> T,
{
    match names.iter().find(|name| !registry.is_installed(name)) {
        Some(missing) => {
            debug!(package = *missing, "Prerequisite package is not installed");
            Err(on_missing(missing))
        }
        None => Ok(f()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsatisfiedDependency {
    pub specifier: DependencySpecifier,
    pub installed: Version,
}

/// Outcome of comparing a manifest against what is actually installed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentAudit {
    pub missing: Vec<DependencySpecifier>,
    pub unsatisfied: Vec<UnsatisfiedDependency>,
}

impl EnvironmentAudit {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unsatisfied.is_empty()
    }
}

/// Packages installed without a known version are counted as satisfied.
pub fn audit<R: PackageRegistry + ?Sized>(environment: &Environment, installed: &R) -> EnvironmentAudit {
    audit_where(environment, installed, |_| true)
}

/// Audits only the specifiers accepted by `include`.
pub fn audit_where<R, P>(environment: &Environment, installed: &R, include: P) -> EnvironmentAudit
where
    R: PackageRegistry + ?Sized,
    P: Fn(&DependencySpecifier) -> bool,
{
    let mut report = EnvironmentAudit::default();
    for spec in environment.iter_dependencies().filter(|spec| include(spec)) {
        match installed.installed_version(&spec.name) {
            None => report.missing.push(spec.clone()),
            Some(Some(version)) if !spec.is_satisfied_by(version) => {
                report.unsatisfied.push(UnsatisfiedDependency {
                    specifier: spec.clone(),
                    installed: version.clone(),
                })
            }
            Some(_) => {}
        }
    }
    report
}
