use crate::core::environment::prerequisites;
use crate::core::environment::{Environment, EnvironmentAudit, InstalledFormat, InstalledPackages};
use crate::engine::config::ConfigError;
use crate::engine::error::EngineError;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Loads and validates a single manifest.
#[instrument(skip_all, name = "environment_check", fields(path = %path.display()))]
pub fn check(path: &Path) -> Result<Environment, EngineError> {
    let environment = Environment::from_path(path)?;
    info!(
        name = environment.name().unwrap_or("<unnamed>"),
        channels = environment.channels().len(),
        conda = environment.conda_dependencies().len(),
        pip = environment.pip_dependencies().len(),
        "Manifest is valid"
    );
    Ok(environment)
}

/// Unions every manifest in order, optionally renaming the result.
///
/// The first manifest's name is kept unless `name` is given.
#[instrument(skip_all, name = "environment_merge", fields(n_manifests = paths.len()))]
pub fn merge(paths: &[PathBuf], name: Option<&str>) -> Result<Environment, EngineError> {
    let (first, rest) = paths
        .split_first()
        .ok_or(ConfigError::MissingParameter("manifests"))?;

    let mut merged = check(first)?;
    for path in rest {
        merged = merged.union(&check(path)?)?;
    }
    if let Some(name) = name {
        merged = merged.with_name(name);
    }
    info!(
        name = merged.name().unwrap_or("<unnamed>"),
        dependencies = merged.iter_dependencies().count(),
        "Merged manifests"
    );
    Ok(merged)
}

/// Compares a manifest with an installer listing (`conda list --export` or
/// `pip freeze` output).
///
/// A `pip freeze` listing only covers the manifest's pip dependencies.
#[instrument(skip_all, name = "environment_audit")]
pub fn audit(
    manifest: &Path,
    installed: &Path,
    format: InstalledFormat,
) -> Result<EnvironmentAudit, EngineError> {
    let environment = check(manifest)?;
    let listing = std::fs::read_to_string(installed).map_err(|source| EngineError::Io {
        path: installed.display().to_string(),
        source,
    })?;
    let packages = InstalledPackages::parse(&listing, format);
    if packages.is_empty() {
        warn!(path = %installed.display(), "Installed package listing is empty");
    }

    let skipped = environment
        .iter_dependencies()
        .filter(|spec| !format.lists(spec.source))
        .count();
    if skipped > 0 {
        info!(skipped, "Listing format does not cover conda dependencies; skipping them");
    }
    let report = prerequisites::audit_where(&environment, &packages, |spec| format.lists(spec.source));
    info!(
        installed = packages.len(),
        missing = report.missing.len(),
        unsatisfied = report.unsatisfied.len(),
        "Audited environment"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BASE: &str = "\
name: polymers
channels:
  - conda-forge
dependencies:
  - python=3.11
  - numpy>=1.24
";

    const EXTRA: &str = "\
name: extras
channels:
  - conda-forge
  - openeye
dependencies:
  - numpy
  - pip
  - pip:
      - mbuild>=0.17
";

    fn write(dir: &Path, file: &str, content: &str) -> PathBuf {
        let path = dir.join(file);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn check_reports_invalid_manifests() {
        let dir = tempdir().unwrap();
        let good = write(dir.path(), "good.yml", BASE);
        assert_eq!(check(&good).unwrap().name(), Some("polymers"));

        let bad = write(dir.path(), "bad.yml", "dependencies:\n  - numpy\n  - numpy\n");
        assert!(matches!(check(&bad), Err(EngineError::Manifest { .. })));
    }

    #[test]
    fn merge_keeps_first_name_unless_overridden() {
        let dir = tempdir().unwrap();
        let paths = vec![
            write(dir.path(), "base.yml", BASE),
            write(dir.path(), "extra.yml", EXTRA),
        ];

        let merged = merge(&paths, None).unwrap();
        assert_eq!(merged.name(), Some("polymers"));
        assert_eq!(merged.channels(), ["conda-forge", "openeye"]);
        assert!(merged.contains("mbuild"));

        let renamed = merge(&paths, Some("combined")).unwrap();
        assert_eq!(renamed.name(), Some("combined"));
    }

    #[test]
    fn merge_needs_at_least_one_manifest() {
        assert!(matches!(
            merge(&[], None),
            Err(EngineError::Config {
                source: ConfigError::MissingParameter("manifests")
            })
        ));
    }

    #[test]
    fn audit_flags_missing_and_outdated_packages() {
        let dir = tempdir().unwrap();
        let manifest = write(dir.path(), "env.yml", BASE);
        let listing = write(
            dir.path(),
            "installed.txt",
            "python=3.10.4=h12debd9_0\nnumpy=1.26.4=py311h64a7726_0\n",
        );

        let report = audit(&manifest, &listing, InstalledFormat::CondaExport).unwrap();
        assert!(report.missing.is_empty());
        assert_eq!(report.unsatisfied.len(), 1);
        assert_eq!(report.unsatisfied[0].specifier.name, "python");

        let empty = write(dir.path(), "empty.txt", "");
        let report = audit(&manifest, &empty, InstalledFormat::CondaExport).unwrap();
        assert_eq!(report.missing.len(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn pip_freeze_audit_ignores_conda_dependencies() {
        let dir = tempdir().unwrap();
        let manifest = write(dir.path(), "env.yml", EXTRA);
        let freeze = write(dir.path(), "freeze.txt", "mbuild==0.17.1\nnumpy==1.26.4\n");

        let report = audit(&manifest, &freeze, InstalledFormat::PipFreeze).unwrap();
        assert!(report.is_clean());

        let outdated = write(dir.path(), "old.txt", "mbuild==0.16.4\n");
        let report = audit(&manifest, &outdated, InstalledFormat::PipFreeze).unwrap();
        assert!(report.missing.is_empty());
        assert_eq!(report.unsatisfied.len(), 1);
        assert_eq!(report.unsatisfied[0].specifier.name, "mbuild");
    }
}
