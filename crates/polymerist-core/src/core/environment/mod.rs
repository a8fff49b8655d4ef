//! Conda environment manifests, dependency specifiers, and checks of declared
//! or installed package sets against what a workflow requires.

pub mod manifest;
pub mod prerequisites;
pub mod specifier;

pub use manifest::{Environment, ManifestError};
pub use prerequisites::{
    EnvironmentAudit, InstalledFormat, InstalledPackages, MissingPrerequisitePackage,
    PackageRegistry, PrerequisiteError, audit, audit_where, requires_packages, requires_packages_or,
};
pub use specifier::{
    ConstraintKind, DependencySource, DependencySpecifier, SpecifierError, Version,
    VersionConstraint,
};
