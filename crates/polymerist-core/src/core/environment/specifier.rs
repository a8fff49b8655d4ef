use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecifierError {
    #[error("Dependency specifier is empty")]
    Empty,
    #[error("Dependency specifier '{0}' has no package name")]
    MissingName(String),
    #[error("Invalid version '{version}' in '{spec}'")]
    InvalidVersion { spec: String, version: String },
    #[error("Version clause '{clause}' in '{spec}' has no comparison operator")]
    MissingOperator { spec: String, clause: String },
    #[error("Unterminated extras list in '{0}'")]
    UnclosedExtras(String),
    #[error("Unsupported specifier syntax in '{spec}': {feature}")]
    Unsupported { spec: String, feature: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencySource {
    Conda,
    Pip,
}

impl fmt::Display for DependencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conda => write!(f, "conda"),
            Self::Pip => write!(f, "pip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Number(u64),
    Alpha(String),
}

impl Segment {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Alpha(a), Self::Alpha(b)) => a.cmp(b),
            (Self::Alpha(_), Self::Number(_)) => Ordering::Less,
            (Self::Number(_), Self::Alpha(_)) => Ordering::Greater,
        }
    }
}

const ZERO: Segment = Segment::Number(0);

/// A package version compared segment by segment.
///
/// Numeric runs compare numerically and sort above alphabetic runs, so
/// `1.0rc1 < 1.0 < 1.0.1`. Missing trailing segments count as zero, making
/// `1.2` and `1.2.0` equal. An optional `N!` epoch outranks every segment.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    epoch: u64,
    segments: Vec<Segment>,
}

impl Version {
    pub fn parse(s: &str) -> Option<Self> {
        let raw = s.trim();
        if raw.is_empty()
            || !raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+' | '!'))
        {
            return None;
        }

        let (epoch, body) = match raw.split_once('!') {
            Some((epoch, body)) => (epoch.parse().ok()?, body),
            None => (0, raw),
        };

        let mut segments = Vec::new();
        for part in body.split(['.', '-', '_', '+']) {
            let mut chars = part.chars().peekable();
            while let Some(&first) = chars.peek() {
                let numeric = first.is_ascii_digit();
                let mut run = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() != numeric {
                        break;
                    }
                    run.push(c);
                    chars.next();
                }
                segments.push(if numeric {
                    Segment::Number(run.parse().ok()?)
                } else {
                    Segment::Alpha(run.to_ascii_lowercase())
                });
            }
        }
        if segments.is_empty() {
            return None;
        }

        Some(Self {
            raw: raw.to_string(),
            epoch,
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn segment(&self, idx: usize) -> &Segment {
        self.segments.get(idx).unwrap_or(&ZERO)
    }

    /// True if the leading segments of `self` equal all segments of `prefix`.
    pub fn starts_with(&self, prefix: &Version) -> bool {
        self.epoch == prefix.epoch
            && (0..prefix.segments.len())
                .all(|i| self.segment(i).compare(prefix.segment(i)) == Ordering::Equal)
    }

    /// Upper bound implied by a compatible-release clause: `~=1.4.2` allows `1.4.*`.
    fn compatible_prefix(&self) -> Version {
        let keep = self.segments.len().saturating_sub(1).max(1);
        let segments: Vec<Segment> = self.segments[..keep].to_vec();
        let raw = segments
            .iter()
            .map(|s| match s {
                Segment::Number(n) => n.to_string(),
                Segment::Alpha(a) => a.clone(),
            })
            .collect::<Vec<_>>()
            .join(".");
        Version {
            raw,
            epoch: self.epoch,
            segments,
        }
    }
}

impl FromStr for Version {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s).ok_or_else(|| SpecifierError::InvalidVersion {
            spec: s.to_string(),
            version: s.to_string(),
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch.cmp(&other.epoch).then_with(|| {
            let len = self.segments.len().max(other.segments.len());
            (0..len)
                .map(|i| self.segment(i).compare(other.segment(i)))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Exact,
    /// `===`, arbitrary string equality.
    Identity,
    /// `!=`
    NotEqual,
    /// `>=`
    GreaterEqual,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `<`
    Less,
    /// `~=`
    Compatible,
    /// `1.2.*` in pip or `=1.2` in conda.
    Prefix,
    /// `!=1.2.*`
    NotPrefix,
}

impl Operator {
    fn symbol(&self) -> &'static str {
        match self {
            Self::Exact | Self::Prefix => "==",
            Self::Identity => "===",
            Self::NotEqual | Self::NotPrefix => "!=",
            Self::GreaterEqual => ">=",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::Less => "<",
            Self::Compatible => "~=",
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, Self::Prefix | Self::NotPrefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub operator: Operator,
    pub version: Version,
}

impl Clause {
    pub fn new(operator: Operator, version: Version) -> Self {
        Self { operator, version }
    }

    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        match self.operator {
            Operator::Exact => version == &self.version,
            Operator::Identity => version.as_str() == self.version.as_str(),
            Operator::NotEqual => version != &self.version,
            Operator::GreaterEqual => version >= &self.version,
            Operator::Greater => version > &self.version,
            Operator::LessEqual => version <= &self.version,
            Operator::Less => version < &self.version,
            Operator::Compatible => {
                version >= &self.version && version.starts_with(&self.version.compatible_prefix())
            }
            Operator::Prefix => version.starts_with(&self.version),
            Operator::NotPrefix => !version.starts_with(&self.version),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator.symbol(), self.version)?;
        if self.operator.is_wildcard() {
            write!(f, ".*")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Any,
    Exact,
    LowerBound,
    UpperBound,
    Range,
    Other,
}

/// A conjunction of version clauses. No clauses means any version is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionConstraint {
    clauses: Vec<Clause>,
}

impl VersionConstraint {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn from_clauses(clauses: Vec<Clause>) -> Self {
        let mut constraint = Self::default();
        for clause in clauses {
            constraint.push(clause);
        }
        constraint
    }

    fn push(&mut self, clause: Clause) {
        let duplicate = self.clauses.iter().any(|existing| {
            existing.operator == clause.operator
                && existing.version.as_str() == clause.version.as_str()
        });
        if !duplicate {
            self.clauses.push(clause);
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_any(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn kind(&self) -> ConstraintKind {
        use Operator::*;

        if self.clauses.is_empty() {
            return ConstraintKind::Any;
        }
        if self
            .clauses
            .iter()
            .all(|c| matches!(c.operator, Exact | Identity))
            && self.exact_pins().len() == 1
        {
            return ConstraintKind::Exact;
        }

        let lower = self
            .clauses
            .iter()
            .filter(|c| matches!(c.operator, GreaterEqual | Greater))
            .count();
        let upper = self
            .clauses
            .iter()
            .filter(|c| matches!(c.operator, LessEqual | Less))
            .count();
        let bounded = self
            .clauses
            .iter()
            .filter(|c| matches!(c.operator, Compatible | Prefix))
            .count();

        if lower + upper + bounded != self.clauses.len() {
            ConstraintKind::Other
        } else if bounded > 0 || (lower > 0 && upper > 0) {
            ConstraintKind::Range
        } else if lower > 0 {
            ConstraintKind::LowerBound
        } else {
            ConstraintKind::UpperBound
        }
    }

    /// Distinct versions pinned by `==`/`===` clauses.
    pub fn exact_pins(&self) -> Vec<&Version> {
        let mut pins: Vec<&Version> = Vec::new();
        for clause in &self.clauses {
            if matches!(clause.operator, Operator::Exact | Operator::Identity)
                && !pins.iter().any(|pin| *pin == &clause.version)
            {
                pins.push(&clause.version);
            }
        }
        pins
    }

    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        self.clauses.iter().all(|c| c.is_satisfied_by(version))
    }

    /// Both constraints must hold.
    pub fn conjoin(&self, other: &VersionConstraint) -> VersionConstraint {
        let mut merged = self.clone();
        for clause in &other.clauses {
            merged.push(clause.clone());
        }
        merged
    }

    fn single_prefix_or_exact(&self) -> Option<&Clause> {
        match self.clauses.as_slice() {
            [only] if matches!(only.operator, Operator::Prefix | Operator::Exact) => Some(only),
            _ => None,
        }
    }

    fn fmt_conda(&self) -> String {
        if let Some(clause) = self.single_prefix_or_exact() {
            return match clause.operator {
                Operator::Prefix => format!("={}", clause.version),
                _ => format!("=={}", clause.version),
            };
        }
        self.clauses
            .iter()
            .map(|c| match c.operator {
                Operator::Prefix => format!("{}.*", c.version),
                _ => c.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .clauses
            .iter()
            .map(Clause::to_string)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

/// A single manifest dependency entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpecifier {
    pub name: String,
    pub constraint: VersionConstraint,
    pub source: DependencySource,
    /// Conda `channel::name` prefix.
    pub channel: Option<String>,
    /// Conda `name=version=build` build string.
    pub build: Option<String>,
    /// Pip `name[extra,...]` extras.
    pub extras: Vec<String>,
    /// Pip environment marker after `;`.
    pub marker: Option<String>,
    /// Pip direct reference (`name @ url`) or VCS URL.
    pub url: Option<String>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// PEP 503 normalization: lowercase with runs of `-`, `_` and `.` collapsed to `-`.
pub fn normalize_pip_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
            }
            in_separator = true;
        } else {
            normalized.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    normalized
}

const OPERATORS: [(&str, Operator); 9] = [
    ("===", Operator::Identity),
    ("==", Operator::Exact),
    ("!=", Operator::NotEqual),
    ("<=", Operator::LessEqual),
    (">=", Operator::GreaterEqual),
    ("~=", Operator::Compatible),
    ("<", Operator::Less),
    (">", Operator::Greater),
    ("=", Operator::Prefix),
];

fn parse_version(spec: &str, text: &str) -> Result<Version, SpecifierError> {
    Version::parse(text).ok_or_else(|| SpecifierError::InvalidVersion {
        spec: spec.to_string(),
        version: text.to_string(),
    })
}

/// Parses one comma-separated clause list. A clause without an operator is a
/// prefix match when `bare_is_prefix` is set and an error otherwise.
fn parse_clauses(
    spec: &str,
    expr: &str,
    bare_is_prefix: bool,
) -> Result<VersionConstraint, SpecifierError> {
    let mut clauses = Vec::new();
    for piece in expr.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (mut operator, rest) = match OPERATORS.iter().find(|(sym, _)| piece.starts_with(sym)) {
            Some((sym, op)) => (*op, piece[sym.len()..].trim()),
            None if bare_is_prefix => (Operator::Prefix, piece),
            None => {
                return Err(SpecifierError::MissingOperator {
                    spec: spec.to_string(),
                    clause: piece.to_string(),
                });
            }
        };

        if rest == "*" {
            continue;
        }

        let mut text = rest;
        if let Some(stripped) = rest.strip_suffix(".*").or_else(|| rest.strip_suffix('*')) {
            text = stripped;
            operator = match operator {
                Operator::Exact | Operator::Prefix => Operator::Prefix,
                Operator::NotEqual => Operator::NotPrefix,
                _ => {
                    return Err(SpecifierError::InvalidVersion {
                        spec: spec.to_string(),
                        version: rest.to_string(),
                    });
                }
            };
        }
        clauses.push(Clause::new(operator, parse_version(spec, text)?));
    }
    Ok(VersionConstraint::from_clauses(clauses))
}

impl DependencySpecifier {
    fn bare(name: String, source: DependencySource) -> Self {
        Self {
            name,
            constraint: VersionConstraint::any(),
            source,
            channel: None,
            build: None,
            extras: Vec::new(),
            marker: None,
            url: None,
        }
    }

    /// Parses a conda MatchSpec entry such as `conda-forge::numpy>=1.24,<2`,
    /// `python=3.11`, `openmm==8.1.1` or `pkg=1.0=py311_0`.
    pub fn parse_conda(spec: &str) -> Result<Self, SpecifierError> {
        let text = spec.trim();
        if text.is_empty() {
            return Err(SpecifierError::Empty);
        }
        if text.contains('|') {
            return Err(SpecifierError::Unsupported {
                spec: text.to_string(),
                feature: "alternative ('|') version expressions",
            });
        }

        let (channel, rest) = match text.split_once("::") {
            Some((channel, rest)) => (Some(channel.trim().to_string()), rest.trim()),
            None => (None, text),
        };

        let name_len = rest.find(|c| !is_name_char(c)).unwrap_or(rest.len());
        let (name, tail) = rest.split_at(name_len);
        if name.is_empty() {
            return Err(SpecifierError::MissingName(text.to_string()));
        }
        let tail = tail.trim();

        let mut dep = Self::bare(name.to_string(), DependencySource::Conda);
        dep.channel = channel.filter(|c| !c.is_empty());

        if tail.is_empty() {
            return Ok(dep);
        }
        if tail.starts_with('[') {
            return Err(SpecifierError::Unsupported {
                spec: text.to_string(),
                feature: "bracketed match-spec keys",
            });
        }

        if let Some(after) = tail.strip_prefix('=').filter(|t| !t.starts_with('=')) {
            // `name=version[=build]`
            let (version, build) = split_conda_build(after);
            dep.constraint = parse_clauses(text, version, true)?;
            dep.build = build.map(str::to_string).filter(|b| !b.is_empty());
        } else if tail.starts_with(['<', '>', '!', '~', '=']) {
            let (expr, build) = match tail.split_once(char::is_whitespace) {
                Some((expr, build)) => (expr, Some(build.trim())),
                None => (tail, None),
            };
            dep.constraint = parse_clauses(text, expr, true)?;
            dep.build = build.map(str::to_string).filter(|b| !b.is_empty());
        } else {
            // Space separated `name version [build]`.
            let mut tokens = tail.split_whitespace();
            if let Some(version) = tokens.next() {
                dep.constraint = parse_clauses(text, version, true)?;
            }
            dep.build = tokens.next().map(str::to_string);
        }
        Ok(dep)
    }

    /// Parses a pip requirement line such as `mdtraj>=1.9`, `nglview[widgets]==3.0.*`,
    /// `pkg ; python_version < "3.12"` or `pkg @ https://example.org/pkg.whl`.
    pub fn parse_pip(spec: &str) -> Result<Self, SpecifierError> {
        let text = spec.trim();
        if text.is_empty() {
            return Err(SpecifierError::Empty);
        }
        if text.starts_with('-') {
            return Err(SpecifierError::Unsupported {
                spec: text.to_string(),
                feature: "pip command-line options",
            });
        }

        let (requirement, marker) = match text.split_once(';') {
            Some((req, marker)) => (req.trim(), Some(marker.trim().to_string())),
            None => (text, None),
        };

        if let Some(name) = vcs_egg_name(requirement) {
            let mut dep = Self::bare(name.to_string(), DependencySource::Pip);
            dep.url = Some(requirement.to_string());
            dep.marker = marker;
            return Ok(dep);
        }

        let name_len = requirement
            .find(|c| !is_name_char(c))
            .unwrap_or(requirement.len());
        let (name, mut tail) = requirement.split_at(name_len);
        if name.is_empty() {
            return Err(SpecifierError::MissingName(text.to_string()));
        }
        let mut dep = Self::bare(name.to_string(), DependencySource::Pip);
        dep.marker = marker.filter(|m| !m.is_empty());

        tail = tail.trim_start();
        if let Some(after) = tail.strip_prefix('[') {
            let (extras, rest) = after
                .split_once(']')
                .ok_or_else(|| SpecifierError::UnclosedExtras(text.to_string()))?;
            dep.extras = extras
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
            tail = rest.trim_start();
        }

        if let Some(url) = tail.strip_prefix('@') {
            dep.url = Some(url.trim().to_string());
            return Ok(dep);
        }

        let expr = tail
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(tail);
        dep.constraint = parse_clauses(text, expr, false)?;
        Ok(dep)
    }

    pub fn parse(spec: &str, source: DependencySource) -> Result<Self, SpecifierError> {
        match source {
            DependencySource::Conda => Self::parse_conda(spec),
            DependencySource::Pip => Self::parse_pip(spec),
        }
    }

    /// Name used for uniqueness checks: lowercase for conda, PEP 503 for pip.
    pub fn normalized_name(&self) -> String {
        match self.source {
            DependencySource::Conda => self.name.to_lowercase(),
            DependencySource::Pip => normalize_pip_name(&self.name),
        }
    }

    pub fn constraint_kind(&self) -> ConstraintKind {
        self.constraint.kind()
    }

    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        self.constraint.is_satisfied_by(version)
    }

    fn fmt_conda(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(channel) = &self.channel {
            write!(f, "{channel}::")?;
        }
        write!(f, "{}", self.name)?;
        match (&self.build, self.constraint.single_prefix_or_exact()) {
            (None, _) => write!(f, "{}", self.constraint.fmt_conda()),
            (Some(build), Some(clause)) if clause.operator == Operator::Prefix => {
                write!(f, "={}={}", clause.version, build)
            }
            (Some(build), None) if self.constraint.is_any() => write!(f, "=*={build}"),
            (Some(build), _) => write!(f, "{} {}", self.constraint.fmt_conda(), build),
        }
    }

    fn fmt_pip(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) if vcs_egg_name(url).is_some() => write!(f, "{url}")?,
            _ => {
                write!(f, "{}", self.name)?;
                if !self.extras.is_empty() {
                    write!(f, "[{}]", self.extras.join(","))?;
                }
                match &self.url {
                    Some(url) => write!(f, " @ {url}")?,
                    None => write!(f, "{}", self.constraint)?,
                }
            }
        }
        if let Some(marker) = &self.marker {
            write!(f, " ; {marker}")?;
        }
        Ok(())
    }
}

/// Splits `version[=build]` at the first `=` that is not part of an operator.
fn split_conda_build(text: &str) -> (&str, Option<&str>) {
    let bytes = text.as_bytes();
    let separator = (0..bytes.len()).find(|&i| {
        bytes[i] == b'='
            && i > 0
            && !matches!(bytes[i - 1], b'<' | b'>' | b'!' | b'~' | b'=')
            && bytes.get(i + 1) != Some(&b'=')
    });
    match separator {
        Some(i) => (&text[..i], Some(&text[i + 1..])),
        None => (text, None),
    }
}

/// Package name of a VCS requirement like `git+https://host/repo.git#egg=name`.
fn vcs_egg_name(requirement: &str) -> Option<&str> {
    let is_url = ["git+", "hg+", "svn+", "bzr+", "http://", "https://", "file:"]
        .iter()
        .any(|scheme| requirement.starts_with(scheme));
    if !is_url {
        return None;
    }
    let (_, fragment) = requirement.split_once("#egg=")?;
    let name = fragment.split(['&', ' ']).next()?;
    (!name.is_empty()).then_some(name)
}

impl fmt::Display for DependencySpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            DependencySource::Conda => self.fmt_conda(f),
            DependencySource::Pip => self.fmt_pip(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn versions_compare_segmentwise() {
        assert!(v("1.10") > v("1.9"));
        assert_eq!(v("1.2"), v("1.2.0"));
        assert!(v("1.0rc1") < v("1.0"));
        assert!(v("2024.03.1") > v("2023.09.6"));
        assert!(v("1!0.1") > v("9.9"));
        assert!(Version::parse("").is_none());
        assert!(Version::parse("1.0 beta").is_none());
    }

    #[test]
    fn parses_conda_prefix_pin() {
        let dep = DependencySpecifier::parse_conda("python=3.11").unwrap();
        assert_eq!(dep.name, "python");
        assert_eq!(dep.constraint_kind(), ConstraintKind::Range);
        assert!(dep.is_satisfied_by(&v("3.11.4")));
        assert!(!dep.is_satisfied_by(&v("3.12.0")));
        assert_eq!(dep.to_string(), "python=3.11");
    }

    #[test]
    fn parses_conda_exact_pin_and_build() {
        let exact = DependencySpecifier::parse_conda("openmm==8.1.1").unwrap();
        assert_eq!(exact.constraint_kind(), ConstraintKind::Exact);
        assert_eq!(exact.to_string(), "openmm==8.1.1");

        let built = DependencySpecifier::parse_conda("openff-toolkit=0.14.3=pyhd8ed1ab_0").unwrap();
        assert_eq!(built.build.as_deref(), Some("pyhd8ed1ab_0"));
        assert_eq!(built.to_string(), "openff-toolkit=0.14.3=pyhd8ed1ab_0");
    }

    #[test]
    fn exact_pin_with_build_survives_rewriting() {
        let dep = DependencySpecifier::parse_conda("openmm==8.1.1 py311_0").unwrap();
        assert_eq!(dep.constraint_kind(), ConstraintKind::Exact);
        assert_eq!(dep.to_string(), "openmm==8.1.1 py311_0");

        let reparsed = DependencySpecifier::parse_conda(&dep.to_string()).unwrap();
        assert_eq!(reparsed.constraint_kind(), ConstraintKind::Exact);
        assert_eq!(reparsed.build.as_deref(), Some("py311_0"));
        assert!(!reparsed.is_satisfied_by(&v("8.1.1.1")));
    }

    #[test]
    fn prefix_pin_accepts_trailing_operator_clauses() {
        let dep = DependencySpecifier::parse_conda("python=3.11,!=3.11.2").unwrap();
        assert_eq!(dep.constraint.clauses().len(), 2);
        assert!(dep.build.is_none());
        assert!(dep.is_satisfied_by(&v("3.11.4")));
        assert!(!dep.is_satisfied_by(&v("3.11.2")));

        let capped = DependencySpecifier::parse_conda("numpy=1.26,<=1.26.3=py311_0").unwrap();
        assert_eq!(capped.build.as_deref(), Some("py311_0"));
        assert!(!capped.is_satisfied_by(&v("1.26.4")));
    }

    #[test]
    fn parses_conda_channel_and_range() {
        let dep = DependencySpecifier::parse_conda("conda-forge::numpy>=1.24,<2").unwrap();
        assert_eq!(dep.channel.as_deref(), Some("conda-forge"));
        assert_eq!(dep.constraint_kind(), ConstraintKind::Range);
        assert!(dep.is_satisfied_by(&v("1.26.4")));
        assert!(!dep.is_satisfied_by(&v("2.0.0")));
        assert_eq!(dep.to_string(), "conda-forge::numpy>=1.24,<2");
    }

    #[test]
    fn parses_conda_space_separated_form() {
        let dep = DependencySpecifier::parse_conda("mdtraj 1.9 py311_0").unwrap();
        assert!(dep.is_satisfied_by(&v("1.9.9")));
        assert_eq!(dep.build.as_deref(), Some("py311_0"));
    }

    #[test]
    fn plain_conda_name_accepts_any_version() {
        let dep = DependencySpecifier::parse_conda("rdkit").unwrap();
        assert_eq!(dep.constraint_kind(), ConstraintKind::Any);
        assert_eq!(dep.to_string(), "rdkit");
    }

    #[test]
    fn parses_pip_extras_marker_and_wildcard() {
        let dep =
            DependencySpecifier::parse_pip("nglview[widgets]==3.0.* ; python_version < \"3.12\"")
                .unwrap();
        assert_eq!(dep.extras, vec!["widgets"]);
        assert_eq!(dep.marker.as_deref(), Some("python_version < \"3.12\""));
        assert!(dep.is_satisfied_by(&v("3.0.8")));
        assert_eq!(
            dep.to_string(),
            "nglview[widgets]==3.0.* ; python_version < \"3.12\""
        );
    }

    #[test]
    fn compatible_release_bounds_the_last_segment() {
        let dep = DependencySpecifier::parse_pip("espaloma~=0.3.2").unwrap();
        assert!(dep.is_satisfied_by(&v("0.3.9")));
        assert!(!dep.is_satisfied_by(&v("0.4.0")));
        assert!(!dep.is_satisfied_by(&v("0.3.1")));
    }

    #[test]
    fn parses_pip_direct_references() {
        let direct = DependencySpecifier::parse_pip("pkg @ https://example.org/pkg.whl").unwrap();
        assert_eq!(direct.url.as_deref(), Some("https://example.org/pkg.whl"));

        let vcs =
            DependencySpecifier::parse_pip("git+https://github.com/org/mbuild.git#egg=mbuild")
                .unwrap();
        assert_eq!(vcs.name, "mbuild");
        assert!(vcs.url.is_some());
    }

    #[test]
    fn pip_clauses_require_operators() {
        assert!(matches!(
            DependencySpecifier::parse_pip("numpy 1.2"),
            Err(SpecifierError::MissingOperator { .. })
        ));
        assert_eq!(DependencySpecifier::parse_pip("  "), Err(SpecifierError::Empty));
        assert!(matches!(
            DependencySpecifier::parse_pip("-r requirements.txt"),
            Err(SpecifierError::Unsupported { .. })
        ));
    }

    #[test]
    fn pip_names_normalize_per_pep_503() {
        assert_eq!(normalize_pip_name("OpenFF_Toolkit"), "openff-toolkit");
        assert_eq!(normalize_pip_name("a.-_b"), "a-b");
    }

    #[test]
    fn constraint_kinds_are_classified() {
        let kind = |s: &str| DependencySpecifier::parse_pip(s).unwrap().constraint_kind();
        assert_eq!(kind("a>=1"), ConstraintKind::LowerBound);
        assert_eq!(kind("a<2"), ConstraintKind::UpperBound);
        assert_eq!(kind("a>=1,<2"), ConstraintKind::Range);
        assert_eq!(kind("a!=1.5"), ConstraintKind::Other);
        assert_eq!(kind("a==1.5"), ConstraintKind::Exact);
    }

    #[test]
    fn conjoined_constraints_keep_both_sides() {
        let lower = DependencySpecifier::parse_pip("a>=1").unwrap().constraint;
        let upper = DependencySpecifier::parse_pip("a<2").unwrap().constraint;
        let both = lower.conjoin(&upper);
        assert_eq!(both.clauses().len(), 2);
        assert!(both.is_satisfied_by(&v("1.5")));
        assert!(!both.is_satisfied_by(&v("2.1")));
        assert_eq!(both.conjoin(&lower).clauses().len(), 2);
    }
}
