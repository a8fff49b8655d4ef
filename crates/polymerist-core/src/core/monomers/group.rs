use crate::core::smarts::{MonomerSmarts, SmartsError};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Add;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MonomerError {
    #[error("Empty monomer declaration for residue '{0}'")]
    EmptyDeclaration(String),
    #[error("Invalid monomer SMARTS for {residue}[{index}]: \"{smarts}\" ({source})")]
    InvalidSmarts {
        residue: String,
        index: usize,
        smarts: String,
        source: SmartsError,
    },
    #[error("Residue '{0}' named in term orientation has no terminal monomers")]
    UnknownEndGroup(String),
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which end of a linear chain a terminal residue caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndGroupPosition {
    Head,
    Tail,
}

impl fmt::Display for EndGroupPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => write!(f, "head"),
            Self::Tail => write!(f, "tail"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMonomerGroup {
    #[serde(default)]
    monomers: IndexMap<String, OneOrMany>,
    #[serde(default)]
    term_orient: BTreeMap<EndGroupPosition, String>,
}

impl TryFrom<RawMonomerGroup> for MonomerGroup {
    type Error = MonomerError;

    fn try_from(raw: RawMonomerGroup) -> Result<Self, Self::Error> {
        let monomers = raw
            .monomers
            .into_iter()
            .map(|(residue, entry)| {
                let list = match entry {
                    OneOrMany::Many(list) => list,
                    OneOrMany::One(smarts) => {
                        warn!(
                            residue = %residue,
                            "Wrapping bare monomer SMARTS in list (storing as [\"{smarts}\"])"
                        );
                        vec![smarts]
                    }
                };
                (residue, list)
            })
            .collect();
        MonomerGroup::new(monomers, raw.term_orient)
    }
}

/// Residue-labelled monomer fragments, with optional head/tail assignments for linear chains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMonomerGroup")]
pub struct MonomerGroup {
    monomers: IndexMap<String, Vec<MonomerSmarts>>,
    term_orient: BTreeMap<EndGroupPosition, String>,
}

impl MonomerGroup {
    /// Validates and parses every fragment. An empty list is rejected, as is any
    /// SMARTS that fails to parse.
    pub fn new(
        monomers: IndexMap<String, Vec<String>>,
        term_orient: BTreeMap<EndGroupPosition, String>,
    ) -> Result<Self, MonomerError> {
        let mut parsed = IndexMap::with_capacity(monomers.len());
        for (residue, smarts_list) in monomers {
            if smarts_list.is_empty() {
                return Err(MonomerError::EmptyDeclaration(residue));
            }
            let fragments = smarts_list
                .iter()
                .enumerate()
                .map(|(index, smarts)| {
                    smarts
                        .parse::<MonomerSmarts>()
                        .map_err(|source| MonomerError::InvalidSmarts {
                            residue: residue.clone(),
                            index,
                            smarts: smarts.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            parsed.insert(residue, fragments);
        }
        Ok(Self {
            monomers: parsed,
            term_orient,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, MonomerError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, MonomerError> {
        let content = std::fs::read_to_string(path).map_err(|e| MonomerError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, MonomerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to_path(&self, path: &Path) -> Result<(), MonomerError> {
        let content = self.to_json_string()?;
        std::fs::write(path, content).map_err(|e| MonomerError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn monomers(&self) -> &IndexMap<String, Vec<MonomerSmarts>> {
        &self.monomers
    }

    pub fn term_orient(&self) -> &BTreeMap<EndGroupPosition, String> {
        &self.term_orient
    }

    pub fn with_term_orient(mut self, term_orient: BTreeMap<EndGroupPosition, String>) -> Self {
        self.term_orient = term_orient;
        self
    }

    pub fn is_terminal(monomer: &MonomerSmarts) -> bool {
        monomer.is_terminal()
    }

    /// Yields `(residue, monomer)` pairs. `Some(true)` keeps only terminal
    /// monomers, `Some(false)` only middle ones, `None` everything.
    pub fn iter_monomers(
        &self,
        term_only: Option<bool>,
    ) -> impl Iterator<Item = (&str, &MonomerSmarts)> + '_ {
        self.monomers
            .iter()
            .flat_map(|(residue, list)| list.iter().map(move |m| (residue.as_str(), m)))
            .filter(move |(_, m)| term_only.is_none_or(|term| m.is_terminal() == term))
    }

    pub fn monomers_by_residue(&self, term_only: Option<bool>) -> IndexMap<&str, Vec<&MonomerSmarts>> {
        let mut grouped: IndexMap<&str, Vec<&MonomerSmarts>> = IndexMap::new();
        for (residue, monomer) in self.iter_monomers(term_only) {
            grouped.entry(residue).or_default().push(monomer);
        }
        grouped
    }

    /// Multiple monomers under the same residue name count separately.
    pub fn n_monomers(&self) -> usize {
        self.iter_monomers(None).count()
    }

    /// Counts of middle and terminal monomers, in that order.
    pub fn num_mid_and_term(&self) -> (usize, usize) {
        self.iter_monomers(None)
            .fold((0, 0), |(mid, term), (_, m)| {
                if m.is_terminal() {
                    (mid, term + 1)
                } else {
                    (mid + 1, term)
                }
            })
    }

    pub fn has_valid_linear_term_orient(&self) -> bool {
        self.term_orient.contains_key(&EndGroupPosition::Head)
            && self.term_orient.contains_key(&EndGroupPosition::Tail)
    }

    /// Head and tail residues with their monomers.
    ///
    /// Uses the declared orientation when both ends are given, cycling through a
    /// residue's terminal monomers so one residue can cap both ends. Otherwise the
    /// first (up to two) terminal monomers are assigned in order.
    pub fn linear_end_groups(
        &self,
    ) -> Result<BTreeMap<EndGroupPosition, (&str, &MonomerSmarts)>, MonomerError> {
        let terminals = self.monomers_by_residue(Some(true));

        if self.has_valid_linear_term_orient() {
            info!(term_orient = ?self.term_orient, "Using user-defined terminal group orientation");
            let mut cursors: IndexMap<&str, usize> = IndexMap::new();
            let mut end_groups = BTreeMap::new();
            for (position, residue) in &self.term_orient {
                let candidates = terminals
                    .get(residue.as_str())
                    .ok_or_else(|| MonomerError::UnknownEndGroup(residue.clone()))?;
                let cursor = cursors.entry(residue.as_str()).or_insert(0);
                let monomer = candidates[*cursor % candidates.len()];
                *cursor += 1;
                end_groups.insert(*position, (residue.as_str(), monomer));
            }
            return Ok(end_groups);
        }

        let end_groups: BTreeMap<_, _> = [EndGroupPosition::Head, EndGroupPosition::Tail]
            .into_iter()
            .zip(self.iter_monomers(Some(true)))
            .collect();
        let auto: BTreeMap<_, _> = end_groups.iter().map(|(pos, (res, _))| (*pos, *res)).collect();
        warn!(
            term_orient = ?auto,
            "No valid terminal monomer orientations defined; auto-assigned orientations. Verify that this yields a chemically valid polymer"
        );
        Ok(end_groups)
    }

    /// Combines two groups. Residues defined in `other` replace those in `self`
    /// (keeping their original position) and `other`'s orientations take precedence.
    pub fn merge(&self, other: &MonomerGroup) -> MonomerGroup {
        let mut monomers = self.monomers.clone();
        for (residue, list) in &other.monomers {
            monomers.insert(residue.clone(), list.clone());
        }
        let mut term_orient = self.term_orient.clone();
        term_orient.extend(other.term_orient.iter().map(|(k, v)| (*k, v.clone())));
        MonomerGroup {
            monomers,
            term_orient,
        }
    }

    /// One monomer per distinct fragment, compared with ports capped by hydrogen.
    pub fn unique(&self) -> MonomerGroup {
        let mut seen = IndexSet::new();
        let mut monomers: IndexMap<String, Vec<MonomerSmarts>> = IndexMap::new();
        for (residue, monomer) in self.iter_monomers(None) {
            if seen.insert(monomer.signature()) {
                monomers
                    .entry(residue.to_string())
                    .or_default()
                    .push(monomer.clone());
            }
        }
        let term_orient = self
            .term_orient
            .iter()
            .filter(|(_, residue)| monomers.contains_key(residue.as_str()))
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        MonomerGroup {
            monomers,
            term_orient,
        }
    }

    /// A homopolymer has exactly one distinct middle monomer.
    pub fn is_homopolymer(&self) -> bool {
        self.unique().iter_monomers(Some(false)).count() == 1
    }

    /// Whether any monomer has more than two ports.
    pub fn is_branchable(&self) -> bool {
        self.iter_monomers(None).any(|(_, m)| m.num_ports() > 2)
    }

    pub fn is_linear(&self) -> bool {
        !self.is_branchable()
    }

    pub fn is_linear_homopolymer(&self) -> bool {
        self.is_linear() && self.is_homopolymer()
    }
}

impl Add for MonomerGroup {
    type Output = MonomerGroup;

    fn add(self, other: MonomerGroup) -> MonomerGroup {
        self.merge(&other)
    }
}

impl Add<&MonomerGroup> for &MonomerGroup {
    type Output = MonomerGroup;

    fn add(self, other: &MonomerGroup) -> MonomerGroup {
        self.merge(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PEG_JSON: &str = r#"{
        "monomers": {
            "PGH": ["[*:1]OCCO"],
            "PEG": ["[*:1]OCC[*:2]"],
            "PGT": "[*:1]CCO"
        },
        "term_orient": {"head": "PGH", "tail": "PGT"}
    }"#;

    fn group(entries: &[(&str, &[&str])]) -> MonomerGroup {
        let monomers = entries
            .iter()
            .map(|(res, list)| (res.to_string(), list.iter().map(|s| s.to_string()).collect()))
            .collect();
        MonomerGroup::new(monomers, BTreeMap::new()).unwrap()
    }

    #[test]
    fn bare_smarts_are_wrapped_in_lists() {
        let group = MonomerGroup::from_json_str(PEG_JSON).unwrap();
        assert_eq!(group.monomers()["PGT"].len(), 1);
        assert_eq!(group.n_monomers(), 3);
        assert_eq!(group.num_mid_and_term(), (1, 2));
    }

    #[test]
    fn empty_declarations_are_rejected() {
        let result = MonomerGroup::from_json_str(r#"{"monomers": {"A": []}}"#);
        assert!(matches!(result, Err(MonomerError::Json(_))));

        let mut monomers = IndexMap::new();
        monomers.insert("A".to_string(), Vec::new());
        assert!(matches!(
            MonomerGroup::new(monomers, BTreeMap::new()),
            Err(MonomerError::EmptyDeclaration(res)) if res == "A"
        ));
    }

    #[test]
    fn invalid_smarts_names_residue_and_index() {
        let mut monomers = IndexMap::new();
        monomers.insert("A".to_string(), vec!["[*]CC".to_string(), "C(C".to_string()]);
        match MonomerGroup::new(monomers, BTreeMap::new()) {
            Err(MonomerError::InvalidSmarts { residue, index, .. }) => {
                assert_eq!(residue, "A");
                assert_eq!(index, 1);
            }
            other => panic!("expected InvalidSmarts, got {other:?}"),
        }
    }

    #[test]
    fn filters_by_termination() {
        let group = MonomerGroup::from_json_str(PEG_JSON).unwrap();
        let terminal: Vec<&str> = group.iter_monomers(Some(true)).map(|(r, _)| r).collect();
        assert_eq!(terminal, vec!["PGH", "PGT"]);
        let middle = group.monomers_by_residue(Some(false));
        assert_eq!(middle.keys().copied().collect::<Vec<_>>(), vec!["PEG"]);
    }

    #[test]
    fn end_groups_follow_declared_orientation() {
        let group = MonomerGroup::from_json_str(PEG_JSON).unwrap();
        assert!(group.has_valid_linear_term_orient());
        let ends = group.linear_end_groups().unwrap();
        assert_eq!(ends[&EndGroupPosition::Head].0, "PGH");
        assert_eq!(ends[&EndGroupPosition::Tail].0, "PGT");
    }

    #[test]
    fn same_residue_can_cap_both_ends() {
        let mut orient = BTreeMap::new();
        orient.insert(EndGroupPosition::Head, "T".to_string());
        orient.insert(EndGroupPosition::Tail, "T".to_string());
        let group = group(&[("T", &["[*]C", "[*]O"]), ("M", &["[*]CC[*]"])]).with_term_orient(orient);
        let ends = group.linear_end_groups().unwrap();
        assert_eq!(ends[&EndGroupPosition::Head].1.as_str(), "[*]C");
        assert_eq!(ends[&EndGroupPosition::Tail].1.as_str(), "[*]O");
    }

    #[test]
    fn unknown_end_group_residue_is_an_error() {
        let mut orient = BTreeMap::new();
        orient.insert(EndGroupPosition::Head, "X".to_string());
        orient.insert(EndGroupPosition::Tail, "T".to_string());
        let group = group(&[("T", &["[*]C"])]).with_term_orient(orient);
        assert!(matches!(
            group.linear_end_groups(),
            Err(MonomerError::UnknownEndGroup(res)) if res == "X"
        ));
    }

    #[test]
    fn end_groups_are_auto_assigned_without_orientation() {
        let group = group(&[("M", &["[*]CC[*]"]), ("A", &["[*]C"]), ("B", &["[*]N"])]);
        let ends = group.linear_end_groups().unwrap();
        assert_eq!(ends[&EndGroupPosition::Head].0, "A");
        assert_eq!(ends[&EndGroupPosition::Tail].0, "B");

        let single_group = self::group(&[("A", &["[*]C"])]);
        let single = single_group.linear_end_groups().unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn merge_replaces_residues_and_overlays_orientation() {
        let a = MonomerGroup::from_json_str(PEG_JSON).unwrap();
        let mut orient = BTreeMap::new();
        orient.insert(EndGroupPosition::Tail, "NEW".to_string());
        let b = group(&[("PEG", &["[*]OCCC[*]"]), ("NEW", &["[*]N"])]).with_term_orient(orient);

        let merged = &a + &b;
        let residues: Vec<&str> = merged.monomers().keys().map(String::as_str).collect();
        assert_eq!(residues, vec!["PGH", "PEG", "PGT", "NEW"]);
        assert_eq!(merged.monomers()["PEG"][0].as_str(), "[*]OCCC[*]");
        assert_eq!(merged.term_orient()[&EndGroupPosition::Head], "PGH");
        assert_eq!(merged.term_orient()[&EndGroupPosition::Tail], "NEW");
    }

    #[test]
    fn unique_collapses_equivalent_fragments() {
        let group = group(&[("A", &["[*:1]OCC[*:2]"]), ("B", &["[*:3]CCO[*:4]", "[*]CCC[*]"])]);
        let unique = group.unique();
        assert_eq!(unique.n_monomers(), 2);
        assert!(!group.is_homopolymer());

        let homo = self::group(&[("A", &["[*:1]OCC[*:2]"]), ("B", &["[*]CCO[*]"]), ("T", &["[*]C"])]);
        assert!(homo.is_homopolymer());
        assert!(homo.is_linear_homopolymer());
    }

    #[test]
    fn branchability_depends_on_port_count() {
        let linear = group(&[("A", &["[*]CC[*]"])]);
        let branched = group(&[("A", &["[*]C([*])C[*]"])]);
        assert!(linear.is_linear());
        assert!(branched.is_branchable());
        assert!(!branched.is_linear_homopolymer());
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("peg.json");
        let group = MonomerGroup::from_json_str(PEG_JSON).unwrap();
        group.write_to_path(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"term_orient\""));
        assert!(content.contains("\"head\": \"PGH\""));
        assert_eq!(MonomerGroup::from_path(&path).unwrap(), group);
    }
}
