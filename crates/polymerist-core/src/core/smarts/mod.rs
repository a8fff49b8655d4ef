//! Monomer SMARTS: a subset parser for the fragment notation used to describe
//! repeat units, where wildcard atoms (`*`) mark the ports through which
//! neighboring units are linked.

pub mod graph;
pub mod parser;

pub use graph::{PortLinkage, SmartsAtom, SmartsBond, SmartsGraph};
pub use parser::{SmartsError, parse_smarts};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A monomer fragment, keeping the text it was parsed from alongside its graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonomerSmarts {
    raw: String,
    graph: SmartsGraph,
}

impl MonomerSmarts {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn graph(&self) -> &SmartsGraph {
        &self.graph
    }

    pub fn num_ports(&self) -> usize {
        self.graph.num_ports()
    }

    /// A terminal monomer caps one end of a chain and so has exactly one port.
    pub fn is_terminal(&self) -> bool {
        self.num_ports() == 1
    }

    pub fn signature(&self) -> u64 {
        self.graph.wl_signature()
    }
}

impl FromStr for MonomerSmarts {
    type Err = SmartsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_string();
        let graph = parse_smarts(&raw)?;
        Ok(Self { raw, graph })
    }
}

impl TryFrom<String> for MonomerSmarts {
    type Error = SmartsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonomerSmarts> for String {
    fn from(value: MonomerSmarts) -> Self {
        value.raw
    }
}

impl fmt::Display for MonomerSmarts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
