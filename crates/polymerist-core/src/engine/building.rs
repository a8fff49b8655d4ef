use super::config::LinearBuildConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::io::pdb::{DEFAULT_NUM_ATOM_DIGITS, uniquify_atom_names};
use crate::core::linalg::affine::{self, AffineMatrix};
use crate::core::linalg::geometry::{place_substituents, rotation_to_align};
use crate::core::models::atom::Atom;
use crate::core::models::chain::ChainType;
use crate::core::models::element::HYDROGEN;
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::system::MolecularSystem;
use crate::core::models::topology::BondOrder;
use crate::core::monomers::group::{EndGroupPosition, MonomerGroup};
use crate::core::smarts::MonomerSmarts;
use crate::core::smarts::graph::{PortLinkage, SmartsAtom, SmartsGraph};
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::f64::consts::PI;
use tracing::{debug, info};

const HYDROGEN_BOND_LENGTH: f64 = 1.09;
const COMPONENT_OFFSET: f64 = 3.0;

/// A polymer chain assembled from a monomer group.
#[derive(Debug, Clone)]
pub struct BuiltPolymer {
    pub system: MolecularSystem,
    /// Residue name of every unit, head to tail.
    pub residue_sequence: Vec<String>,
    /// Residues that ended up capping each end of the chain.
    pub end_groups: BTreeMap<EndGroupPosition, String>,
}

impl BuiltPolymer {
    pub fn n_residues(&self) -> usize {
        self.residue_sequence.len()
    }

    pub fn atom_count(&self) -> usize {
        self.system.atom_count()
    }
}

/// One residue of a planned chain with the linkages joining it to its neighbors.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlannedUnit<'g> {
    pub residue: &'g str,
    pub monomer: &'g MonomerSmarts,
    /// Linkage bonded to the previous unit.
    pub incoming: Option<PortLinkage>,
    /// Linkage bonded to the next unit.
    pub outgoing: Option<PortLinkage>,
}

impl PlannedUnit<'_> {
    /// Real atoms this unit contributes once bracket hydrogens are expanded.
    pub fn atom_count(&self) -> usize {
        self.monomer.graph().heavy_atom_count_with_hydrogens()
    }
}

/// End groups plus the block of middle units repeated between them.
#[derive(Debug, Clone)]
pub(crate) struct ChainPlan<'g> {
    pub head: Option<PlannedUnit<'g>>,
    pub tail: Option<PlannedUnit<'g>>,
    /// One unit per character of the sequence.
    pub block: Vec<PlannedUnit<'g>>,
}

impl<'g> ChainPlan<'g> {
    pub fn resolve(group: &'g MonomerGroup, sequence: &str) -> Result<Self, EngineError> {
        if !group.is_linear() {
            return Err(EngineError::Morphology(
                "linear polymer building requires monomers with at most 2 ports; this group is branchable".into(),
            ));
        }
        if sequence.is_empty() {
            return Err(EngineError::Sequence {
                sequence: String::new(),
                distinct: 0,
                available: group.num_mid_and_term().0,
            });
        }

        let end_groups = group.linear_end_groups()?;
        let end_unit = |position: EndGroupPosition| -> Result<Option<PlannedUnit<'g>>, EngineError> {
            let Some(&(residue, monomer)) = end_groups.get(&position) else {
                return Ok(None);
            };
            let linkage = monomer.graph().port_linkages().first().copied().ok_or_else(|| {
                EngineError::Morphology(format!(
                    "terminal monomer {monomer} of residue '{residue}' has no atom bonded to its port"
                ))
            })?;
            let (incoming, outgoing) = match position {
                EndGroupPosition::Head => (None, Some(linkage)),
                EndGroupPosition::Tail => (Some(linkage), None),
            };
            Ok(Some(PlannedUnit {
                residue,
                monomer,
                incoming,
                outgoing,
            }))
        };
        let head = end_unit(EndGroupPosition::Head)?;
        let tail = end_unit(EndGroupPosition::Tail)?;

        let registry = register_middle_monomers(group, sequence)?;
        let block = sequence
            .chars()
            .filter_map(|symbol| registry.get(&symbol).copied())
            .collect();

        Ok(Self { head, tail, block })
    }

    pub fn n_end_groups(&self) -> usize {
        usize::from(self.head.is_some()) + usize::from(self.tail.is_some())
    }

    /// Copies of the sequence block between the end groups: `dop - n_end_groups`.
    pub fn n_repeats(&self, dop: usize) -> Result<usize, EngineError> {
        let n_end = self.n_end_groups();
        let n_repeats = dop.checked_sub(n_end).ok_or_else(|| {
            EngineError::Morphology(format!(
                "a degree of polymerization of {dop} cannot hold {n_end} end groups"
            ))
        })?;
        if n_repeats > 0 && self.block.is_empty() {
            return Err(EngineError::Morphology(format!(
                "{n_repeats} sequence repeats requested but the group defines no middle monomers"
            )));
        }
        if n_repeats == 0 && n_end < 2 {
            return Err(EngineError::Morphology(
                "a chain needs at least one middle unit unless both ends are capped".into(),
            ));
        }
        Ok(n_repeats)
    }

    /// Units of the chain, head to tail.
    pub fn units(&self, dop: usize) -> Result<Vec<PlannedUnit<'g>>, EngineError> {
        let n_repeats = self.n_repeats(dop)?;
        let middles = (0..n_repeats).flat_map(|_| self.block.iter().copied());
        Ok(self.head.into_iter().chain(middles).chain(self.tail).collect())
    }

    /// Hydrogens needed to cap ports left open at either end of the chain.
    pub fn n_caps(&self) -> usize {
        usize::from(self.head.is_none()) + usize::from(self.tail.is_none())
    }

    /// Atoms contributed by one copy of the sequence block.
    pub fn block_atom_count(&self) -> usize {
        self.block.iter().map(PlannedUnit::atom_count).sum()
    }

    /// Atoms of the fully hydrogenated chain: open ends capped and bracket
    /// hydrogens expanded.
    pub fn atom_count(&self, dop: usize) -> Result<usize, EngineError> {
        let n_repeats = self.n_repeats(dop)?;
        let ends: usize = self
            .head
            .iter()
            .chain(self.tail.iter())
            .map(PlannedUnit::atom_count)
            .sum();
        Ok(ends + n_repeats * self.block_atom_count() + self.n_caps())
    }
}

/// Pairs each distinct sequence character, in order of first appearance, with
/// the middle monomers of the group in declaration order.
fn register_middle_monomers<'g>(
    group: &'g MonomerGroup,
    sequence: &str,
) -> Result<HashMap<char, PlannedUnit<'g>>, EngineError> {
    let middles: Vec<(&str, &MonomerSmarts)> = group.iter_monomers(Some(false)).collect();
    if middles.is_empty() {
        return Ok(HashMap::new());
    }

    let mut symbols: Vec<char> = Vec::new();
    for symbol in sequence.chars() {
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    if symbols.len() > middles.len() {
        return Err(EngineError::Sequence {
            sequence: sequence.to_string(),
            distinct: symbols.len(),
            available: middles.len(),
        });
    }
    if middles.len() > symbols.len() {
        debug!(
            unused = middles.len() - symbols.len(),
            "Sequence does not reference every middle monomer"
        );
    }

    symbols
        .into_iter()
        .zip(middles)
        .map(|(symbol, (residue, monomer))| {
            let linkages = monomer.graph().port_linkages();
            match linkages.as_slice() {
                [incoming, outgoing] => Ok((
                    symbol,
                    PlannedUnit {
                        residue,
                        monomer,
                        incoming: Some(*incoming),
                        outgoing: Some(*outgoing),
                    },
                )),
                _ => Err(EngineError::Morphology(format!(
                    "middle monomer {monomer} of residue '{residue}' has {} usable ports; linear chains need exactly 2",
                    linkages.len()
                ))),
            }
        })
        .collect()
}

/// Builds a linear chain without progress reporting.
pub fn build_linear_polymer(
    group: &MonomerGroup,
    config: &LinearBuildConfig,
) -> Result<BuiltPolymer, EngineError> {
    build_linear_polymer_with_progress(group, config, &ProgressReporter::new())
}

/// Assembles a linear chain head to tail.
///
/// End groups come from the group's orientation (or are auto-assigned). Between
/// them the whole `config.sequence` block is repeated
/// `degree_of_polymerization - n_end_groups` times. Adjacent linker atoms are
/// bonded directly and their ports discarded. Ports left open at the chain ends
/// are capped with hydrogen only when `config.add_hydrogens` is set. Coordinates
/// are a rough extended conformation meant as a starting point for
/// minimization, and every atom is uncharged.
pub fn build_linear_polymer_with_progress(
    group: &MonomerGroup,
    config: &LinearBuildConfig,
    reporter: &ProgressReporter,
) -> Result<BuiltPolymer, EngineError> {
    let dop = config.degree_of_polymerization;
    let plan = ChainPlan::resolve(group, &config.sequence)?;
    let units = plan.units(dop)?;
    let estimated_atoms = plan.atom_count(dop)?;
    info!(
        dop,
        n_units = units.len(),
        estimated_atoms,
        sequence = %config.sequence,
        "Building linear polymer chain"
    );

    let mut system = MolecularSystem::new();
    let chain_id = system.add_chain(config.chain_id, ChainType::Polymer);
    let mut pending: Option<PendingLink> = None;

    reporter.report(Progress::TaskStart {
        total_steps: units.len() as u64,
    });
    for (index, unit) in units.iter().enumerate() {
        let graph = unit.monomer.graph();
        let local = embed_fragment(graph, config.monomer_spacing);
        let anchor = pending
            .as_ref()
            .map_or_else(Point3::origin, |link| link.port_position);
        let transform = unit_transform(&local, unit, &anchor, index % 2 == 1);
        let global = affine::apply_to_points(&transform, &local);

        let residue_id = system
            .add_residue(chain_id, (index + 1) as isize, unit.residue)
            .ok_or_else(|| {
                EngineError::Internal(format!("failed to add residue {}", unit.residue))
            })?;
        let atom_ids = add_fragment(&mut system, residue_id, graph, &global)?;

        match (pending.take(), unit.incoming) {
            (Some(link), Some(incoming)) => {
                let linker = linker_atom(&atom_ids, &incoming)?;
                system
                    .add_bond(link.linker, linker, link.order)
                    .ok_or_else(|| EngineError::Internal("failed to link residues".into()))?;
            }
            (None, Some(incoming)) if config.add_hydrogens => {
                let linker = linker_atom(&atom_ids, &incoming)?;
                cap_with_hydrogen(&mut system, residue_id, linker, &global[incoming.port])?;
            }
            (None, Some(_)) => debug!(residue = unit.residue, "Leaving head port open"),
            (Some(_), None) => {
                return Err(EngineError::Internal(format!(
                    "unit {} of residue '{}' has no linkage to the previous unit",
                    index + 1,
                    unit.residue
                )));
            }
            (None, None) => {}
        }

        pending = match unit.outgoing {
            Some(outgoing) => Some(PendingLink {
                residue_id,
                linker: linker_atom(&atom_ids, &outgoing)?,
                order: outgoing.order,
                port_position: global[outgoing.port],
            }),
            None => None,
        };
        reporter.report(Progress::TaskIncrement);
    }
    match pending {
        Some(link) if config.add_hydrogens => {
            cap_with_hydrogen(&mut system, link.residue_id, link.linker, &link.port_position)?;
        }
        Some(_) => debug!("Leaving tail port open"),
        None => {}
    }
    reporter.report(Progress::TaskFinish);

    if config.expand_hydrogens {
        let added = expand_bracket_hydrogens(&mut system, &units)?;
        debug!(added, "Expanded bracket hydrogen counts into explicit atoms");
    }

    for (_, atom) in system.atoms_iter_mut() {
        atom.partial_charge = 0.0;
    }
    uniquify_atom_names(&mut system, DEFAULT_NUM_ATOM_DIGITS);
    info!(
        n_atoms = system.atom_count(),
        n_residues = units.len(),
        "Built linear polymer"
    );

    Ok(BuiltPolymer {
        system,
        residue_sequence: units.iter().map(|unit| unit.residue.to_string()).collect(),
        end_groups: plan
            .head
            .iter()
            .map(|unit| (EndGroupPosition::Head, unit.residue.to_string()))
            .chain(
                plan.tail
                    .iter()
                    .map(|unit| (EndGroupPosition::Tail, unit.residue.to_string())),
            )
            .collect(),
    })
}

/// Outgoing linkage of the last placed unit, waiting for the next one.
struct PendingLink {
    residue_id: ResidueId,
    linker: AtomId,
    order: BondOrder,
    port_position: Point3<f64>,
}

fn linker_atom(atom_ids: &[Option<AtomId>], linkage: &PortLinkage) -> Result<AtomId, EngineError> {
    atom_ids
        .get(linkage.linker)
        .copied()
        .flatten()
        .ok_or_else(|| EngineError::Internal(format!("linker atom {} was not placed", linkage.linker)))
}

/// Adds the non-port atoms and bonds of a fragment; returns the system id of
/// every graph atom (`None` for ports).
fn add_fragment(
    system: &mut MolecularSystem,
    residue_id: ResidueId,
    graph: &SmartsGraph,
    positions: &[Point3<f64>],
) -> Result<Vec<Option<AtomId>>, EngineError> {
    let mut atom_ids = Vec::with_capacity(graph.atoms.len());
    for (atom, position) in graph.atoms.iter().zip(positions) {
        if atom.is_port() {
            atom_ids.push(None);
            continue;
        }
        let id = system
            .add_atom_to_residue(
                residue_id,
                Atom::new(atom.element.symbol, residue_id, atom.element, *position),
            )
            .ok_or_else(|| EngineError::Internal("failed to add fragment atom".into()))?;
        atom_ids.push(Some(id));
    }

    for bond in &graph.bonds {
        if let (Some(Some(a)), Some(Some(b))) = (atom_ids.get(bond.atom1), atom_ids.get(bond.atom2)) {
            system
                .add_bond(*a, *b, bond.order)
                .ok_or_else(|| EngineError::Internal("failed to add fragment bond".into()))?;
        }
    }
    Ok(atom_ids)
}

fn cap_with_hydrogen(
    system: &mut MolecularSystem,
    residue_id: ResidueId,
    linker: AtomId,
    port_position: &Point3<f64>,
) -> Result<AtomId, EngineError> {
    let base = system
        .atom(linker)
        .map(|atom| atom.position)
        .ok_or_else(|| EngineError::Internal("capped linker atom is missing".into()))?;
    let direction = port_position - base;
    let direction = if direction.norm_squared() > f64::EPSILON {
        direction.normalize()
    } else {
        Vector3::x()
    };
    add_hydrogen(system, residue_id, linker, base + direction * HYDROGEN_BOND_LENGTH)
}

fn add_hydrogen(
    system: &mut MolecularSystem,
    residue_id: ResidueId,
    parent: AtomId,
    position: Point3<f64>,
) -> Result<AtomId, EngineError> {
    let id = system
        .add_atom_to_residue(
            residue_id,
            Atom::new(HYDROGEN.symbol, residue_id, HYDROGEN, position),
        )
        .ok_or_else(|| EngineError::Internal("failed to add hydrogen".into()))?;
    system
        .add_bond(parent, id, BondOrder::Single)
        .ok_or_else(|| EngineError::Internal("failed to bond hydrogen".into()))?;
    Ok(id)
}

/// Replaces bracket hydrogen counts (`[CH2]`) with explicit, tetrahedrally
/// placed hydrogen atoms. Returns the number of atoms added.
fn expand_bracket_hydrogens(
    system: &mut MolecularSystem,
    units: &[PlannedUnit],
) -> Result<usize, EngineError> {
    let residue_ids: Vec<ResidueId> = system
        .chains_iter()
        .flat_map(|(_, chain)| chain.residues().to_vec())
        .collect();

    let mut added = 0;
    for (residue_id, unit) in residue_ids.into_iter().zip(units) {
        let heavy_atoms: Vec<AtomId> = match system.residue(residue_id) {
            Some(residue) => residue.atoms().to_vec(),
            None => continue,
        };
        let counts = unit
            .monomer
            .graph()
            .atoms
            .iter()
            .filter(|atom| !atom.is_port())
            .map(|atom: &SmartsAtom| atom.hydrogen_count.unwrap_or(0) as usize);

        for (atom_id, count) in heavy_atoms.into_iter().zip(counts) {
            if count == 0 {
                continue;
            }
            let Some(base) = system.atom(atom_id).map(|atom| atom.position) else {
                continue;
            };
            let neighbors: Vec<Point3<f64>> = system
                .get_bonded_neighbors(atom_id)
                .unwrap_or_default()
                .iter()
                .filter_map(|&id| system.atom(id).map(|atom| atom.position))
                .collect();
            for position in place_substituents(&base, &neighbors, count, HYDROGEN_BOND_LENGTH) {
                add_hydrogen(system, residue_id, atom_id, position)?;
                added += 1;
            }
        }
    }
    Ok(added)
}

/// Equilibrium bond length in angstroms used for the initial layout.
fn bond_length(a: &SmartsAtom, b: &SmartsAtom, order: BondOrder, spacing: f64) -> f64 {
    if a.is_port() || b.is_port() {
        return spacing;
    }
    if a.element.is_hydrogen() || b.element.is_hydrogen() {
        return HYDROGEN_BOND_LENGTH;
    }
    match order {
        BondOrder::Single => 1.5,
        BondOrder::Aromatic => 1.4,
        BondOrder::Double => 1.34,
        BondOrder::Triple => 1.2,
    }
}

/// Local coordinates for every atom of a fragment, ports included.
///
/// Atoms are placed breadth-first, each new neighbor in the next free
/// tetrahedral slot of its parent. Ring closures are left stretched.
fn embed_fragment(graph: &SmartsGraph, spacing: f64) -> Vec<Point3<f64>> {
    let mut positions: Vec<Option<Point3<f64>>> = vec![None; graph.atoms.len()];
    let mut n_components = 0;

    for root in 0..graph.atoms.len() {
        if positions[root].is_some() {
            continue;
        }
        positions[root] = Some(Point3::new(0.0, COMPONENT_OFFSET * n_components as f64, 0.0));
        n_components += 1;

        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            let Some(base) = positions[current] else {
                continue;
            };
            let neighbors = graph.neighbors(current);
            let placed: Vec<Point3<f64>> = neighbors
                .iter()
                .filter_map(|(neighbor, _)| positions[*neighbor])
                .collect();
            let unplaced: Vec<(usize, BondOrder)> = neighbors
                .into_iter()
                .filter(|(neighbor, _)| positions[*neighbor].is_none())
                .collect();
            if unplaced.is_empty() {
                continue;
            }

            let slots = place_substituents(&base, &placed, unplaced.len(), 1.0);
            for ((neighbor, order), slot) in unplaced.into_iter().zip(slots) {
                let length = bond_length(&graph.atoms[current], &graph.atoms[neighbor], order, spacing);
                positions[neighbor] = Some(base + (slot - base) * length);
                queue.push_back(neighbor);
            }
        }
    }

    positions
        .into_iter()
        .map(|position| position.unwrap_or_else(Point3::origin))
        .collect()
}

/// Maps a fragment so its incoming linker sits on `anchor` and its chain axis
/// points along +x. Odd units are flipped about the axis to zig-zag the chain.
fn unit_transform(
    local: &[Point3<f64>],
    unit: &PlannedUnit,
    anchor: &Point3<f64>,
    flip: bool,
) -> AffineMatrix {
    let (pivot, direction) = match (unit.incoming, unit.outgoing) {
        (Some(incoming), Some(outgoing)) => (
            local[incoming.linker],
            local[outgoing.port] - local[incoming.linker],
        ),
        (None, Some(outgoing)) => (
            local[outgoing.linker],
            local[outgoing.port] - local[outgoing.linker],
        ),
        (Some(incoming), None) => (
            local[incoming.linker],
            local[incoming.linker] - local[incoming.port],
        ),
        (None, None) => (
            local.first().copied().unwrap_or_else(Point3::origin),
            Vector3::x(),
        ),
    };
    let direction = if direction.norm_squared() > f64::EPSILON {
        direction
    } else {
        Vector3::x()
    };

    let rotation = rotation_to_align(&direction, &Vector3::x()).to_homogeneous();
    let flip = if flip { affine::x_rot(PI) } else { affine::identity() };
    affine::xyz_trans(anchor.x, anchor.y, anchor.z)
        * flip
        * rotation
        * affine::xyz_trans(-pivot.x, -pivot.y, -pivot.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::LinearBuildConfigBuilder;
    use indexmap::IndexMap;

    fn group(entries: &[(&str, &[&str])]) -> MonomerGroup {
        let monomers: IndexMap<String, Vec<String>> = entries
            .iter()
            .map(|(name, smarts)| {
                (
                    name.to_string(),
                    smarts.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        MonomerGroup::new(monomers, BTreeMap::new()).unwrap()
    }

    fn peg() -> MonomerGroup {
        group(&[
            ("PEG-1", &["[#8D2+0:1](-[#6D4+0:2](-[#6D4+0:3](-[#8D2+0:4]-[*:5])(-[#1D1+0:9])-[#1D1+0:10])(-[#1D1+0:7])-[#1D1+0:8])-[#1D1+0:6]"]),
            ("PEG-2", &["[*:1]-[#6D4+0:2](-[#6D4+0:3](-[#8D2+0:4]-[*:5])(-[#1D1+0:8])-[#1D1+0:9])(-[#1D1+0:6])-[#1D1+0:7]"]),
            ("PEG-3", &["[*:1]-[#6D4+0:2](-[#6D4+0:3](-[#8D2+0:4]-[#1D1+0:5])(-[#1D1+0:8])-[#1D1+0:9])(-[#1D1+0:6])-[#1D1+0:7]"]),
        ])
    }

    fn config(dop: usize) -> LinearBuildConfig {
        LinearBuildConfigBuilder::new()
            .degree_of_polymerization(dop)
            .build()
            .unwrap()
    }

    fn hydrogenated(dop: usize, expand: bool) -> LinearBuildConfig {
        LinearBuildConfigBuilder::new()
            .degree_of_polymerization(dop)
            .add_hydrogens(true)
            .expand_hydrogens(expand)
            .build()
            .unwrap()
    }

    #[test]
    fn builds_capped_chain_with_expected_size() {
        let polymer = build_linear_polymer(&peg(), &config(5)).unwrap();

        assert_eq!(polymer.n_residues(), 5);
        assert_eq!(
            polymer.residue_sequence,
            ["PEG-1", "PEG-2", "PEG-2", "PEG-2", "PEG-3"]
        );
        // 9 + 3 * 7 + 8 real atoms and no open ports.
        assert_eq!(polymer.atom_count(), 38);
        assert_eq!(polymer.end_groups[&EndGroupPosition::Head], "PEG-1");
        assert_eq!(polymer.end_groups[&EndGroupPosition::Tail], "PEG-3");
        assert!(polymer.system.atoms_iter().all(|(_, atom)| atom.partial_charge == 0.0));
        assert!(polymer.system.atoms_iter().all(|(_, atom)| !atom.element.is_wildcard()));
    }

    #[test]
    fn adjacent_residues_are_bonded_at_the_requested_spacing() {
        let polymer = build_linear_polymer(&peg(), &config(3)).unwrap();
        let system = &polymer.system;

        let inter_residue: Vec<_> = system
            .bonds()
            .iter()
            .filter_map(|bond| {
                let a = system.atom(bond.atom1_id)?;
                let b = system.atom(bond.atom2_id)?;
                (a.residue_id != b.residue_id).then(|| (a.position - b.position).norm())
            })
            .collect();

        assert_eq!(inter_residue.len(), 2);
        for distance in inter_residue {
            assert!((distance - 1.5).abs() < 1e-6, "distance was {distance}");
        }
    }

    #[test]
    fn atom_names_are_unique_within_residues() {
        let polymer = build_linear_polymer(&peg(), &config(3)).unwrap();
        for (_, residue) in polymer.system.residues_iter() {
            let mut names: Vec<&str> = residue
                .atoms()
                .iter()
                .filter_map(|&id| polymer.system.atom(id).map(|atom| atom.name.as_str()))
                .collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total);
        }
    }

    #[test]
    fn open_ports_are_capped_only_when_hydrogens_are_added() {
        let chain = group(&[("MID", &["[*]CC[*]"])]);
        let capped = build_linear_polymer(&chain, &hydrogenated(4, false)).unwrap();
        // 4 * 2 carbons plus one cap per open end.
        assert_eq!(capped.atom_count(), 10);
        assert!(capped.end_groups.is_empty());
        let hydrogens = capped
            .system
            .atoms_iter()
            .filter(|(_, atom)| atom.element.is_hydrogen())
            .count();
        assert_eq!(hydrogens, 2);

        let open = build_linear_polymer(&chain, &config(4)).unwrap();
        assert_eq!(open.atom_count(), 8);
        assert!(open.system.atoms_iter().all(|(_, atom)| !atom.element.is_hydrogen()));
        assert_eq!(open.system.bonds().len(), 7);
    }

    #[test]
    fn bracket_hydrogens_are_expanded_on_request() {
        let chain = group(&[("MID", &["[*][CH2][CH2][*]"])]);
        let bare = build_linear_polymer(&chain, &hydrogenated(2, false)).unwrap();
        assert_eq!(bare.atom_count(), 6);

        let full = build_linear_polymer(&chain, &hydrogenated(2, true)).unwrap();
        assert_eq!(full.atom_count(), 14);
        for (id, atom) in full.system.atoms_iter() {
            if atom.element.symbol == "C" {
                assert_eq!(full.system.get_bonded_neighbors(id).unwrap().len(), 4);
            }
        }
    }

    #[test]
    fn whole_sequence_block_repeats_between_end_groups() {
        let orient = BTreeMap::from([
            (EndGroupPosition::Head, "CAP".to_string()),
            (EndGroupPosition::Tail, "CAP".to_string()),
        ]);
        let chain = group(&[
            ("A", &["[*]C[*]"]),
            ("B", &["[*]O[*]"]),
            ("CAP", &["[*][H]"]),
        ])
        .with_term_orient(orient);
        let config = LinearBuildConfigBuilder::new()
            .degree_of_polymerization(4)
            .sequence("AB")
            .build()
            .unwrap();
        let polymer = build_linear_polymer(&chain, &config).unwrap();
        assert_eq!(polymer.residue_sequence, ["CAP", "A", "B", "A", "B", "CAP"]);

        let plan = ChainPlan::resolve(&chain, "AB").unwrap();
        assert_eq!(plan.n_repeats(4).unwrap(), 2);
        assert_eq!(plan.atom_count(4).unwrap(), polymer.atom_count());
    }

    #[test]
    fn sequence_with_too_many_symbols_is_rejected() {
        let config = LinearBuildConfigBuilder::new()
            .degree_of_polymerization(4)
            .sequence("ABC")
            .build()
            .unwrap();
        let result = build_linear_polymer(&peg(), &config);
        assert!(matches!(
            result,
            Err(EngineError::Sequence {
                distinct: 3,
                available: 1,
                ..
            })
        ));
    }

    #[test]
    fn branchable_groups_are_rejected() {
        let branched = group(&[("BR", &["[*]C([*])[*]"]), ("CAP", &["[*]C"])]);
        assert!(matches!(
            build_linear_polymer(&branched, &config(4)),
            Err(EngineError::Morphology(_))
        ));
    }

    #[test]
    fn progress_counts_one_step_per_residue() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let steps = AtomicU64::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::TaskIncrement = event {
                steps.fetch_add(1, Ordering::Relaxed);
            }
        }));
        build_linear_polymer_with_progress(&peg(), &config(7), &reporter).unwrap();
        drop(reporter);
        assert_eq!(steps.into_inner(), 7);
    }
}
