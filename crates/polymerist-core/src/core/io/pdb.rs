use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::chain::ChainType;
use crate::core::models::element::Element;
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::system::MolecularSystem;
use crate::core::models::topology::BondOrder;
use indexmap::IndexMap;
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_NUM_ATOM_DIGITS: usize = 2;

const SOLVENT_RESIDUES: [&str; 4] = ["HOH", "WAT", "SOL", "TIP3"];

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Model {model} has {found} atoms but the first model has {expected}")]
    ModelSizeMismatch {
        model: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Cannot determine element for atom '{0}'")]
    UnknownElement(String),
    #[error("CONECT line requires at least two atoms")]
    InvalidConectFormat,
}

/// Periodic box from a CRYST1 record. Lengths in angstroms, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Self {
            a,
            b,
            c,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
        }
    }

    pub fn is_orthorhombic(&self) -> bool {
        [self.alpha, self.beta, self.gamma]
            .iter()
            .all(|angle| (angle - 90.0).abs() < 1e-3)
    }

    pub fn lengths(&self) -> Vector3<f64> {
        Vector3::new(self.a, self.b, self.c)
    }

    pub fn volume(&self) -> f64 {
        let (ca, cb, cg) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        self.a
            * self.b
            * self.c
            * (1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg)
                .max(0.0)
                .sqrt()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    pub title: Option<String>,
    pub remarks: Vec<String>,
    pub unit_cell: Option<UnitCell>,
    /// Coordinates of every MODEL in file order, each in
    /// [`MolecularSystem::ordered_atom_ids`] order. Filled when reading.
    pub frames: Vec<Vec<Point3<f64>>>,
}

/// Controls how atoms and residues are labelled on output.
#[derive(Debug, Clone, PartialEq)]
pub struct PdbWriteOptions {
    /// Rename atoms to element symbol plus a per-residue, per-element counter.
    pub uniquify_atom_names: bool,
    /// Width of the zero-padded counter in uniquified names.
    pub num_atom_digits: usize,
    /// Residue names substituted on output before truncation to three columns.
    pub residue_name_map: IndexMap<String, String>,
    pub write_conect: bool,
}

impl Default for PdbWriteOptions {
    fn default() -> Self {
        let mut residue_name_map = IndexMap::new();
        residue_name_map.insert("RES".to_string(), "Pol".to_string());
        Self {
            uniquify_atom_names: true,
            num_atom_digits: DEFAULT_NUM_ATOM_DIGITS,
            residue_name_map,
            write_conect: true,
        }
    }
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_int<T: std::str::FromStr>(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
) -> Result<T, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

/// Infers an element from the element columns, falling back to the leading letters of the atom name.
fn infer_element(element_field: &str, atom_name: &str) -> Option<Element> {
    if !element_field.is_empty() {
        if let Some(element) = Element::from_symbol(element_field) {
            return Some(element);
        }
    }
    let letters: String = atom_name
        .chars()
        .skip_while(|c| c.is_ascii_digit())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    letters
        .get(..2)
        .and_then(Element::from_symbol)
        .filter(|_| atom_name.len() >= 4 || letters.len() == 2)
        .or_else(|| letters.get(..1).and_then(Element::from_symbol))
}

/// Renames every atom to its element symbol followed by a zero-padded counter
/// that runs per element within each residue (`C01`, `C02`, `O01`, ...).
pub fn uniquify_atom_names(system: &mut MolecularSystem, num_digits: usize) {
    let residue_ids: Vec<ResidueId> = system
        .chains_iter()
        .flat_map(|(_, chain)| chain.residues().to_vec())
        .collect();
    for residue_id in residue_ids {
        let atom_ids = match system.residue(residue_id) {
            Some(residue) => residue.atoms().to_vec(),
            None => continue,
        };
        let mut counters: HashMap<&'static str, usize> = HashMap::new();
        let renames: Vec<(AtomId, String)> = atom_ids
            .iter()
            .filter_map(|&id| system.atom(id).map(|atom| (id, atom.element.symbol)))
            .map(|(id, symbol)| {
                let counter = counters.entry(symbol).or_insert(0);
                *counter += 1;
                (id, format!("{symbol}{:0width$}", *counter, width = num_digits))
            })
            .collect();
        for (id, name) in renames {
            system.rename_atom(id, &name);
        }
    }
}

fn format_atom_name(name: &str, element: &Element) -> String {
    if name.len() < 4 && element.symbol.len() == 1 {
        format!(" {name:<3}")
    } else {
        format!("{:<4}", name.chars().take(4).collect::<String>())
    }
}

fn output_residue_name(name: &str, options: &PdbWriteOptions) -> String {
    let mapped = options
        .residue_name_map
        .get(name)
        .map(String::as_str)
        .unwrap_or(name);
    mapped.chars().take(3).collect()
}

pub struct PdbFile;

struct ModelState {
    coords: Vec<Point3<f64>>,
}

impl PdbFile {
    /// Writes the system with explicit labelling options.
    pub fn write_with_options(
        system: &MolecularSystem,
        metadata: &PdbMetadata,
        options: &PdbWriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), PdbError> {
        Self::write_header(metadata, writer)?;
        let serials = Self::write_atoms(system, None, options, writer)?;
        if options.write_conect {
            Self::write_conect(system, &serials, writer)?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }

    /// Writes one MODEL block per frame, reusing the topology of `system`.
    pub fn write_models(
        system: &MolecularSystem,
        metadata: &PdbMetadata,
        frames: &[Vec<Point3<f64>>],
        options: &PdbWriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), PdbError> {
        let n_atoms = system.atom_count();
        if frames.is_empty() {
            return Err(PdbError::MissingRecord("at least one model frame".into()));
        }
        Self::write_header(metadata, writer)?;
        let mut serials = HashMap::new();
        for (idx, frame) in frames.iter().enumerate() {
            if frame.len() != n_atoms {
                return Err(PdbError::ModelSizeMismatch {
                    model: idx + 1,
                    expected: n_atoms,
                    found: frame.len(),
                });
            }
            writeln!(writer, "MODEL     {:>4}", idx + 1)?;
            serials = Self::write_atoms(system, Some(frame.as_slice()), options, writer)?;
            writeln!(writer, "ENDMDL")?;
        }
        if options.write_conect {
            Self::write_conect(system, &serials, writer)?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }

    fn write_header(metadata: &PdbMetadata, writer: &mut impl Write) -> Result<(), PdbError> {
        if let Some(title) = &metadata.title {
            writeln!(writer, "TITLE     {title}")?;
        }
        for remark in &metadata.remarks {
            writeln!(writer, "REMARK   1 {remark}")?;
        }
        if let Some(cell) = &metadata.unit_cell {
            writeln!(
                writer,
                "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} P 1           1",
                cell.a, cell.b, cell.c, cell.alpha, cell.beta, cell.gamma
            )?;
        }
        Ok(())
    }

    fn write_atoms(
        system: &MolecularSystem,
        coords: Option<&[Point3<f64>]>,
        options: &PdbWriteOptions,
        writer: &mut impl Write,
    ) -> Result<HashMap<AtomId, usize>, PdbError> {
        let mut serials = HashMap::new();
        let mut serial = 0usize;

        for (_, chain) in system.chains_iter() {
            let record = if chain.chain_type == ChainType::Polymer {
                "ATOM"
            } else {
                "HETATM"
            };
            let mut last_residue: Option<(String, isize)> = None;

            for &residue_id in chain.residues() {
                let residue = system.residue(residue_id).ok_or_else(|| {
                    PdbError::Inconsistency(format!("Residue {residue_id:?} not found"))
                })?;
                let res_name = output_residue_name(&residue.name, options);
                let mut counters: HashMap<&'static str, usize> = HashMap::new();

                for &atom_id in residue.atoms() {
                    let atom = system.atom(atom_id).ok_or_else(|| {
                        PdbError::Inconsistency(format!("Atom {atom_id:?} not found"))
                    })?;
                    let position = match coords {
                        Some(frame) => frame[serial],
                        None => atom.position,
                    };
                    serial += 1;
                    serials.insert(atom_id, serial);

                    let name = if options.uniquify_atom_names {
                        let counter = counters.entry(atom.element.symbol).or_insert(0);
                        *counter += 1;
                        format!(
                            "{}{:0width$}",
                            atom.element.symbol,
                            *counter,
                            width = options.num_atom_digits
                        )
                    } else {
                        atom.name.clone()
                    };

                    writeln!(
                        writer,
                        "{:<6}{:>5} {}{:1}{:>3} {:1}{:>4}{:1}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}{:>2}",
                        record,
                        serial % 100_000,
                        format_atom_name(&name, &atom.element),
                        "",
                        res_name,
                        chain.id,
                        residue.residue_number.rem_euclid(10_000),
                        "",
                        position.x,
                        position.y,
                        position.z,
                        1.0,
                        0.0,
                        atom.element.symbol.to_uppercase(),
                        ""
                    )?;
                }
                last_residue = Some((res_name, residue.residue_number));
            }

            if let Some((res_name, number)) = last_residue {
                writeln!(
                    writer,
                    "TER   {:>5}      {:>3} {:1}{:>4}",
                    (serial + 1) % 100_000,
                    res_name,
                    chain.id,
                    number.rem_euclid(10_000)
                )?;
            }
        }
        Ok(serials)
    }

    fn write_conect(
        system: &MolecularSystem,
        serials: &HashMap<AtomId, usize>,
        writer: &mut impl Write,
    ) -> Result<(), PdbError> {
        let mut partners: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for bond in system.bonds() {
            let (Some(&s1), Some(&s2)) = (serials.get(&bond.atom1_id), serials.get(&bond.atom2_id))
            else {
                return Err(PdbError::Inconsistency(
                    "Bond references an atom that was not written".to_string(),
                ));
            };
            for _ in 0..bond.order.pdb_multiplicity() {
                partners.entry(s1).or_default().push(s2);
                partners.entry(s2).or_default().push(s1);
            }
        }
        for (serial, bonded) in &partners {
            for chunk in bonded.chunks(4) {
                write!(writer, "CONECT{:>5}", serial % 100_000)?;
                for partner in chunk {
                    write!(writer, "{:>5}", partner % 100_000)?;
                }
                writeln!(writer)?;
            }
        }
        Ok(())
    }

    fn parse_conect(line: &str, line_num: usize) -> Result<Vec<usize>, PdbError> {
        let fixed: Option<Vec<usize>> = (0..5)
            .map(|i| slice_and_trim(line, 6 + i * 5, 11 + i * 5))
            .take_while(|field| !field.is_empty())
            .map(|field| field.parse().ok())
            .collect();
        let serials = match fixed {
            Some(serials) if serials.len() >= 2 => serials,
            _ => line
                .split_whitespace()
                .skip(1)
                .map(str::parse)
                .collect::<Result<Vec<usize>, _>>()
                .map_err(|_| PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::InvalidConectFormat,
                })?,
        };
        if serials.len() < 2 {
            return Err(PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::InvalidConectFormat,
            });
        }
        Ok(serials)
    }

    fn parse_cryst1(line: &str, line_num: usize) -> Result<UnitCell, PdbError> {
        Ok(UnitCell {
            a: parse_float(line, line_num, 6, 15)?,
            b: parse_float(line, line_num, 15, 24)?,
            c: parse_float(line, line_num, 24, 33)?,
            alpha: parse_float(line, line_num, 33, 40)?,
            beta: parse_float(line, line_num, 40, 47)?,
            gamma: parse_float(line, line_num, 47, 54)?,
        })
    }
}

impl MolecularFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        let mut system = MolecularSystem::new();
        let mut metadata = PdbMetadata::default();

        let mut serial_map: HashMap<usize, AtomId> = HashMap::new();
        let mut conect_counts: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        let mut current: Option<ModelState> = None;
        let mut topology_done = false;
        let mut current_residue: Option<(char, isize, String, ResidueId)> = None;
        let mut fallback_serial = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    let x = parse_float(&line, line_num, 30, 38)?;
                    let y = parse_float(&line, line_num, 38, 46)?;
                    let z = parse_float(&line, line_num, 46, 54)?;
                    let position = Point3::new(x, y, z);
                    current
                        .get_or_insert_with(|| ModelState { coords: Vec::new() })
                        .coords
                        .push(position);
                    if topology_done {
                        continue;
                    }

                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let serial_str = slice_and_trim(&line, 6, 11);
                    fallback_serial += 1;
                    let serial = if serial_str.is_empty() {
                        fallback_serial
                    } else {
                        parse_int(&line, line_num, 6, 11)?
                    };
                    let res_name = slice_and_trim(&line, 17, 21).to_string();
                    let chain_char = slice_and_trim(&line, 21, 22).chars().next().unwrap_or('A');
                    let res_seq: isize = parse_int(&line, line_num, 22, 26)?;
                    let element = infer_element(slice_and_trim(&line, 76, 78), name).ok_or_else(
                        || PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::UnknownElement(name.to_string()),
                        },
                    )?;

                    let same_residue = match &current_residue {
                        Some((c, seq, rname, id))
                            if *c == chain_char && *seq == res_seq && *rname == res_name =>
                        {
                            Some(*id)
                        }
                        _ => None,
                    };
                    let residue_id = match same_residue {
                        Some(id) => id,
                        None => {
                            let chain_type = if record_type == "ATOM" {
                                ChainType::Polymer
                            } else if SOLVENT_RESIDUES.contains(&res_name.as_str()) {
                                ChainType::Solvent
                            } else {
                                ChainType::Other
                            };
                            let chain_id = system.add_chain(chain_char, chain_type);
                            let residue_id = system
                                .add_residue(chain_id, res_seq, &res_name)
                                .ok_or_else(|| {
                                    PdbError::Inconsistency(format!(
                                        "Could not create residue {res_seq} on chain {chain_char}"
                                    ))
                                })?;
                            current_residue = Some((chain_char, res_seq, res_name, residue_id));
                            residue_id
                        }
                    };

                    let mut atom = Atom::new(name, residue_id, element, position);
                    atom.serial = serial;
                    let atom_id = system.add_atom_to_residue(residue_id, atom).ok_or_else(|| {
                        PdbError::Inconsistency(format!("Residue for atom {serial} vanished"))
                    })?;
                    if serial_map.insert(serial, atom_id).is_some() {
                        return Err(PdbError::Inconsistency(format!(
                            "Duplicate atom serial: {serial}"
                        )));
                    }
                }
                "MODEL" => {
                    if let Some(model) = current.take() {
                        metadata.frames.push(model.coords);
                        topology_done = true;
                    }
                    current = Some(ModelState { coords: Vec::new() });
                }
                "ENDMDL" => {
                    if let Some(model) = current.take() {
                        metadata.frames.push(model.coords);
                    }
                    topology_done = true;
                }
                "CONECT" => {
                    let serials = Self::parse_conect(&line, line_num)?;
                    let origin = serials[0];
                    for &partner in &serials[1..] {
                        if partner != origin {
                            *conect_counts.entry((origin, partner)).or_insert(0) += 1;
                        }
                    }
                }
                "CRYST1" => {
                    if metadata.unit_cell.is_none() {
                        metadata.unit_cell = Some(Self::parse_cryst1(&line, line_num)?);
                    }
                }
                "TITLE" => {
                    let text = slice_and_trim(&line, 10, line.len());
                    metadata.title = Some(match metadata.title.take() {
                        Some(existing) => format!("{existing} {text}"),
                        None => text.to_string(),
                    });
                }
                "REMARK" => metadata.remarks.push(slice_and_trim(&line, 10, line.len()).to_string()),
                "END" => break,
                _ => {}
            }
        }
        if let Some(model) = current.take() {
            metadata.frames.push(model.coords);
        }

        if serial_map.is_empty() {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }

        let expected = system.atom_count();
        for (idx, frame) in metadata.frames.iter().enumerate() {
            if frame.len() != expected {
                return Err(PdbError::ModelSizeMismatch {
                    model: idx + 1,
                    expected,
                    found: frame.len(),
                });
            }
        }

        // Each bond appears from both ends; the larger count carries the order.
        let mut orders: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for ((a, b), count) in conect_counts {
            let key = (a.min(b), a.max(b));
            let entry = orders.entry(key).or_insert(0);
            *entry = (*entry).max(count);
        }
        for ((a, b), multiplicity) in orders {
            let (Some(&id1), Some(&id2)) = (serial_map.get(&a), serial_map.get(&b)) else {
                debug!(a, b, "Skipping CONECT to an atom outside the first model");
                continue;
            };
            let order = match multiplicity {
                1 => BondOrder::Single,
                2 => BondOrder::Double,
                _ => BondOrder::Triple,
            };
            system.add_bond(id1, id2, order);
        }

        debug!(
            atoms = system.atom_count(),
            residues = system.residue_count(),
            models = metadata.frames.len(),
            "Read PDB structure"
        );
        Ok((system, metadata))
    }

    fn write_to(
        system: &MolecularSystem,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_with_options(system, metadata, &PdbWriteOptions::default(), writer)
    }

    fn write_system_to(
        system: &MolecularSystem,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let metadata = PdbMetadata {
            remarks: vec!["Generated by polymerist".to_string()],
            ..Default::default()
        };
        Self::write_to(system, &metadata, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};
    use tempfile::tempdir;

    fn element(symbol: &str) -> Element {
        Element::from_symbol(symbol).unwrap()
    }

    fn ethanol_like() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A', ChainType::Polymer);
        let head = system.add_residue(chain, 1, "RES").unwrap();
        let tail = system.add_residue(chain, 2, "OXY").unwrap();
        let c1 = system
            .add_atom_to_residue(head, Atom::new("C", head, element("C"), Point3::new(0.0, 0.0, 0.0)))
            .unwrap();
        let c2 = system
            .add_atom_to_residue(head, Atom::new("C", head, element("C"), Point3::new(1.5, 0.0, 0.0)))
            .unwrap();
        let o = system
            .add_atom_to_residue(tail, Atom::new("O", tail, element("O"), Point3::new(2.2, 1.2, 0.0)))
            .unwrap();
        system.add_bond(c1, c2, BondOrder::Single).unwrap();
        system.add_bond(c2, o, BondOrder::Double).unwrap();
        system
    }

    fn write_to_string(system: &MolecularSystem, metadata: &PdbMetadata) -> String {
        let mut buffer = Vec::new();
        PdbFile::write_to(system, metadata, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn writes_uniquified_names_and_mapped_residues() {
        let output = write_to_string(&ethanol_like(), &PdbMetadata::default());
        let atom_lines: Vec<&str> = output.lines().filter(|l| l.starts_with("ATOM")).collect();
        assert_eq!(atom_lines.len(), 3);
        assert_eq!(&atom_lines[0][12..16], " C01");
        assert_eq!(&atom_lines[1][12..16], " C02");
        assert_eq!(&atom_lines[2][12..16], " O01");
        assert_eq!(&atom_lines[0][17..20], "Pol");
        assert_eq!(&atom_lines[2][17..20], "OXY");
        assert_eq!(&atom_lines[0][76..78], " C");
        assert!(output.contains("TER"));
        assert!(output.trim_end().ends_with("END"));
    }

    #[test]
    fn residue_names_are_truncated_to_three_columns() {
        let mut options = PdbWriteOptions::default();
        options
            .residue_name_map
            .insert("OXY".to_string(), "OXYGEN".to_string());
        let mut buffer = Vec::new();
        PdbFile::write_with_options(&ethanol_like(), &PdbMetadata::default(), &options, &mut buffer)
            .unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let last_atom = output.lines().filter(|l| l.starts_with("ATOM")).last().unwrap();
        assert_eq!(&last_atom[17..20], "OXY");
        assert!(!output.contains("OXYGEN"));
    }

    #[test]
    fn double_bonds_are_encoded_as_repeated_conect_entries() {
        let output = write_to_string(&ethanol_like(), &PdbMetadata::default());
        let conect: Vec<&str> = output.lines().filter(|l| l.starts_with("CONECT")).collect();
        assert!(conect.contains(&"CONECT    2    1    3    3"));
        assert!(conect.contains(&"CONECT    3    2    2"));
    }

    #[test]
    fn round_trip_preserves_topology_and_cell() {
        let metadata = PdbMetadata {
            unit_cell: Some(UnitCell::orthorhombic(30.0, 31.0, 32.0)),
            ..Default::default()
        };
        let output = write_to_string(&ethanol_like(), &metadata);
        let mut reader = BufReader::new(Cursor::new(output));
        let (system, read_meta) = PdbFile::read_from(&mut reader).unwrap();

        assert_eq!(system.atom_count(), 3);
        assert_eq!(system.residue_count(), 2);
        assert_eq!(system.bonds().len(), 2);
        assert!(system.bonds().iter().any(|b| b.order == BondOrder::Double));
        let cell = read_meta.unit_cell.unwrap();
        assert_eq!((cell.a, cell.b, cell.c), (30.0, 31.0, 32.0));
        assert!(cell.is_orthorhombic());
        assert_eq!(read_meta.frames.len(), 1);
    }

    #[test]
    fn reads_multiple_models_as_frames() {
        let system = ethanol_like();
        let frames: Vec<Vec<Point3<f64>>> = (0..3)
            .map(|i| {
                system
                    .ordered_atom_ids()
                    .iter()
                    .map(|&id| system.atom(id).unwrap().position + Vector3::new(i as f64, 0.0, 0.0))
                    .collect()
            })
            .collect();
        let mut buffer = Vec::new();
        PdbFile::write_models(
            &system,
            &PdbMetadata::default(),
            &frames,
            &PdbWriteOptions::default(),
            &mut buffer,
        )
        .unwrap();

        let (read, meta) = PdbFile::read_from(&mut BufReader::new(Cursor::new(buffer))).unwrap();
        assert_eq!(read.atom_count(), 3);
        assert_eq!(meta.frames.len(), 3);
        assert!((meta.frames[2][0].x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_models_of_different_size() {
        let content = "\
MODEL        1
ATOM      1  C01 Pol A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  C02 Pol A   1       1.500   0.000   0.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      1  C01 Pol A   1       0.000   0.000   0.000  1.00  0.00           C
ENDMDL
END
";
        let result = PdbFile::read_from(&mut BufReader::new(Cursor::new(content)));
        assert!(matches!(
            result,
            Err(PdbError::ModelSizeMismatch {
                model: 2,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn infers_elements_from_atom_names() {
        let content = "\
HETATM    1 CL1  LIG B   1       0.000   0.000   0.000  1.00  0.00
HETATM    2  O   HOH C   2       1.000   0.000   0.000  1.00  0.00
END
";
        let (system, _) = PdbFile::read_from(&mut BufReader::new(Cursor::new(content))).unwrap();
        let symbols: Vec<&str> = system
            .ordered_atom_ids()
            .iter()
            .map(|&id| system.atom(id).unwrap().element.symbol)
            .collect();
        assert_eq!(symbols, vec!["Cl", "O"]);
        let water_chain = system.find_chain_by_id('C').unwrap();
        assert_eq!(system.chain(water_chain).unwrap().chain_type, ChainType::Solvent);
    }

    #[test]
    fn reports_malformed_coordinates() {
        let content = "ATOM      1  C01 Pol A   1       0.000   abc     0.000  1.00  0.00           C\n";
        let result = PdbFile::read_from(&mut BufReader::new(Cursor::new(content)));
        assert!(matches!(
            result,
            Err(PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::InvalidFloat { .. }
            })
        ));
    }

    #[test]
    fn missing_atoms_is_an_error() {
        let result = PdbFile::read_from(&mut BufReader::new(Cursor::new("REMARK nothing\nEND\n")));
        assert!(matches!(result, Err(PdbError::MissingRecord(_))));
    }

    #[test]
    fn uniquify_renames_atoms_in_place() {
        let mut system = ethanol_like();
        uniquify_atom_names(&mut system, 3);
        let names: Vec<String> = system
            .ordered_atom_ids()
            .iter()
            .map(|&id| system.atom(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["C001", "C002", "O001"]);
    }

    #[test]
    fn path_helpers_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain.pdb");
        PdbFile::write_system_to_path(&ethanol_like(), &path).unwrap();
        let (system, metadata) = PdbFile::read_from_path(&path).unwrap();
        assert_eq!(system.atom_count(), 3);
        assert_eq!(metadata.remarks, vec!["Generated by polymerist".to_string()]);
    }
}
