use super::building::ChainPlan;
use super::config::ConfigError;
use super::error::EngineError;
use crate::core::monomers::group::MonomerGroup;
use tracing::debug;

/// Number of atoms in a linear chain of degree of polymerization `dop`.
///
/// Counts every real atom of every unit, the hydrogens implied by bracket `H`
/// counts, and the hydrogens capping open chain ends. This matches the size of
/// a chain built with both end capping and hydrogen expansion enabled.
pub fn estimate_chain_len_linear(
    group: &MonomerGroup,
    dop: usize,
    sequence: &str,
) -> Result<usize, EngineError> {
    ChainPlan::resolve(group, sequence)?.atom_count(dop)
}

/// Largest degree of polymerization whose linear chain stays within `n_atoms`.
///
/// Fails when even the shortest chain (2 units) is too large.
pub fn estimate_dop_for_atom_count(
    group: &MonomerGroup,
    n_atoms: usize,
    sequence: &str,
) -> Result<usize, EngineError> {
    const MIN_DOP: usize = 2;

    let plan = ChainPlan::resolve(group, sequence)?;
    let mut count = plan.atom_count(MIN_DOP)?;
    if count > n_atoms {
        return Err(ConfigError::InvalidParameter {
            name: "n_atoms",
            reason: format!("the shortest chain already has {count} atoms, above the requested {n_atoms}"),
        }
        .into());
    }
    let block_atoms = plan.block_atom_count();
    if block_atoms == 0 {
        return Ok(MIN_DOP);
    }

    // Each step of the degree of polymerization adds one copy of the block.
    let extra = (n_atoms - count) / block_atoms;
    let dop = MIN_DOP + extra;
    count += extra * block_atoms;
    debug!(dop, n_atoms = count, target = n_atoms, "Estimated degree of polymerization");
    Ok(dop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::building::build_linear_polymer;
    use crate::core::monomers::group::EndGroupPosition;
    use crate::engine::config::LinearBuildConfigBuilder;
    use indexmap::IndexMap;
    use std::collections::BTreeMap;

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

    fn capped() -> MonomerGroup {
        // CH3-[CH2CH2]n-CH3 written with explicit hydrogens.
        let orient = BTreeMap::from([
            (EndGroupPosition::Head, "END".to_string()),
            (EndGroupPosition::Tail, "END".to_string()),
        ]);
        group(&[
            ("MID", &["[*]C([H])([H])C([H])([H])[*]"]),
            ("END", &["[*]C([H])([H])[H]"]),
        ])
        .with_term_orient(orient)
    }

    #[test]
    fn chain_length_counts_units_and_caps() {
        let g = capped();
        // Two 4-atom end groups plus 6-atom middles.
        assert_eq!(estimate_chain_len_linear(&g, 2, "A").unwrap(), 8);
        assert_eq!(estimate_chain_len_linear(&g, 5, "A").unwrap(), 26);

        let uncapped = group(&[("MID", &["[*]C[*]"])]);
        assert_eq!(estimate_chain_len_linear(&uncapped, 3, "A").unwrap(), 5);
    }

    #[test]
    fn estimate_matches_built_chain() {
        let g = group(&[("MID", &["[*][CH2][CH2][*]"]), ("END", &["[*][CH3]"])]);
        let config = LinearBuildConfigBuilder::new()
            .degree_of_polymerization(6)
            .add_hydrogens(true)
            .expand_hydrogens(true)
            .build()
            .unwrap();
        let built = build_linear_polymer(&g, &config).unwrap();
        assert_eq!(
            estimate_chain_len_linear(&g, 6, "A").unwrap(),
            built.atom_count()
        );
    }

    #[test]
    fn block_sequences_count_whole_repeats() {
        let g = group(&[
            ("A", &["[*]C[*]"]),
            ("B", &["[*]OC[*]"]),
            ("END", &["[*]C([H])([H])[H]"]),
        ])
        .with_term_orient(BTreeMap::from([
            (EndGroupPosition::Head, "END".to_string()),
            (EndGroupPosition::Tail, "END".to_string()),
        ]));
        // Two 4-atom ends plus (dop - 2) copies of the 3-atom "AB" block.
        assert_eq!(estimate_chain_len_linear(&g, 4, "AB").unwrap(), 14);
        assert_eq!(estimate_dop_for_atom_count(&g, 16, "AB").unwrap(), 4);
        assert_eq!(estimate_dop_for_atom_count(&g, 17, "AB").unwrap(), 5);
    }

    #[test]
    fn dop_estimate_is_the_largest_fitting_chain() {
        let g = capped();
        assert_eq!(estimate_dop_for_atom_count(&g, 8, "A").unwrap(), 2);
        assert_eq!(estimate_dop_for_atom_count(&g, 13, "A").unwrap(), 2);
        assert_eq!(estimate_dop_for_atom_count(&g, 14, "A").unwrap(), 3);
        assert_eq!(estimate_dop_for_atom_count(&g, 100, "A").unwrap(), 17);
    }

    #[test]
    fn dop_estimate_rejects_budgets_below_the_shortest_chain() {
        let result = estimate_dop_for_atom_count(&capped(), 5, "A");
        assert!(matches!(
            result,
            Err(EngineError::Config {
                source: ConfigError::InvalidParameter { name: "n_atoms", .. }
            })
        ));
    }
}
