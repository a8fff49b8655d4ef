use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to an atom in a `MolecularSystem`; survives removal of other atoms.
    pub struct AtomId;
    /// Stable handle to a residue (one placed monomer unit in a built chain).
    pub struct ResidueId;
    /// Stable handle to a chain.
    pub struct ChainId;
}
