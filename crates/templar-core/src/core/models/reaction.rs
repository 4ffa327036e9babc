use super::molecule::Molecule;

/// A parsed reaction: reactant, agent and product molecules.
///
/// Each dot-separated component of the source text is its own molecule.
#[derive(Debug, Clone, Default)]
pub struct ReactionRecord {
    pub reactants: Vec<Molecule>,
    pub agents: Vec<Molecule>,
    pub products: Vec<Molecule>,
}

impl ReactionRecord {
    pub fn molecules(&self) -> impl Iterator<Item = &Molecule> {
        self.reactants
            .iter()
            .chain(self.agents.iter())
            .chain(self.products.iter())
    }

    pub fn molecules_mut(&mut self) -> impl Iterator<Item = &mut Molecule> {
        self.reactants
            .iter_mut()
            .chain(self.agents.iter_mut())
            .chain(self.products.iter_mut())
    }
}
