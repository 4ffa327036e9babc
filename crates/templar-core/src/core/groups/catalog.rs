use super::matcher::find_matches;
use crate::core::io::query::{QueryError, QueryMolecule, parse_query};
use crate::core::models::molecule::Molecule;
use petgraph::graph::NodeIndex;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};

/// Built-in functional groups as `(name, pattern)`, in match order.
pub static BUILTIN_GROUPS: &[(&str, &str)] = &[
    ("acid chloride", "C(=O)Cl"),
    ("carboxylic acid", "C(=O)[O;H,-]"),
    ("sulfonyl chloride", "[$(S-!@[#6])](=O)(=O)(Cl)"),
    ("boronic acid", "[$(B-!@[#6])](O)(O)"),
    ("isocyanate", "[$(N-!@[#6])](=!@C=!@O)"),
    ("azide", "[N;H0;$(N-[#6]);D2]=[N;D2]=[N;D1]"),
    ("N-bromosuccinimide", "O=C1N(Br)C(=O)CC1"),
    ("carbonyl", "C=O"),
    ("thionyl chloride", "ClS(Cl)=O"),
    ("Grignard reagent", "[Mg][Br,Cl]"),
    ("sulfonate", "[#6]S(=O)(=O)[O]"),
    ("sulfate", "[O]S(=O)(=O)[O]"),
    ("diazoalkane", "[N-]=[N+]=[C]"),
];

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GroupDefinition {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(rename = "group", default)]
    groups: Vec<GroupDefinition>,
}

#[derive(Debug, Clone)]
pub struct FunctionalGroup {
    pub name: String,
    pub pattern: String,
    query: QueryMolecule,
}

impl FunctionalGroup {
    pub fn new(name: &str, pattern: &str) -> Result<Self, QueryError> {
        Ok(Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            query: parse_query(pattern)?,
        })
    }

    pub fn query(&self) -> &QueryMolecule {
        &self.query
    }
}

/// An ordered set of functional-group patterns.
#[derive(Debug, Clone, Default)]
pub struct GroupCatalog {
    groups: Vec<FunctionalGroup>,
}

impl GroupCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let groups = BUILTIN_GROUPS
            .iter()
            .filter_map(|(name, pattern)| match FunctionalGroup::new(name, pattern) {
                Ok(group) => Some(group),
                Err(e) => {
                    error!(group = name, "Built-in group pattern failed to parse: {e}");
                    None
                }
            })
            .collect();
        Self { groups }
    }

    /// Reads `[[group]]` tables (`name`, `pattern`) from a TOML file.
    pub fn load(path: &Path) -> Result<Self, CatalogLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: CatalogFile = toml::from_str(&content).map_err(|e| CatalogLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let catalog = Self::from_definitions(file.groups)?;
        debug!(path = %path.display(), groups = catalog.len(), "Loaded functional-group catalog");
        Ok(catalog)
    }

    pub fn from_definitions(
        definitions: impl IntoIterator<Item = GroupDefinition>,
    ) -> Result<Self, CatalogLoadError> {
        let mut catalog = Self::empty();
        for def in definitions {
            catalog.push(def)?;
        }
        Ok(catalog)
    }

    pub fn push(&mut self, definition: GroupDefinition) -> Result<(), CatalogLoadError> {
        let group = FunctionalGroup::new(&definition.name, &definition.pattern).map_err(|e| {
            CatalogLoadError::Pattern {
                name: definition.name.clone(),
                pattern: definition.pattern.clone(),
                source: e,
            }
        })?;
        self.groups.push(group);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionalGroup> {
        self.groups.iter()
    }

    /// Every match of every group in `molecule`, in catalog order. Each
    /// cluster is the set of atoms one match covers.
    pub fn clusters_in(&self, molecule: &Molecule) -> Vec<Vec<NodeIndex>> {
        self.groups
            .iter()
            .flat_map(|group| find_matches(molecule, &group.query))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid pattern '{pattern}' for group '{name}': {source}")]
    Pattern {
        name: String,
        pattern: String,
        source: QueryError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::sanitize::sanitize;
    use crate::core::io::smiles::parse_smiles;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn mol(text: &str) -> Molecule {
        let mut m = parse_smiles(text).unwrap();
        sanitize(&mut m).unwrap();
        m
    }

    #[test]
    fn every_builtin_pattern_parses() {
        assert_eq!(GroupCatalog::builtin().len(), BUILTIN_GROUPS.len());
    }

    #[test]
    fn acid_chloride_molecule_yields_acid_chloride_and_carbonyl_clusters() {
        let clusters = GroupCatalog::builtin().clusters_in(&mol("CC(=O)Cl"));
        let sets: Vec<Vec<usize>> = clusters
            .into_iter()
            .map(|c| {
                let mut v: Vec<usize> = c.into_iter().map(|n| n.index()).collect();
                v.sort();
                v
            })
            .collect();
        assert_eq!(sets, vec![vec![1, 2, 3], vec![1, 2]]);
    }

    #[test]
    fn empty_catalog_finds_nothing() {
        assert!(GroupCatalog::empty().clusters_in(&mol("CC(=O)Cl")).is_empty());
    }

    #[test]
    fn load_reads_group_tables() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[group]]
name = "nitrile"
pattern = "C#N"

[[group]]
name = "alcohol"
pattern = "[C;!$(C=O)][OH]"
"#
        )
        .unwrap();
        let catalog = GroupCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        let names: Vec<_> = catalog.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["nitrile", "alcohol"]);
        assert_eq!(catalog.clusters_in(&mol("CC#N")).len(), 1);
        assert_eq!(catalog.clusters_in(&mol("CCO")).len(), 1);
        assert_eq!(catalog.clusters_in(&mol("CC(=O)O")).len(), 0);
    }

    #[test]
    fn load_reports_bad_patterns_and_missing_files() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[group]]\nname = \"broken\"\npattern = \"C(\"").unwrap();
        assert!(matches!(
            GroupCatalog::load(file.path()),
            Err(CatalogLoadError::Pattern { .. })
        ));
        assert!(matches!(
            GroupCatalog::load(Path::new("/nonexistent/groups.toml")),
            Err(CatalogLoadError::Io { .. })
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[group]]\nname = \"x\"\npattern = \"C\"\nweight = 2").unwrap();
        assert!(matches!(
            GroupCatalog::load(file.path()),
            Err(CatalogLoadError::Toml { .. })
        ));
    }
}
