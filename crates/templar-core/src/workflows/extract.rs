use crate::core::groups::catalog::GroupCatalog;
use crate::core::toolkit::ChemistryToolkit;
use crate::engine::canon::canonicalize_template;
use crate::engine::changes::{StoichiometryWarning, detect_changed_atoms};
use crate::engine::config::ExtractionConfig;
use crate::engine::error::ExtractionError;
use crate::engine::fragments::FragmentSelector;
use crate::engine::retro::convert_to_retro;
use std::fmt;
use tracing::{debug, instrument, trace};

/// Stages one record passes through. Any stage may end in a skip instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    Parsed,
    Validated,
    ChangeDetected,
    FragmentsBuilt,
    Canonicalized,
    Retro,
    Recorded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Parsed => "parsed",
            Self::Validated => "validated",
            Self::ChangeDetected => "change-detected",
            Self::FragmentsBuilt => "fragments-built",
            Self::Canonicalized => "canonicalized",
            Self::Retro => "retro",
            Self::Recorded => "recorded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTemplate {
    /// Canonical forward template.
    pub forward: String,
    /// Retrosynthetic form of `forward`; the aggregation key.
    pub retro: String,
    pub changed_atoms: usize,
    pub warnings: Vec<StoichiometryWarning>,
}

/// Runs one reaction through every stage up to its retro template.
pub struct TemplateExtractor<'a, T: ChemistryToolkit> {
    toolkit: &'a T,
    catalog: &'a GroupCatalog,
    config: &'a ExtractionConfig,
}

impl<'a, T: ChemistryToolkit> TemplateExtractor<'a, T> {
    pub fn new(toolkit: &'a T, catalog: &'a GroupCatalog, config: &'a ExtractionConfig) -> Self {
        Self {
            toolkit,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        self.config
    }

    /// Extracts the canonical template of one `reactants>agents>products` text.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] naming the stage at which the record was
    /// rejected.
    pub fn extract(&self, reaction: &str) -> Result<ExtractedTemplate, ExtractionError> {
        self.extract_flagged(reaction, &mut false)
    }

    /// Like [`TemplateExtractor::extract`], also setting `warned` when change
    /// detection raised a stoichiometry warning, even if the record is
    /// rejected at a later stage.
    #[instrument(skip_all, level = "debug", name = "extract_template")]
    pub fn extract_flagged(
        &self,
        reaction: &str,
        warned: &mut bool,
    ) -> Result<ExtractedTemplate, ExtractionError> {
        let mut stage = Stage::Start;
        let mut advance = |next: Stage| {
            trace!(from = %stage, to = %next, "Stage transition");
            stage = next;
        };

        let mut record = self
            .toolkit
            .parse_reaction(reaction)
            .map_err(ExtractionError::Parse)?;
        advance(Stage::Parsed);

        for molecule in record.molecules_mut() {
            self.toolkit
                .sanitize(molecule)
                .map_err(ExtractionError::Parse)?;
        }
        advance(Stage::Validated);

        let changed = detect_changed_atoms(
            &record.reactants,
            &record.products,
            self.config.comparison_level,
        )?;
        *warned = !changed.warnings.is_empty();
        if changed.is_empty() {
            return Err(ExtractionError::NoChangeDetected);
        }
        debug!(labels = ?changed.labels, "Changed atoms");
        advance(Stage::ChangeDetected);

        let selector = FragmentSelector::new(self.toolkit, self.catalog, self.config.super_general);
        let (reactant_text, product_text) = selector.template_sides(
            &record.reactants,
            &record.products,
            &changed,
            self.config.reactant_radius,
            self.config.product_radius,
        )?;
        let forward = format!("{reactant_text}>>{product_text}");
        if reactant_text.is_empty()
            || product_text.is_empty()
            || !self.toolkit.is_valid_template(&forward)
        {
            return Err(ExtractionError::TemplateValidation { template: forward });
        }
        advance(Stage::FragmentsBuilt);

        let canonical = canonicalize_template(&forward);
        advance(Stage::Canonicalized);

        let retro = convert_to_retro(&canonical).ok_or_else(|| {
            ExtractionError::TemplateValidation {
                template: canonical.clone(),
            }
        })?;
        advance(Stage::Retro);

        debug!(template = %retro, "Template extracted");
        Ok(ExtractedTemplate {
            forward: canonical,
            retro,
            changed_atoms: changed.labels.len(),
            warnings: changed.warnings,
        })
    }
}
