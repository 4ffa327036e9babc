use super::load_catalog;
use crate::cli::ExtractArgs;
use crate::config::builder::build_extraction_config;
use crate::error::Result;
use templar::core::toolkit::SmilesToolkit;
use templar::workflows::extract::TemplateExtractor;
use tracing::{info, warn};

pub fn run(args: ExtractArgs) -> Result<()> {
    let settings = build_extraction_config(&args.extraction)?;
    let catalog = load_catalog(settings.groups_path.as_deref())?;

    info!("Extracting template from {}", args.reaction);
    let extractor = TemplateExtractor::new(&SmilesToolkit, &catalog, &settings.core_config);
    let template = extractor.extract(&args.reaction)?;

    for warning in &template.warnings {
        warn!("Stoichiometry: {}", warning);
    }
    println!("Changed atoms: {}", template.changed_atoms);
    println!("Forward: {}", template.forward);
    println!("Retro:   {}", template.retro);
    Ok(())
}
