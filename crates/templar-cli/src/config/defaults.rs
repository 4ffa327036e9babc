use templar::engine::config::ComparisonLevel;

pub struct DefaultsConfig {
    pub super_general: bool,
    pub reactant_radius: usize,
    pub product_radius: usize,
    pub comparison_level: ComparisonLevel,
    pub checkpoint_interval: u64,
    pub progress_interval: u64,
    pub table_path: &'static str,
    pub cursor_path: &'static str,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            super_general: true,
            reactant_radius: 1,
            product_radius: 0,
            comparison_level: ComparisonLevel::Bonds,
            checkpoint_interval: 10_000,
            progress_interval: 1_000,
            table_path: "templates.json",
            cursor_path: "templates.cursor.json",
        }
    }
}
