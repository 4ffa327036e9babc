use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Occurrence counts keyed by canonical retro template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateTable {
    counts: BTreeMap<String, u64>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    template: &'a str,
    count: u64,
}

impl TemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence and returns the new count.
    pub fn record(&mut self, template: &str) -> u64 {
        let count = self.counts.entry(template.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, template: &str) -> u64 {
        self.counts.get(template).copied().unwrap_or(0)
    }

    /// Number of distinct templates.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Templates by descending count, ties broken by template text.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> = self.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// Writes `template,count` rows in ranked order, keeping rows with at
    /// least `min_count` occurrences and at most `top` rows.
    pub fn write_csv<W: Write>(
        &self,
        writer: W,
        min_count: u64,
        top: Option<usize>,
    ) -> Result<(), csv::Error> {
        let mut csv = csv::Writer::from_writer(writer);
        let rows = self
            .ranked()
            .into_iter()
            .filter(|&(_, count)| count >= min_count)
            .take(top.unwrap_or(usize::MAX));
        for (template, count) in rows {
            csv.serialize(CsvRow { template, count })?;
        }
        csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_increments_from_zero() {
        let mut table = TemplateTable::new();
        assert_eq!(table.count("a>>b"), 0);
        assert_eq!(table.record("a>>b"), 1);
        assert_eq!(table.record("a>>b"), 2);
        table.record("c>>d");
        assert_eq!(table.len(), 2);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn ranked_orders_by_count_then_text() {
        let mut table = TemplateTable::new();
        for t in ["b", "a", "c", "c"] {
            table.record(t);
        }
        assert_eq!(table.ranked(), vec![("c", 2), ("a", 1), ("b", 1)]);
    }

    #[test]
    fn json_form_is_a_plain_object() {
        let mut table = TemplateTable::new();
        table.record("[C:1]>>[C:1]");
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"[C:1]>>[C:1]":1}"#);
        let back: TemplateTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn csv_has_header_and_ranked_rows() {
        let mut table = TemplateTable::new();
        table.record("x>>y");
        table.record("p>>q");
        table.record("p>>q");
        let mut out = Vec::new();
        table.write_csv(&mut out, 0, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "template,count\np>>q,2\nx>>y,1\n");
    }

    #[test]
    fn csv_filters_by_count_and_rank() {
        let mut table = TemplateTable::new();
        for t in ["a", "a", "a", "b", "b", "c"] {
            table.record(t);
        }
        let mut out = Vec::new();
        table.write_csv(&mut out, 2, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "template,count\na,3\nb,2\n");

        let mut out = Vec::new();
        table.write_csv(&mut out, 0, Some(1)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "template,count\na,3\n");
    }
}
