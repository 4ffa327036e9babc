use super::extract::{Stage, TemplateExtractor};
use crate::core::groups::catalog::GroupCatalog;
use crate::core::toolkit::ChemistryToolkit;
use crate::engine::checkpoint::{CheckpointStore, ScanCursor};
use crate::engine::config::ScanConfig;
use crate::engine::error::{ScanError, SkipReason};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::table::TemplateTable;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Counters for the records read during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub attempted: u64,
    pub recorded: u64,
    pub skipped: BTreeMap<SkipReason, u64>,
    /// Records that raised a stoichiometry warning, whether recorded or not.
    pub stoichiometry_warnings: u64,
}

impl ScanStats {
    pub fn skipped(&self, reason: SkipReason) -> u64 {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Share of attempted records, in percent.
    pub fn percent(&self, count: u64) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.attempted as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub stats: ScanStats,
    pub resumed_from: ScanCursor,
    pub cursor: ScanCursor,
    pub unique_templates: usize,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded { template: String, count: u64 },
    Skipped(SkipReason),
}

/// Aggregates retro templates over a corpus with one record per line,
/// checkpointing the table and the byte cursor as it goes.
pub struct TemplateScanner<'a, T: ChemistryToolkit> {
    extractor: TemplateExtractor<'a, T>,
    config: &'a ScanConfig,
    store: CheckpointStore,
    reporter: &'a ProgressReporter<'a>,
    table: TemplateTable,
    cursor: ScanCursor,
    resumed_from: ScanCursor,
    stats: ScanStats,
}

impl<'a, T: ChemistryToolkit> TemplateScanner<'a, T> {
    /// Loads the checkpoint named by `config`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Checkpoint`] if existing checkpoint files cannot
    /// be read.
    pub fn open(
        toolkit: &'a T,
        catalog: &'a GroupCatalog,
        config: &'a ScanConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Result<Self, ScanError> {
        let store = CheckpointStore::new(&config.table_path, &config.cursor_path);
        let checkpoint = store.load()?;
        Ok(Self {
            extractor: TemplateExtractor::new(toolkit, catalog, &config.extraction),
            config,
            store,
            reporter,
            table: checkpoint.table,
            cursor: checkpoint.cursor,
            resumed_from: checkpoint.cursor,
            stats: ScanStats::default(),
        })
    }

    pub fn table(&self) -> &TemplateTable {
        &self.table
    }

    pub fn cursor(&self) -> ScanCursor {
        self.cursor
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Extracts and tallies the reaction in one corpus line. Only the first
    /// whitespace-separated token is read.
    pub fn process_record(&mut self, line: &str) -> RecordOutcome {
        self.stats.attempted += 1;
        let reaction = line.split_whitespace().next().unwrap_or_default();
        let mut warned = false;
        let outcome = self.extractor.extract_flagged(reaction, &mut warned);
        self.stats.stoichiometry_warnings += u64::from(warned);
        match outcome {
            Ok(template) => {
                let count = self.table.record(&template.retro);
                self.stats.recorded += 1;
                debug!(stage = %Stage::Recorded, count, "Template recorded");
                RecordOutcome::Recorded {
                    template: template.retro,
                    count,
                }
            }
            Err(e) => {
                let reason = e.reason();
                debug!(record = self.cursor.records, %reason, "Record skipped: {e}");
                *self.stats.skipped.entry(reason).or_default() += 1;
                RecordOutcome::Skipped(reason)
            }
        }
    }

    /// Persists the table and the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Checkpoint`] if either file cannot be written.
    pub fn checkpoint(&self) -> Result<(), ScanError> {
        self.store.save(&self.table, self.cursor)?;
        info!(
            records = self.cursor.records,
            offset = self.cursor.offset,
            templates = self.table.len(),
            "Checkpoint saved"
        );
        self.reporter.report(Progress::Checkpoint {
            records: self.cursor.records,
            cursor: self.cursor.offset,
        });
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        self.config
            .record_limit
            .is_some_and(|limit| self.stats.attempted >= limit)
    }

    /// Scans `corpus` from the checkpointed offset to its end or to the
    /// record limit, then writes a final checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the corpus cannot be read or a checkpoint
    /// cannot be written. Per-record failures are counted, not returned.
    #[instrument(skip_all, name = "scan_workflow")]
    pub fn run<R: Read + Seek>(&mut self, corpus: R) -> Result<ScanSummary, ScanError> {
        let mut reader = BufReader::new(corpus);
        let read_error =
            |offset: u64| move |source: std::io::Error| ScanError::CorpusRead { offset, source };
        let total_bytes = reader.seek(SeekFrom::End(0)).map_err(read_error(0))?;
        reader
            .seek(SeekFrom::Start(self.cursor.offset))
            .map_err(read_error(self.cursor.offset))?;

        self.reporter.report(Progress::PhaseStart {
            name: "Template Scan",
        });
        self.reporter.report(Progress::TaskStart {
            total_steps: total_bytes,
        });
        self.reporter.report(Progress::TaskAdvance {
            position: self.cursor.offset,
        });
        if self.cursor.offset > 0 {
            info!(
                offset = self.cursor.offset,
                records = self.cursor.records,
                "Resuming scan"
            );
        }

        let mut buffer = Vec::new();
        while !self.limit_reached() {
            buffer.clear();
            let read = reader
                .read_until(b'\n', &mut buffer)
                .map_err(read_error(self.cursor.offset))?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buffer);
            let is_blank = line.trim().is_empty();
            if !is_blank {
                self.process_record(&line);
                self.cursor.records += 1;
            }
            self.cursor.offset += read as u64;
            if is_blank {
                continue;
            }

            if self.cursor.records % self.config.progress_interval == 0 {
                info!(
                    records = self.cursor.records,
                    recorded = self.stats.recorded,
                    templates = self.table.len(),
                    "Scan progress"
                );
                self.reporter.report(Progress::TaskAdvance {
                    position: self.cursor.offset,
                });
            }
            if self.cursor.records % self.config.checkpoint_interval == 0 {
                self.checkpoint()?;
            }
        }

        if self.limit_reached() {
            info!(limit = ?self.config.record_limit, "Record limit reached");
        }
        self.checkpoint()?;
        self.reporter.report(Progress::TaskAdvance {
            position: self.cursor.offset,
        });
        self.reporter.report(Progress::TaskFinish);
        self.reporter.report(Progress::PhaseFinish);

        if self.stats.stoichiometry_warnings > 0 {
            warn!(
                count = self.stats.stoichiometry_warnings,
                "Records with mismatched map labels were read"
            );
        }
        Ok(self.summary())
    }

    /// Opens `path` and scans it.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::CorpusOpen`] if the file cannot be opened, or any
    /// error of [`TemplateScanner::run`].
    pub fn run_path(&mut self, path: &Path) -> Result<ScanSummary, ScanError> {
        let file = File::open(path).map_err(|source| ScanError::CorpusOpen {
            path: path.display().to_string(),
            source,
        })?;
        self.run(file)
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            stats: self.stats.clone(),
            resumed_from: self.resumed_from,
            cursor: self.cursor,
            unique_templates: self.table.len(),
            total_count: self.table.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::toolkit::SmilesToolkit;
    use crate::engine::config::{ExtractionConfig, ScanConfigBuilder};
    use std::io::{self, Cursor};
    use std::sync::{Arc, Mutex};
    use tempfile::{TempDir, tempdir};

    const AMIDE: &str = "[CH3:1][C:2](=[O:3])[Cl:4].[NH3:5]>>[CH3:1][C:2](=[O:3])[NH2:5]";
    const AMIDE_REORDERED: &str =
        "[NH3:7].[CH3:3][C:9](=[O:4])[Cl:8]>>[CH3:3][C:9](=[O:4])[NH2:7]";
    const UNMAPPED: &str = "[CH3:1][OH:2]>>[CH3:1]O";
    const HYDROGENATION: &str = "[CH2:1]=[CH2:2]>>[CH3:1][CH3:2]";

    fn config_in(dir: &TempDir, checkpoint_interval: u64, limit: Option<u64>) -> ScanConfig {
        ScanConfigBuilder::new()
            .extraction(ExtractionConfig::default())
            .checkpoint_interval(checkpoint_interval)
            .progress_interval(1)
            .record_limit(limit)
            .table_path(dir.path().join("table.json"))
            .cursor_path(dir.path().join("cursor.json"))
            .build()
            .unwrap()
    }

    fn corpus(lines: &[&str]) -> Vec<u8> {
        lines
            .iter()
            .map(|l| format!("{l} extra-column\n"))
            .collect::<String>()
            .into_bytes()
    }

    fn scan(
        dir: &TempDir,
        data: &[u8],
        interval: u64,
        limit: Option<u64>,
    ) -> (TemplateTable, ScanSummary) {
        let config = config_in(dir, interval, limit);
        let catalog = GroupCatalog::builtin();
        let reporter = ProgressReporter::new();
        let mut scanner = TemplateScanner::open(&SmilesToolkit, &catalog, &config, &reporter).unwrap();
        let summary = scanner.run(Cursor::new(data.to_vec())).unwrap();
        (scanner.table().clone(), summary)
    }

    /// Serves bytes until `fail_at`, then fails every read.
    struct FailingReader {
        inner: Cursor<Vec<u8>>,
        fail_at: u64,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let pos = self.inner.position();
            if pos >= self.fail_at {
                return Err(io::Error::other("disk went away"));
            }
            let room = (self.fail_at - pos) as usize;
            let len = buf.len().min(room);
            self.inner.read(&mut buf[..len])
        }
    }

    impl Seek for FailingReader {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn equivalent_records_share_one_key() {
        let dir = tempdir().unwrap();
        let (table, summary) = scan(&dir, &corpus(&[AMIDE, AMIDE_REORDERED]), 10, None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.total(), 2);
        assert_eq!(summary.stats.recorded, 2);
        assert_eq!(summary.unique_templates, 1);
    }

    #[test]
    fn unmapped_product_leaves_table_unchanged() {
        let dir = tempdir().unwrap();
        let (table, summary) = scan(&dir, &corpus(&[UNMAPPED]), 10, None);
        assert!(table.is_empty());
        assert_eq!(summary.stats.attempted, 1);
        assert_eq!(summary.stats.skipped(SkipReason::Mapping), 1);
        assert_eq!(summary.stats.percent(1), 100.0);
    }

    #[test]
    fn stoichiometry_warnings_count_records() {
        let dir = tempdir().unwrap();
        let data = corpus(&[
            "[CH2:1]=[CH2:2].[Na+:9].[Cl-:8]>>[CH3:1][CH3:2]",
            "[CH3:1][OH:2].[Na+:9]>>[CH3:1][OH:2]",
            AMIDE,
        ]);
        let (_, summary) = scan(&dir, &data, 10, None);
        assert_eq!(summary.stats.attempted, 3);
        assert_eq!(summary.stats.skipped(SkipReason::NoChange), 1);
        assert_eq!(summary.stats.stoichiometry_warnings, 2);
    }

    #[test]
    fn blank_lines_advance_the_cursor_only() {
        let dir = tempdir().unwrap();
        let data = format!("\n{AMIDE}\n\n").into_bytes();
        let (table, summary) = scan(&dir, &data, 10, None);
        assert_eq!(table.total(), 1);
        assert_eq!(summary.stats.attempted, 1);
        assert_eq!(summary.cursor.records, 1);
        assert_eq!(summary.cursor.offset, data.len() as u64);
    }

    #[test]
    fn record_limit_stops_early() {
        let dir = tempdir().unwrap();
        let data = corpus(&[AMIDE, HYDROGENATION, AMIDE]);
        let (table, summary) = scan(&dir, &data, 10, Some(2));
        assert_eq!(summary.cursor.records, 2);
        assert_eq!(table.total(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn finished_scan_resumes_at_its_end() {
        let dir = tempdir().unwrap();
        let data = corpus(&[AMIDE, HYDROGENATION]);
        let (first, _) = scan(&dir, &data, 10, None);
        let (second, summary) = scan(&dir, &data, 10, None);
        assert_eq!(first, second);
        assert_eq!(summary.stats.attempted, 0);
        assert_eq!(summary.resumed_from.offset, data.len() as u64);
    }

    #[test]
    fn interrupted_scan_resumes_from_last_checkpoint() {
        let lines = [AMIDE, HYDROGENATION, UNMAPPED, AMIDE_REORDERED, HYDROGENATION];
        let data = corpus(&lines);

        let clean_dir = tempdir().unwrap();
        let (uninterrupted, _) = scan(&clean_dir, &data, 2, None);

        let dir = tempdir().unwrap();
        let config = config_in(&dir, 2, None);
        let catalog = GroupCatalog::builtin();
        let reporter = ProgressReporter::new();
        let first_three: usize = corpus(&lines[..3]).len();
        {
            let mut scanner =
                TemplateScanner::open(&SmilesToolkit, &catalog, &config, &reporter).unwrap();
            let failing = FailingReader {
                inner: Cursor::new(data.clone()),
                fail_at: first_three as u64 + 5,
            };
            let err = scanner.run(failing).unwrap_err();
            assert!(matches!(err, ScanError::CorpusRead { .. }));
        }

        let mut scanner =
            TemplateScanner::open(&SmilesToolkit, &catalog, &config, &reporter).unwrap();
        assert_eq!(scanner.cursor().records, 2);
        assert_eq!(scanner.cursor().offset, corpus(&lines[..2]).len() as u64);
        let summary = scanner.run(Cursor::new(data)).unwrap();
        assert_eq!(summary.stats.attempted, 3);
        assert_eq!(scanner.table(), &uninterrupted);
    }

    #[test]
    fn progress_events_reach_the_callback() {
        let dir = tempdir().unwrap();
        let config = config_in(&dir, 1, None);
        let catalog = GroupCatalog::builtin();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));
        let mut scanner =
            TemplateScanner::open(&SmilesToolkit, &catalog, &config, &reporter).unwrap();
        scanner.run(Cursor::new(corpus(&[AMIDE]))).unwrap();

        let events = events.lock().unwrap();
        assert!(matches!(events.first(), Some(Progress::PhaseStart { .. })));
        assert!(matches!(events.last(), Some(Progress::PhaseFinish)));
        let checkpoints = events
            .iter()
            .filter(|e| matches!(e, Progress::Checkpoint { .. }))
            .count();
        assert_eq!(checkpoints, 2);
    }

    #[test]
    fn missing_corpus_is_fatal() {
        let dir = tempdir().unwrap();
        let config = config_in(&dir, 10, None);
        let catalog = GroupCatalog::builtin();
        let reporter = ProgressReporter::new();
        let mut scanner =
            TemplateScanner::open(&SmilesToolkit, &catalog, &config, &reporter).unwrap();
        let err = scanner.run_path(&dir.path().join("absent.rsmi")).unwrap_err();
        assert!(matches!(err, ScanError::CorpusOpen { .. }));
    }
}
