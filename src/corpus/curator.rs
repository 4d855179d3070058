use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use crate::artifact::ArtifactError;
use crate::corpus::parser::{CorpusReader, ParsedRecord};
use crate::corpus::vocab::LabelVocabulary;

/// Maximum number of rows written per label in one curation run. Eligible
/// records beyond the cap are still counted for statistics.
pub const MAX_ROWS_PER_LABEL: usize = 1200;

/// Header row of the single-table output format.
pub const TABLE_HEADER: &str = "description;label";

/// Destination of an accepted record in round-robin mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

/// Fixed 10-slot routing pattern: eight train slots followed by two test
/// slots, giving an exact 80/20 split per label for any acceptance order.
const DISTRIBUTION: [Split; 10] = [
    Split::Train,
    Split::Train,
    Split::Train,
    Split::Train,
    Split::Train,
    Split::Train,
    Split::Train,
    Split::Train,
    Split::Test,
    Split::Test,
];

/// Curation output mode. The two variants are mutually exclusive within a
/// run and selected explicitly; there is no implicit fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurationMode {
    /// One `description;label` table with a header row.
    #[default]
    SingleTable,
    /// Two header-less tables with a deterministic per-label 80/20 routing.
    RoundRobin,
}

/// Per-label round-robin router over [`DISTRIBUTION`].
///
/// Counters increment on every accepted-for-routing record and wrap modulo
/// the pattern length, so the nth accepted record of a label always lands on
/// the same destination given the same acceptance order.
#[derive(Debug, Default)]
struct SplitRouter {
    counters: HashMap<String, usize>,
}

impl SplitRouter {
    fn route(&mut self, label: &str) -> Split {
        let counter = self.counters.entry(label.to_string()).or_insert(0);
        let split = DISTRIBUTION[*counter % DISTRIBUTION.len()];
        *counter += 1;
        split
    }
}

/// A record accepted for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRow {
    pub description: String,
    pub label_index: usize,
    pub split: Split,
}

/// Statistics for one label over a finished curation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStats {
    pub label: String,
    pub eligible: usize,
    pub written: usize,
}

impl LabelStats {
    /// Share of eligible records actually written, truncated to a whole
    /// percentage.
    pub fn percent_written(&self) -> usize {
        if self.eligible == 0 {
            return 0;
        }
        self.written * 100 / self.eligible
    }
}

/// Per-label curation statistics in vocabulary (class index) order.
#[derive(Debug, Clone, Default)]
pub struct CurationReport {
    pub labels: Vec<LabelStats>,
}

impl CurationReport {
    pub fn rows_written(&self) -> usize {
        self.labels.iter().map(|stats| stats.written).sum()
    }

    /// Emits the per-label statistics as diagnostic log output.
    pub fn log(&self) {
        info!("Statistics on labels, encountered / written / percentage:");
        for stats in &self.labels {
            info!(
                "{}: {} / {} / {}",
                stats.label,
                stats.eligible,
                stats.written,
                stats.percent_written()
            );
        }
    }
}

/// Streaming dataset curator.
///
/// Consumes parsed records one at a time, building the label vocabulary in
/// first-seen order and enforcing the per-label write cap. All sampling
/// state lives in this struct and dies with it, so two runs can never share
/// counters.
#[derive(Debug)]
pub struct Curator {
    mode: CurationMode,
    vocab: LabelVocabulary,
    eligible: HashMap<String, usize>,
    written: HashMap<String, usize>,
    router: SplitRouter,
}

impl Curator {
    pub fn new(mode: CurationMode) -> Self {
        Self {
            mode,
            vocab: LabelVocabulary::new(),
            eligible: HashMap::new(),
            written: HashMap::new(),
            router: SplitRouter::default(),
        }
    }

    pub fn mode(&self) -> CurationMode {
        self.mode
    }

    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocab
    }

    /// Offers one parsed record to the curator.
    ///
    /// Ineligible records are discarded. Eligible records always register
    /// their label in the vocabulary and in the statistics; the returned row
    /// is `None` once the label's write cap is exhausted. The cap check runs
    /// before routing, so only accepted records consume a split slot.
    pub fn offer(&mut self, record: &ParsedRecord) -> Option<AcceptedRow> {
        if !record.is_eligible() {
            debug!("Discarding ineligible record: {:?}", record.labels);
            return None;
        }
        let label = record.labels[0].clone();
        let label_index = self.vocab.intern(&label);
        *self.eligible.entry(label.clone()).or_insert(0) += 1;

        let written = self.written.entry(label.clone()).or_insert(0);
        if *written >= MAX_ROWS_PER_LABEL {
            return None;
        }
        *written += 1;

        let split = match self.mode {
            CurationMode::SingleTable => Split::Train,
            CurationMode::RoundRobin => self.router.route(&label),
        };
        Some(AcceptedRow {
            description: record.description_text(),
            label_index,
            split,
        })
    }

    /// Finishes the run, yielding the vocabulary and the statistics.
    pub fn finish(self) -> (LabelVocabulary, CurationReport) {
        let labels = self
            .vocab
            .as_slice()
            .iter()
            .map(|label| LabelStats {
                label: label.clone(),
                eligible: self.eligible.get(label).copied().unwrap_or(0),
                written: self.written.get(label).copied().unwrap_or(0),
            })
            .collect();
        (self.vocab, CurationReport { labels })
    }
}

fn write_row<W: Write>(out: &mut W, row: &AcceptedRow) -> Result<(), ArtifactError> {
    writeln!(out, "{};{}", row.description, row.label_index)?;
    Ok(())
}

/// Runs single-table curation over `corpus`.
///
/// Writes the curated `description;label` table (with header) to
/// `table_path` and the label vocabulary JSON to `labels_path`, then logs
/// and returns the per-label statistics.
pub fn curate_single_table(
    corpus: &CorpusReader,
    table_path: &Path,
    labels_path: &Path,
) -> Result<CurationReport, ArtifactError> {
    let mut curator = Curator::new(CurationMode::SingleTable);
    let file = File::create(table_path)?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", TABLE_HEADER)?;
    for record in corpus.records()? {
        if let Some(row) = curator.offer(&record) {
            write_row(&mut out, &row)?;
        }
    }
    out.flush()?;

    let (vocab, report) = curator.finish();
    vocab.save(labels_path)?;
    report.log();
    Ok(report)
}

/// Runs round-robin curation over `corpus`.
///
/// Accepted rows are routed 80/20 per label into `train_path` and
/// `test_path` (no header rows); the vocabulary and statistics are handled
/// as in [`curate_single_table`].
pub fn curate_round_robin(
    corpus: &CorpusReader,
    train_path: &Path,
    test_path: &Path,
    labels_path: &Path,
) -> Result<CurationReport, ArtifactError> {
    let mut curator = Curator::new(CurationMode::RoundRobin);
    let mut train_out = BufWriter::new(File::create(train_path)?);
    let mut test_out = BufWriter::new(File::create(test_path)?);
    for record in corpus.records()? {
        if let Some(row) = curator.offer(&record) {
            match row.split {
                Split::Train => write_row(&mut train_out, &row)?,
                Split::Test => write_row(&mut test_out, &row)?,
            }
        }
    }
    train_out.flush()?;
    test_out.flush()?;

    let (vocab, report) = curator.finish();
    vocab.save(labels_path)?;
    report.log();
    Ok(report)
}

/// One row of a curated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratedRow {
    pub description: String,
    pub label_index: usize,
}

/// An in-memory curated table, as read back for training.
#[derive(Debug, Clone, Default)]
pub struct CuratedTable {
    pub rows: Vec<CuratedRow>,
}

impl CuratedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reads a curated table from `path`, tolerating an optional header row.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let file = File::open(path)?;
        let mut rows = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            if line_no == 0 && line == TABLE_HEADER {
                continue;
            }
            let (description, label) = line.rsplit_once(';').ok_or_else(|| {
                ArtifactError::MalformedTable {
                    line: line_no + 1,
                    reason: "missing field separator".to_string(),
                }
            })?;
            let label_index =
                label
                    .parse::<usize>()
                    .map_err(|_| ArtifactError::MalformedTable {
                        line: line_no + 1,
                        reason: format!("label index is not an integer: {label:?}"),
                    })?;
            rows.push(CuratedRow {
                description: description.to_string(),
                label_index,
            });
        }
        Ok(Self { rows })
    }
}
