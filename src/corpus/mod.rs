//! Corpus parsing and dataset curation.
//!
//! Turns the raw `__label__`-marked corpus into a clean single-label
//! training table plus the label vocabulary that fixes every class index.

pub mod curator;
pub mod parser;
pub mod vocab;

pub use curator::{
    curate_round_robin, curate_single_table, AcceptedRow, CurationMode, CurationReport,
    CuratedRow, CuratedTable, Curator, LabelStats, Split, MAX_ROWS_PER_LABEL, TABLE_HEADER,
};
pub use parser::{
    filter_description, parse_line, CorpusReader, ParsedRecord, RecordStream, LABEL_MARKER,
};
pub use vocab::LabelVocabulary;
