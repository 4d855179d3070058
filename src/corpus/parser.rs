use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use log::warn;

/// Prefix that marks a token as a label in the raw corpus.
pub const LABEL_MARKER: &str = "__label__";

/// One raw corpus line after label/description extraction.
///
/// `labels` are the normalized label strings found on the line (marker
/// stripped, underscores replaced with spaces); `description` holds the
/// alphabetic-only tokens in their original order and case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub description: Vec<String>,
    pub labels: Vec<String>,
}

impl ParsedRecord {
    /// A record is eligible for curation iff it carries exactly one label
    /// and at least three description tokens.
    pub fn is_eligible(&self) -> bool {
        self.labels.len() == 1 && self.description.len() > 2
    }

    /// The description tokens joined with single spaces.
    pub fn description_text(&self) -> String {
        self.description.join(" ")
    }
}

fn is_label_token(token: &str) -> bool {
    token.starts_with(LABEL_MARKER)
}

/// Strips the label marker and recovers the human-readable form:
/// `__label__home_appliances` becomes `home appliances`.
fn normalize_label(token: &str) -> String {
    token
        .strip_prefix(LABEL_MARKER)
        .unwrap_or(token)
        .replace('_', " ")
}

/// A token belongs to the description iff every character is alphabetic.
/// Tokens with digits, punctuation, or mixed content are dropped. Case is
/// preserved, not folded.
fn is_description_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// Applies the description token filter to free-form text and rejoins the
/// surviving tokens with single spaces.
///
/// This is the exact filter used when building the training table, and it is
/// reapplied to raw user input at inference time. Filtering already-filtered
/// text returns it unchanged.
///
/// # Example
/// ```
/// use stocktag::corpus::filter_description;
///
/// assert_eq!(filter_description("great cheap phone 4k"), "great cheap phone");
/// ```
pub fn filter_description(text: &str) -> String {
    text.split_whitespace()
        .filter(|token| is_description_token(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses one raw corpus line.
///
/// Returns `None` for lines that yield no label tokens or no description
/// tokens after filtering; such lines are a filtering outcome, not an error.
pub fn parse_line(line: &str) -> Option<ParsedRecord> {
    let mut labels = Vec::new();
    let mut description = Vec::new();
    for token in line.split_whitespace() {
        if is_label_token(token) {
            labels.push(normalize_label(token));
        } else if is_description_token(token) {
            description.push(token.to_string());
        }
    }
    if labels.is_empty() || description.is_empty() {
        return None;
    }
    Some(ParsedRecord {
        description,
        labels,
    })
}

/// Handle on a raw corpus file.
///
/// The reader itself holds only the path; each call to [`CorpusReader::records`]
/// opens the file anew and yields a fresh lazy stream, so the stream is
/// restartable but not seekable mid-iteration.
#[derive(Debug, Clone)]
pub struct CorpusReader {
    path: PathBuf,
}

impl CorpusReader {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("corpus file not found: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Starts a lazy stream of parsed records over the corpus.
    pub fn records(&self) -> io::Result<RecordStream> {
        let file = File::open(&self.path)?;
        Ok(RecordStream {
            lines: BufReader::new(file).lines(),
        })
    }
}

/// Lazy iterator over the parsed records of one corpus pass.
///
/// Lines that parse to nothing are skipped, not yielded. A read error mid
/// stream is logged and treated as end of input; parsing never escalates.
pub struct RecordStream {
    lines: Lines<BufReader<File>>,
}

impl Iterator for RecordStream {
    type Item = ParsedRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    if let Some(record) = parse_line(&line) {
                        return Some(record);
                    }
                }
                Err(err) => {
                    warn!("Stopping corpus read after I/O error: {}", err);
                    return None;
                }
            }
        }
    }
}
