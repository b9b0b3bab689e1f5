//! Corpus ingestion: newline-delimited JSON paper records.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// One paper of the input corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub summary: String,
    /// space separated category codes, e.g. `"cs.LG math.OC"`
    #[serde(default)]
    pub categories: String,
}

impl DocumentRecord {
    /// Text fed to the term-weighting model: title and abstract on one line
    pub fn text(&self) -> String {
        format!("{} {}", flatten(&self.title), flatten(&self.summary))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.split_whitespace()
    }

    pub fn in_any_category(&self, wanted: &HashSet<String>) -> bool {
        self.categories().any(|c| wanted.contains(c))
    }
}

fn flatten(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read every record of a JSONL file. Lines that fail to parse are skipped
/// with a warning; blank lines are ignored.
pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentRecord>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<DocumentRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!(line = line_no + 1, error = %e, "skipping malformed record");
            }
        }
    }
    info!(path = %path.display(), records = records.len(), skipped, "corpus read");
    Ok(records)
}

/// Keep records sharing at least one category with `wanted`.
/// An empty `wanted` keeps everything.
pub fn filter_categories(records: Vec<DocumentRecord>, wanted: &[String]) -> Vec<DocumentRecord> {
    if wanted.is_empty() {
        return records;
    }
    let wanted: HashSet<String> = wanted.iter().cloned().collect();
    records.into_iter().filter(|r| r.in_any_category(&wanted)).collect()
}

/// Random subset of at most `n` records, kept in input order.
/// The same `seed` always selects the same records.
pub fn sample(records: Vec<DocumentRecord>, n: usize, seed: Option<u64>) -> Vec<DocumentRecord> {
    if n >= records.len() {
        return records;
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut picked = rand::seq::index::sample(&mut rng, records.len(), n).into_vec();
    picked.sort_unstable();
    let mut picked = picked.into_iter().peekable();
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            if picked.peek() == Some(&i) {
                picked.next();
                Some(record)
            } else {
                None
            }
        })
        .collect()
}

/// Split records into (texts, identifiers), aligned by position
pub fn into_corpus(records: &[DocumentRecord]) -> (Vec<String>, Vec<String>) {
    records.iter().map(|r| (r.text(), r.id.clone())).unzip()
}
