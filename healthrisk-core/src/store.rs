//! Assessment persistence
//!
//! The engines never touch storage; this module is the collaborator that
//! keeps scored results per subject so later assessments can be compared.
//!
//! Global invariants enforced:
//! - Records are immutable (never overwrite an existing record)
//! - Record identity is `<subject>/<domain>/<sequence>`, sequences start at 1
//! - History is returned in ascending sequence order
//! - File writes are atomic (per-writer temp file, persisted without clobbering)

use crate::attribution::Domain;
use crate::risk::RiskResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Schema version for stored records
pub const RECORD_SCHEMA_VERSION: u32 = 1;

/// Default store directory, relative to the project root
pub const DEFAULT_STORE_DIR: &str = ".healthrisk";

/// Opaque identifier of a stored assessment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    fn new(subject: &str, domain: Domain, sequence: u64) -> Self {
        RecordId(format!("{subject}/{domain}/{sequence:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A saved result plus its bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAssessment {
    pub schema_version: u32,
    pub id: RecordId,
    pub subject: String,
    pub sequence: u64,
    /// Seconds since the Unix epoch
    pub recorded_at: u64,
    pub result: RiskResult,
}

impl StoredAssessment {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize assessment to JSON")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let record: StoredAssessment =
            serde_json::from_str(json).context("failed to deserialize assessment from JSON")?;

        if record.schema_version != RECORD_SCHEMA_VERSION {
            anyhow::bail!(
                "record schema version mismatch: expected {}, got {}",
                RECORD_SCHEMA_VERSION,
                record.schema_version
            );
        }

        Ok(record)
    }
}

/// Persistence collaborator for scored results
///
/// Saving a result also saves the validated input, which `RiskResult` embeds.
pub trait AssessmentStore {
    /// Persist a result for `subject` and return its identifier
    fn save(&mut self, subject: &str, result: &RiskResult) -> Result<RecordId>;

    /// Every record for `subject` in `domain`, oldest first
    fn history(&self, subject: &str, domain: Domain) -> Result<Vec<StoredAssessment>>;

    /// Most recent record for `subject` in `domain`
    fn latest(&self, subject: &str, domain: Domain) -> Result<Option<StoredAssessment>> {
        Ok(self.history(subject, domain)?.pop())
    }
}

/// Subject identifiers become directory names, so keep them to a safe set
pub fn validate_subject(subject: &str) -> Result<()> {
    if subject.is_empty() {
        anyhow::bail!("subject identifier must not be empty");
    }
    if subject.starts_with('.') {
        anyhow::bail!("subject identifier must not start with '.': {subject:?}");
    }
    if let Some(bad) = subject
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        anyhow::bail!("subject identifier {subject:?} contains invalid character {bad:?}");
    }
    Ok(())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn new_record(subject: &str, result: &RiskResult, sequence: u64) -> StoredAssessment {
    StoredAssessment {
        schema_version: RECORD_SCHEMA_VERSION,
        id: RecordId::new(subject, result.domain, sequence),
        subject: subject.to_string(),
        sequence,
        recorded_at: now_secs(),
        result: result.clone(),
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<(String, Domain), Vec<StoredAssessment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssessmentStore for MemoryStore {
    fn save(&mut self, subject: &str, result: &RiskResult) -> Result<RecordId> {
        validate_subject(subject)?;
        let records = self
            .records
            .entry((subject.to_string(), result.domain))
            .or_default();
        let record = new_record(subject, result, records.len() as u64 + 1);
        let id = record.id.clone();
        records.push(record);
        debug!(record = %id, "stored assessment in memory");
        Ok(id)
    }

    fn history(&self, subject: &str, domain: Domain) -> Result<Vec<StoredAssessment>> {
        Ok(self
            .records
            .get(&(subject.to_string(), domain))
            .cloned()
            .unwrap_or_default())
    }
}

/// One pretty-printed JSON file per record under `<root>/<subject>/<domain>/`
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    /// Directory holding one subject's records for one domain
    pub fn records_dir(&self, subject: &str, domain: Domain) -> PathBuf {
        self.root.join(subject).join(domain.as_str())
    }

    pub fn record_path(&self, subject: &str, domain: Domain, sequence: u64) -> PathBuf {
        self.records_dir(subject, domain)
            .join(format!("{sequence:06}.json"))
    }

    /// Sequence numbers of the record files present on disk, ascending
    fn sequences(&self, subject: &str, domain: Domain) -> Result<Vec<u64>> {
        let dir = self.records_dir(subject, domain);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir)
            .with_context(|| format!("failed to read records directory: {}", dir.display()))?;

        let mut sequences = Vec::new();
        for entry_result in entries {
            let path = entry_result?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(seq) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                sequences.push(seq);
            }
        }
        sequences.sort_unstable();
        Ok(sequences)
    }
}

/// Attempts to claim a sequence before giving up on a contended subject
const MAX_SAVE_ATTEMPTS: u32 = 256;

impl AssessmentStore for FileStore {
    fn save(&mut self, subject: &str, result: &RiskResult) -> Result<RecordId> {
        validate_subject(subject)?;
        let dir = self.records_dir(subject, result.domain);

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let sequence = self
                .sequences(subject, result.domain)?
                .last()
                .map_or(1, |last| last + 1);
            let path = self.record_path(subject, result.domain, sequence);
            let record = new_record(subject, result, sequence);

            match write_new(&dir, &path, &record.to_json()?) {
                Ok(()) => {
                    debug!(record = %record.id, path = %path.display(), "stored assessment");
                    return Ok(record.id);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(sequence, path = %path.display(), "sequence already taken, retrying");
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to persist record: {}", path.display()));
                }
            }
        }

        anyhow::bail!(
            "could not claim a record sequence in {} after {} attempts",
            dir.display(),
            MAX_SAVE_ATTEMPTS
        )
    }

    fn history(&self, subject: &str, domain: Domain) -> Result<Vec<StoredAssessment>> {
        validate_subject(subject)?;
        let mut records = Vec::new();
        for sequence in self.sequences(subject, domain)? {
            let path = self.record_path(subject, domain, sequence);
            match read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(path = %path.display(), error = %format!("{e:#}"), "skipping unreadable record");
                }
            }
        }
        debug!(subject, domain = %domain, count = records.len(), "loaded history");
        Ok(records)
    }

    /// The highest-sequence record; an unreadable newest record is an error
    fn latest(&self, subject: &str, domain: Domain) -> Result<Option<StoredAssessment>> {
        validate_subject(subject)?;
        let Some(sequence) = self.sequences(subject, domain)?.pop() else {
            return Ok(None);
        };
        read_record(&self.record_path(subject, domain, sequence)).map(Some)
    }
}

fn read_record(path: &Path) -> Result<StoredAssessment> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read record: {}", path.display()))?;
    StoredAssessment::from_json(&json)
        .with_context(|| format!("failed to parse record: {}", path.display()))
}

/// Write `contents` to `path` atomically, failing with `AlreadyExists` if it is taken
///
/// Each writer gets its own temp file in `dir`; the final link never replaces
/// an existing record.
fn write_new(dir: &Path, path: &Path, contents: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}
