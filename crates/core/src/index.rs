//! Exact cosine index persisted as JSON Lines: one header line, then one
//! record per entry in insertion order. A single writer per path is assumed.

use crate::error::RagError;
use crate::models::{Chunk, IndexEntry, QueryResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const INDEX_FORMAT: &str = "pdf-qa-index";
pub const INDEX_VERSION: u32 = 1;
pub const INDEX_METRIC: &str = "cosine";

#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
    dimension: Option<usize>,
    path: Option<PathBuf>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(path: impl Into<PathBuf>) -> Result<Self, RagError> {
        let path = path.into();
        write_snapshot(&path, &[], None)?;
        Ok(Self {
            path: Some(path),
            ..Self::default()
        })
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RagError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|error| corrupt(format!("cannot open {}: {error}", path.display())))?;
        let mut lines = BufReader::new(file).lines();

        let header_line = lines
            .next()
            .ok_or_else(|| corrupt(format!("{} is empty", path.display())))?
            .map_err(|error| corrupt(format!("cannot read header: {error}")))?;
        let header: IndexHeader = serde_json::from_str(&header_line)
            .map_err(|error| corrupt(format!("unreadable header: {error}")))?;
        header.check()?;

        let mut index = Self {
            dimension: header.dimension,
            path: Some(path.to_path_buf()),
            ..Self::default()
        };

        for (line_number, line) in lines.enumerate() {
            let line = line.map_err(|error| corrupt(format!("cannot read record: {error}")))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: StoredRecord = serde_json::from_str(&line).map_err(|error| {
                corrupt(format!("record {} is malformed: {error}", line_number + 1))
            })?;

            let expected = *index.dimension.get_or_insert(record.vector.len());
            if expected == 0 {
                return Err(corrupt(format!("record {} has no vector", line_number + 1)));
            }
            if record.vector.len() != expected {
                return Err(corrupt(format!(
                    "record {} has dimension {}, index dimension is {expected}",
                    line_number + 1,
                    record.vector.len()
                )));
            }
            if index.positions.contains_key(&record.chunk_id) {
                return Err(corrupt(format!("duplicate chunk id {}", record.chunk_id)));
            }

            index
                .positions
                .insert(record.chunk_id.clone(), index.entries.len());
            index.entries.push(record.into_entry());
        }

        if index.entries.len() != header.entries {
            return Err(corrupt(format!(
                "header declares {} entries, found {}",
                header.entries,
                index.entries.len()
            )));
        }

        info!(
            entries = index.entries.len(),
            dimension = ?index.dimension,
            "vector index loaded"
        );
        Ok(index)
    }

    /// Adds or replaces entries by chunk id. Either every entry of the call
    /// becomes visible or none does.
    #[instrument(skip_all, fields(incoming = entries.len(), existing = self.entries.len()))]
    pub fn upsert(&mut self, entries: Vec<IndexEntry>) -> Result<(), RagError> {
        let Some(first) = entries.first() else {
            return Ok(());
        };

        let dimension = self.dimension.unwrap_or(first.vector.len());
        if dimension == 0 {
            return Err(RagError::IndexWrite(
                "vectors must have at least one dimension".to_string(),
            ));
        }
        for entry in &entries {
            if entry.vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: entry.vector.len(),
                });
            }
            if entry.chunk_id().is_empty() {
                return Err(RagError::IndexWrite("entry has an empty chunk id".to_string()));
            }
            if entry.vector.iter().any(|value| !value.is_finite()) {
                return Err(RagError::IndexWrite(format!(
                    "entry {} has a non-finite vector component",
                    entry.chunk_id()
                )));
            }
        }

        let mut staged = self.entries.clone();
        let mut positions = self.positions.clone();
        let mut replaced = 0usize;
        for entry in entries {
            match positions.get(entry.chunk_id()) {
                Some(&position) => {
                    staged[position] = entry;
                    replaced += 1;
                }
                None => {
                    positions.insert(entry.chunk_id().to_string(), staged.len());
                    staged.push(entry);
                }
            }
        }

        if let Some(path) = &self.path {
            write_snapshot(path, &staged, Some(dimension))?;
        }

        debug!(total = staged.len(), replaced, "upsert committed");
        self.entries = staged;
        self.positions = positions;
        self.dimension = Some(dimension);
        Ok(())
    }

    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<QueryResult>, RagError> {
        if k == 0 {
            return Err(RagError::Configuration("k must be at least 1".to_string()));
        }
        if self.entries.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        let expected = self.dimension.unwrap_or(vector.len());
        if vector.len() != expected {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let query_norm = norm(vector);
        let mut scored = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_distance(vector, query_norm, &entry.vector)))
            .collect::<Vec<_>>();
        scored.sort_by(|left, right| left.1.total_cmp(&right.1).then(left.0.cmp(&right.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| QueryResult {
                chunk: self.entries[position].chunk.clone(),
                score,
            })
            .collect())
    }

    pub fn persist_to(&self, path: impl AsRef<Path>) -> Result<(), RagError> {
        write_snapshot(path.as_ref(), &self.entries, self.dimension)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

fn norm(vector: &[f32]) -> f32 {
    vector.iter().map(|value| value * value).sum::<f32>().sqrt()
}

// 1 - cos(a, b); zero vectors sit at distance 1
fn cosine_distance(query: &[f32], query_norm: f32, stored: &[f32]) -> f32 {
    let stored_norm = norm(stored);
    if query_norm == 0.0 || stored_norm == 0.0 {
        return 1.0;
    }
    let dot = query
        .iter()
        .zip(stored)
        .map(|(left, right)| left * right)
        .sum::<f32>();
    let similarity = (dot / (query_norm * stored_norm)).clamp(-1.0, 1.0);
    1.0 - similarity
}

fn corrupt(details: impl Into<String>) -> RagError {
    RagError::IndexCorrupt(details.into())
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexHeader {
    format: String,
    version: u32,
    metric: String,
    dimension: Option<usize>,
    entries: usize,
    created_at: DateTime<Utc>,
}

impl IndexHeader {
    fn check(&self) -> Result<(), RagError> {
        if self.format != INDEX_FORMAT {
            return Err(corrupt(format!("unknown index format {:?}", self.format)));
        }
        if self.version != INDEX_VERSION {
            return Err(corrupt(format!(
                "unsupported index version {}, expected {INDEX_VERSION}",
                self.version
            )));
        }
        if self.metric != INDEX_METRIC {
            return Err(corrupt(format!("unsupported metric {:?}", self.metric)));
        }
        if self.dimension == Some(0) {
            return Err(corrupt("header declares a zero dimension"));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct StoredRecordRef<'a> {
    chunk_id: &'a str,
    document_id: &'a str,
    page_number: u32,
    start_offset: usize,
    text: &'a str,
    vector: &'a [f32],
}

#[derive(Deserialize)]
struct StoredRecord {
    chunk_id: String,
    document_id: String,
    page_number: u32,
    start_offset: usize,
    text: String,
    vector: Vec<f32>,
}

impl StoredRecord {
    fn into_entry(self) -> IndexEntry {
        let chunk = Chunk {
            chunk_id: self.chunk_id,
            document_id: self.document_id,
            page_number: self.page_number,
            start_offset: self.start_offset,
            text: self.text,
            vector: None,
        };
        IndexEntry::new(chunk, self.vector)
    }
}

fn write_snapshot(
    path: &Path,
    entries: &[IndexEntry],
    dimension: Option<usize>,
) -> Result<(), RagError> {
    let temp_path = temp_path_for(path);
    let result = write_file(&temp_path, entries, dimension)
        .and_then(|()| fs::rename(&temp_path, path));

    result.map_err(|error| {
        let _ = fs::remove_file(&temp_path);
        RagError::IndexWrite(format!("{}: {error}", path.display()))
    })
}

fn write_file(
    path: &Path,
    entries: &[IndexEntry],
    dimension: Option<usize>,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let header = IndexHeader {
        format: INDEX_FORMAT.to_string(),
        version: INDEX_VERSION,
        metric: INDEX_METRIC.to_string(),
        dimension,
        entries: entries.len(),
        created_at: Utc::now(),
    };

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &header)?;
    writer.write_all(b"\n")?;

    for entry in entries {
        let record = StoredRecordRef {
            chunk_id: &entry.chunk.chunk_id,
            document_id: &entry.chunk.document_id,
            page_number: entry.chunk.page_number,
            start_offset: entry.chunk.start_offset,
            text: &entry.chunk.text,
            vector: &entry.vector,
        };
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
    }

    let file = writer.into_inner().map_err(|error| error.into_error())?;
    file.sync_all()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn entry(id: &str, vector: Vec<f32>) -> IndexEntry {
        let chunk = Chunk {
            chunk_id: id.to_string(),
            document_id: "doc-1".to_string(),
            page_number: 1,
            start_offset: 0,
            text: format!("text of {id}"),
            vector: None,
        };
        chunk.into_entry(vector)
    }

    fn ids(results: &[QueryResult]) -> Vec<&str> {
        results.iter().map(|hit| hit.chunk.chunk_id.as_str()).collect()
    }

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new();
        index
            .upsert(vec![
                entry("east", vec![1.0, 0.0]),
                entry("north", vec![0.0, 1.0]),
                entry("north-east", vec![1.0, 1.0]),
                entry("east-again", vec![2.0, 0.0]),
                entry("west", vec![-1.0, 0.0]),
            ])
            .unwrap();
        index
    }

    #[test]
    fn query_on_fresh_index_is_empty_index_error() {
        let index = VectorIndex::new();
        assert!(matches!(index.query(&[1.0, 0.0], 1), Err(RagError::EmptyIndex)));
    }

    #[test]
    fn query_returns_nearest_first_with_insertion_order_ties() {
        let index = sample_index();
        let results = index.query(&[1.0, 0.0], 3).unwrap();

        assert_eq!(ids(&results), vec!["east", "east-again", "north-east"]);
        assert!(results[0].score.abs() < 1e-6);
        assert!(results[1].score.abs() < 1e-6);
        assert!((results[2].score - (1.0 - std::f32::consts::FRAC_1_SQRT_2)).abs() < 1e-5);
        assert!(results.windows(2).all(|pair| pair[0].score <= pair[1].score));
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let index = sample_index();
        let results = index.query(&[0.0, 1.0], 50).unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].chunk.chunk_id, "north");
        assert_eq!(results[4].chunk.chunk_id, "west");
        assert!((results[4].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_k_and_wrong_query_dimension_are_rejected() {
        let index = sample_index();
        assert!(matches!(index.query(&[1.0, 0.0], 0), Err(RagError::Configuration(_))));
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 1),
            Err(RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn mismatched_dimension_rejects_the_whole_upsert() {
        let mut index = sample_index();
        let before = index.query(&[1.0, 0.0], 5).unwrap();

        let error = index
            .upsert(vec![entry("fine", vec![0.5, 0.5]), entry("bad", vec![1.0, 0.0, 0.0])])
            .unwrap_err();

        assert!(matches!(
            error,
            RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(index.len(), 5);
        assert_eq!(index.query(&[1.0, 0.0], 5).unwrap(), before);
    }

    #[test]
    fn upsert_replaces_by_chunk_id_and_keeps_position() {
        let mut index = sample_index();
        index.upsert(vec![entry("east", vec![0.0, 1.0])]).unwrap();

        assert_eq!(index.len(), 5);
        let results = index.query(&[0.0, 1.0], 2).unwrap();
        assert_eq!(ids(&results), vec!["east", "north"]);
    }

    #[test]
    fn repeated_id_within_one_upsert_keeps_the_last_vector() {
        let mut index = VectorIndex::new();
        index
            .upsert(vec![
                entry("a", vec![1.0, 0.0]),
                entry("b", vec![0.0, 1.0]),
                entry("a", vec![0.0, 1.0]),
            ])
            .unwrap();

        assert_eq!(index.len(), 2);
        let results = index.query(&[0.0, 1.0], 2).unwrap();
        assert_eq!(ids(&results), vec!["a", "b"]);
        assert!(results[0].score.abs() < 1e-6);
        assert_eq!(index.entries()[0].vector, vec![0.0, 1.0]);
    }

    #[test]
    fn upsert_rejects_empty_ids_and_non_finite_vectors() {
        let mut index = sample_index();

        let error = index.upsert(vec![entry("", vec![1.0, 0.0])]).unwrap_err();
        assert_eq!(error.kind(), "IndexWriteError");

        for bad in [f32::NAN, f32::INFINITY] {
            let error = index
                .upsert(vec![entry("fine", vec![0.5, 0.5]), entry("bad", vec![bad, 0.0])])
                .unwrap_err();
            assert!(matches!(error, RagError::IndexWrite(ref details) if details.contains("bad")));
        }
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn zero_vectors_sit_at_distance_one() {
        let mut index = VectorIndex::new();
        index
            .upsert(vec![entry("zero", vec![0.0, 0.0]), entry("away", vec![-1.0, 0.0])])
            .unwrap();

        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(ids(&results), vec!["zero", "away"]);
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn persisted_index_answers_queries_identically() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("index.jsonl");

        let mut index = VectorIndex::create(&path)?;
        index.upsert(vec![
            entry("a", vec![0.1, 0.7, 0.2]),
            entry("b", vec![0.9, 0.05, 0.3]),
            entry("c", vec![0.33, 0.33, 0.33]),
        ])?;
        index.upsert(vec![entry("d", vec![-0.2, 0.4, 0.8])])?;

        let loaded = VectorIndex::load(&path)?;
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.dimension(), Some(3));

        for target in [[0.2f32, 0.6, 0.1], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]] {
            let original = index.query(&target, 3)?;
            let reloaded = loaded.query(&target, 3)?;
            assert_eq!(ids(&original), ids(&reloaded));
            for (left, right) in original.iter().zip(&reloaded) {
                assert!((left.score - right.score).abs() < 1e-6);
                assert_eq!(left.chunk.text, right.chunk.text);
            }
        }
        Ok(())
    }

    #[test]
    fn in_memory_index_can_be_persisted() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("snapshot.jsonl");

        let index = sample_index();
        index.persist_to(&path)?;
        let loaded = VectorIndex::load(&path)?;

        assert_eq!(loaded.path(), Some(path.as_path()));
        assert_eq!(
            ids(&loaded.query(&[1.0, 0.0], 5)?),
            ids(&index.query(&[1.0, 0.0], 5)?)
        );
        assert!(!dir.path().join("snapshot.jsonl.tmp").exists());
        Ok(())
    }

    #[test]
    fn failed_write_leaves_index_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("sub");
        let path = nested.join("index.jsonl");

        let mut index = VectorIndex::create(&path)?;
        index.upsert(vec![entry("a", vec![1.0, 0.0])])?;

        fs::remove_dir_all(&nested)?;
        fs::write(&nested, b"not a directory")?;

        let error = index.upsert(vec![entry("b", vec![0.0, 1.0])]).unwrap_err();
        assert_eq!(error.kind(), "IndexWriteError");
        assert_eq!(index.len(), 1);
        assert_eq!(ids(&index.query(&[0.0, 1.0], 5)?), vec!["a"]);
        Ok(())
    }

    #[test]
    fn load_rejects_incompatible_version() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("index.jsonl");
        fs::write(
            &path,
            r#"{"format":"pdf-qa-index","version":2,"metric":"cosine","dimension":2,"entries":0,"created_at":"2024-01-01T00:00:00Z"}"#,
        )?;

        let error = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(error, RagError::IndexCorrupt(ref details) if details.contains("version")));
        Ok(())
    }

    fn write_index(path: &Path, header: &str, records: &[&str]) -> std::io::Result<()> {
        let mut lines = vec![header];
        lines.extend_from_slice(records);
        fs::write(path, lines.join("\n"))
    }

    #[test]
    fn load_rejects_foreign_format_and_unknown_metric() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("index.jsonl");

        write_index(
            &path,
            r#"{"format":"other","version":1,"metric":"cosine","dimension":2,"entries":0,"created_at":"2024-01-01T00:00:00Z"}"#,
            &[],
        )?;
        let error = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(error, RagError::IndexCorrupt(ref details) if details.contains("format")));

        write_index(
            &path,
            r#"{"format":"pdf-qa-index","version":1,"metric":"dot","dimension":2,"entries":0,"created_at":"2024-01-01T00:00:00Z"}"#,
            &[],
        )?;
        let error = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(error, RagError::IndexCorrupt(ref details) if details.contains("metric")));
        Ok(())
    }

    #[test]
    fn load_rejects_duplicate_chunk_ids() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("index.jsonl");
        write_index(
            &path,
            r#"{"format":"pdf-qa-index","version":1,"metric":"cosine","dimension":2,"entries":2,"created_at":"2024-01-01T00:00:00Z"}"#,
            &[
                r#"{"chunk_id":"a","document_id":"d","page_number":1,"start_offset":0,"text":"x","vector":[1.0,0.0]}"#,
                r#"{"chunk_id":"a","document_id":"d","page_number":1,"start_offset":4,"text":"y","vector":[0.0,1.0]}"#,
            ],
        )?;

        let error = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(error, RagError::IndexCorrupt(ref details) if details.contains("duplicate")));
        Ok(())
    }

    #[test]
    fn load_rejects_zero_dimension() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let record =
            r#"{"chunk_id":"a","document_id":"d","page_number":1,"start_offset":0,"text":"x","vector":[]}"#;

        let declared = dir.path().join("declared.jsonl");
        write_index(
            &declared,
            r#"{"format":"pdf-qa-index","version":1,"metric":"cosine","dimension":0,"entries":1,"created_at":"2024-01-01T00:00:00Z"}"#,
            &[record],
        )?;
        assert!(matches!(VectorIndex::load(&declared), Err(RagError::IndexCorrupt(_))));

        let inferred = dir.path().join("inferred.jsonl");
        write_index(
            &inferred,
            r#"{"format":"pdf-qa-index","version":1,"metric":"cosine","dimension":null,"entries":1,"created_at":"2024-01-01T00:00:00Z"}"#,
            &[record],
        )?;
        assert!(matches!(VectorIndex::load(&inferred), Err(RagError::IndexCorrupt(_))));
        Ok(())
    }

    #[test]
    fn load_rejects_inconsistent_dimensions() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("index.jsonl");
        let contents = [
            r#"{"format":"pdf-qa-index","version":1,"metric":"cosine","dimension":null,"entries":2,"created_at":"2024-01-01T00:00:00Z"}"#,
            r#"{"chunk_id":"a","document_id":"d","page_number":1,"start_offset":0,"text":"x","vector":[1.0,0.0]}"#,
            r#"{"chunk_id":"b","document_id":"d","page_number":1,"start_offset":4,"text":"y","vector":[1.0]}"#,
        ]
        .join("\n");
        fs::write(&path, contents)?;

        assert!(matches!(VectorIndex::load(&path), Err(RagError::IndexCorrupt(_))));
        Ok(())
    }

    #[test]
    fn load_rejects_truncated_and_garbage_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;

        let truncated = dir.path().join("truncated.jsonl");
        let mut index = VectorIndex::create(&truncated)?;
        index.upsert(vec![entry("a", vec![1.0]), entry("b", vec![2.0])])?;
        let contents = fs::read_to_string(&truncated)?;
        let kept = contents.lines().take(2).collect::<Vec<_>>().join("\n");
        fs::write(&truncated, kept)?;
        assert!(matches!(VectorIndex::load(&truncated), Err(RagError::IndexCorrupt(_))));

        let garbage = dir.path().join("garbage.jsonl");
        fs::write(&garbage, "this is not an index")?;
        assert!(matches!(VectorIndex::load(&garbage), Err(RagError::IndexCorrupt(_))));

        let missing = dir.path().join("missing.jsonl");
        assert!(matches!(VectorIndex::load(&missing), Err(RagError::IndexCorrupt(_))));
        Ok(())
    }

    #[test]
    fn freshly_created_file_loads_as_empty_index() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("index.jsonl");
        VectorIndex::create(&path)?;

        let loaded = VectorIndex::load(&path)?;
        assert!(loaded.is_empty());
        assert!(matches!(loaded.query(&[1.0], 1), Err(RagError::EmptyIndex)));
        Ok(())
    }

    #[test]
    fn loaded_index_serves_concurrent_readers() {
        let index = Arc::new(sample_index());

        std::thread::scope(|scope| {
            let handles = (0..4)
                .map(|_| {
                    let index = Arc::clone(&index);
                    scope.spawn(move || index.query(&[1.0, 0.0], 2).map(|hits| hits.len()))
                })
                .collect::<Vec<_>>();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap(), 2);
            }
        });
    }
}
