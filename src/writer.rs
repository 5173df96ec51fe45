use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::mutant::Mutant;

/// Serializes selected mutants.
pub trait MutantWriter {
    /// Write one mutant of the response numbered `original_id`.
    fn write(&mut self, original_id: u64, mutant: &Mutant) -> Result<()>;

    /// Flush and finalize all output. Nothing is guaranteed on disk before this.
    fn close(&mut self) -> Result<()>;
}

/// Line-delimited JSON shards named `<prefix>-00000.jsonl`, `<prefix>-00001.jsonl`, ...
///
/// Each line is the mutated response with `_hm_original_id`, `_hm_origin`,
/// `_hm_mutator` and `_hm_operator` added. A shard is written to a temporary
/// file in the output directory and renamed into place once complete.
#[derive(Debug)]
pub struct JsonlMutantWriter {
    dir: PathBuf,
    prefix: String,
    max_lines: usize,
    next_shard: usize,
    lines: usize,
    current: Option<BufWriter<NamedTempFile>>,
    written: Vec<PathBuf>,
}

impl JsonlMutantWriter {
    pub fn new(dir: &Path, prefix: impl Into<String>, max_lines: usize) -> Result<Self> {
        ensure!(max_lines > 0, "shard size must be at least one line");
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output dir {:?}", dir))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.into(),
            max_lines,
            next_shard: 0,
            lines: 0,
            current: None,
            written: Vec::new(),
        })
    }

    /// Shards persisted so far, in order.
    pub fn shards(&self) -> &[PathBuf] {
        &self.written
    }

    fn shard_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}-{index:05}.jsonl", self.prefix))
    }

    fn finish_shard(&mut self) -> Result<()> {
        let Some(out) = self.current.take() else {
            return Ok(());
        };

        let path = self.shard_path(self.next_shard);
        let file = out
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("failed to flush {:?}", path))?;
        file.persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to persist {:?}", path))?;

        log::debug!("wrote shard {:?} ({} lines)", path, self.lines);
        self.written.push(path);
        self.next_shard += 1;
        self.lines = 0;
        Ok(())
    }

    fn open_shard(&mut self) -> Result<&mut BufWriter<NamedTempFile>> {
        if self.current.is_none() {
            let file = NamedTempFile::new_in(&self.dir)
                .with_context(|| format!("failed to create temp file in {:?}", self.dir))?;
            self.current = Some(BufWriter::new(file));
        }
        self.current
            .as_mut()
            .context("shard writer is not open")
    }
}

/// The mutated document with the `_hm_*` bookkeeping fields.
pub fn annotated_line(original_id: u64, mutant: &Mutant) -> Value {
    let mut fields = match &mutant.document {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("document".to_string(), other.clone());
            map
        }
    };

    fields.insert("_hm_original_id".to_string(), Value::from(original_id));
    fields.insert("_hm_origin".to_string(), Value::from(mutant.origin_path.as_str()));
    fields.insert("_hm_mutator".to_string(), Value::from(mutant.operator.mutator));
    fields.insert("_hm_operator".to_string(), Value::from(mutant.operator.name));
    Value::Object(fields)
}

impl MutantWriter for JsonlMutantWriter {
    fn write(&mut self, original_id: u64, mutant: &Mutant) -> Result<()> {
        if self.lines >= self.max_lines {
            self.finish_shard()?;
        }

        let line = serde_json::to_string(&annotated_line(original_id, mutant))
            .context("serialize mutant")?;
        let out = self.open_shard()?;
        writeln!(out, "{line}").context("failed to write mutant line")?;
        self.lines += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.finish_shard()
    }
}
