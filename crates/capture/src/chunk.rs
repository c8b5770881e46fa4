//! Chunk files
//!
//! An immutable, sequentially-numbered file holding a contiguous slice of
//! a session's raw samples. Newline-delimited JSON: the first line is the
//! chunk metadata, then one sample per line. Files are written to a temp
//! name and renamed so a crash never leaves a half-written chunk behind.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use suburi_model::{ChunkMeta, InertialSample};

use crate::error::{CaptureError, Result};

/// A written chunk and the facts finalize will claim about it
#[derive(Debug, Clone)]
pub struct ChunkFile {
    pub index: u32,
    pub path: PathBuf,
    pub filename: String,
    pub bytes_size: i64,
    pub sha256_hex: String,
    pub num_samples: i64,
}

/// Canonical chunk file name for an index (1-based on disk)
pub fn chunk_filename(index: u32) -> String {
    format!("chunk-{:06}.jsonl", index + 1)
}

/// Serialize and write one chunk
pub fn write_chunk(
    dir: &Path,
    meta: &ChunkMeta,
    index: u32,
    samples: &[InertialSample],
) -> Result<ChunkFile> {
    let mut body = Vec::with_capacity(64 * samples.len());
    let mut meta = meta.clone();
    meta.chunk_index = index;

    serde_json::to_writer(&mut body, &meta)?;
    body.push(b'\n');
    for sample in samples {
        serde_json::to_writer(&mut body, sample)?;
        body.push(b'\n');
    }

    let sha256_hex = hex::encode(Sha256::digest(&body));
    let filename = chunk_filename(index);
    let path = dir.join(&filename);
    let tmp = dir.join(format!(".{}.tmp", filename));

    fs::create_dir_all(dir)?;
    fs::write(&tmp, &body)?;
    fs::rename(&tmp, &path)?;

    debug!(
        chunk = %filename,
        samples = samples.len(),
        bytes = body.len(),
        "Wrote chunk"
    );

    Ok(ChunkFile {
        index,
        path,
        filename,
        bytes_size: body.len() as i64,
        sha256_hex,
        num_samples: samples.len() as i64,
    })
}

/// Read a chunk back (resume and post-hoc analysis)
pub fn read_chunk(path: &Path) -> Result<(ChunkMeta, Vec<InertialSample>)> {
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();

    let meta_line = lines.next().ok_or_else(|| {
        CaptureError::Internal(format!("empty chunk file: {}", path.display()))
    })?;
    let meta: ChunkMeta = serde_json::from_str(meta_line)?;

    let mut samples = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        samples.push(serde_json::from_str(line)?);
    }

    Ok((meta, samples))
}
