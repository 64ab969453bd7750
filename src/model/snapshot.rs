//! On-disk model snapshots.
//!
//! A snapshot is the CBOR encoding of the whole [`Model`] together with a
//! format version and the fingerprint of the corpus it was built from.
//! Anything that does not match is treated as absent, which makes the caller
//! rebuild from scratch.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{error::BuildError, model::Model};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    fingerprint: u64,
    model: &'a Model,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
    fingerprint: u64,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    fingerprint: u64,
    model: Model,
}

/// Write `model` to `path`.
pub fn save<P: AsRef<Path>>(path: P, model: &Model) -> Result<(), BuildError> {
    let path = path.as_ref();
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        fingerprint: model.corpus().fingerprint(),
        model,
    };
    let file = File::create(path)?;
    serde_cbor::to_writer(BufWriter::new(file), &snapshot)?;
    info!(path = %path.display(), docs = model.len(), "snapshot saved");
    Ok(())
}

/// Read the model stored at `path` if it was built from a corpus with
/// `fingerprint`. Every failure is logged and reported as `None`.
pub fn load<P: AsRef<Path>>(path: P, fingerprint: u64) -> Option<Model> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            info!(path = %path.display(), error = %e, "no usable snapshot");
            return None;
        }
    };
    let snapshot: Snapshot = match serde_cbor::from_reader(BufReader::new(file)) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            // 古い形式ならヘッダだけは読める
            if let Some(header) = read_header(path) {
                if header.version != SNAPSHOT_VERSION {
                    warn!(path = %path.display(), found = header.version, expected = SNAPSHOT_VERSION, "snapshot version mismatch");
                    return None;
                }
            }
            warn!(path = %path.display(), error = %e, "snapshot unreadable");
            return None;
        }
    };
    if snapshot.version != SNAPSHOT_VERSION {
        warn!(path = %path.display(), found = snapshot.version, expected = SNAPSHOT_VERSION, "snapshot version mismatch");
        return None;
    }
    if snapshot.fingerprint != fingerprint {
        warn!(path = %path.display(), "snapshot was built from a different corpus");
        return None;
    }
    info!(path = %path.display(), docs = snapshot.model.len(), "snapshot loaded");
    Some(snapshot.model)
}

fn read_header(path: &Path) -> Option<Header> {
    let file = File::open(path).ok()?;
    serde_cbor::from_reader(BufReader::new(file)).ok()
}
