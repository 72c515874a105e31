//! Durable storage for the index + docstore pair.
//!
//! Each build is written into its own generation directory and made visible
//! by atomically replacing the `CURRENT` pointer file, so readers always see
//! an index and docstore from the same build.
//!
//! Layout under the artifacts root:
//!
//! ```text
//! CURRENT                      name of the live generation
//! generations/<name>/index.bin
//! generations/<name>/docstore.json
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::error::RagError;
use super::index::{DocStore, VectorIndex};

const INDEX_MAGIC: &[u8; 8] = b"CHSPIDX1";
const HEADER_LEN: usize = 8 + 4 + 8;
const DIGEST_LEN: usize = 32;

pub const INDEX_FILE: &str = "index.bin";
pub const DOCSTORE_FILE: &str = "docstore.json";
const CURRENT_FILE: &str = "CURRENT";
const GENERATIONS_DIR: &str = "generations";

/// Serialize the index: magic, dimension, count, f32 LE values, SHA-256.
pub fn encode_index(index: &VectorIndex) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + index.len() * index.dimension() * 4 + DIGEST_LEN);
    bytes.extend_from_slice(INDEX_MAGIC);
    bytes.extend_from_slice(&(index.dimension() as u32).to_le_bytes());
    bytes.extend_from_slice(&(index.len() as u64).to_le_bytes());
    for value in index.values() {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    let digest = Sha256::digest(&bytes);
    bytes.extend_from_slice(&digest);
    bytes
}

pub fn decode_index(bytes: &[u8], path: &Path) -> Result<VectorIndex, RagError> {
    if bytes.len() < HEADER_LEN + DIGEST_LEN {
        return Err(RagError::corrupt(path, "file too short for header"));
    }
    if &bytes[..8] != INDEX_MAGIC {
        return Err(RagError::corrupt(path, "unrecognized index format"));
    }

    let (body, digest) = bytes.split_at(bytes.len() - DIGEST_LEN);
    if Sha256::digest(body).as_slice() != digest {
        return Err(RagError::corrupt(path, "checksum mismatch"));
    }

    let dimension = u32::from_le_bytes([body[8], body[9], body[10], body[11]]) as usize;
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&body[12..20]);
    let count = u64::from_le_bytes(count_bytes) as usize;

    let payload = &body[HEADER_LEN..];
    let expected = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| RagError::corrupt(path, "declared shape overflows"))?;
    if payload.len() != expected {
        return Err(RagError::corrupt(
            path,
            format!("expected {} payload bytes, found {}", expected, payload.len()),
        ));
    }
    if count > 0 && dimension == 0 {
        return Err(RagError::corrupt(path, "vectors declared with zero dimension"));
    }

    let values = payload
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    VectorIndex::from_flat(dimension, count, values).map_err(|e| RagError::corrupt(path, e))
}

pub fn load_index(path: &Path) -> Result<VectorIndex, RagError> {
    if !path.exists() {
        return Err(RagError::MissingFile(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|e| RagError::corrupt(path, e))?;
    decode_index(&bytes, path)
}

pub fn load_docstore(path: &Path) -> Result<DocStore, RagError> {
    if !path.exists() {
        return Err(RagError::MissingFile(path.to_path_buf()));
    }
    let contents = fs::read(path).map_err(|e| RagError::corrupt(path, e))?;
    let docstore: DocStore =
        serde_json::from_slice(&contents).map_err(|e| RagError::corrupt(path, e))?;
    if docstore.texts().len() != docstore.metas().len() {
        return Err(RagError::corrupt(
            path,
            format!(
                "{} texts but {} metadata entries",
                docstore.texts().len(),
                docstore.metas().len()
            ),
        ));
    }
    Ok(docstore)
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), RagError> {
    let mut file = fs::File::create(path).map_err(|e| RagError::persistence(path, e))?;
    file.write_all(bytes)
        .map_err(|e| RagError::persistence(path, e))?;
    file.sync_all().map_err(|e| RagError::persistence(path, e))
}

/// Flush directory entries so a completed rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Loaded artifacts of the live generation.
#[derive(Debug)]
pub struct LoadedArtifacts {
    pub generation: String,
    pub index: VectorIndex,
    pub docstore: DocStore,
}

/// Publishes and loads generations under one artifacts root.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn current_path(&self) -> PathBuf {
        self.root.join(CURRENT_FILE)
    }

    fn generations_dir(&self) -> PathBuf {
        self.root.join(GENERATIONS_DIR)
    }

    pub fn generation_dir(&self, generation: &str) -> PathBuf {
        self.generations_dir().join(generation)
    }

    /// Name of the live generation, if any build was published.
    pub fn current_generation(&self) -> Result<Option<String>, RagError> {
        let path = self.current_path();
        if !path.exists() {
            return Ok(None);
        }
        let name = fs::read_to_string(&path).map_err(|e| RagError::corrupt(&path, e))?;
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(RagError::corrupt(&path, "invalid generation name"));
        }
        Ok(Some(name.to_string()))
    }

    /// Write both artifacts, then switch `CURRENT` to them.
    ///
    /// On failure the staging directory is removed and the previously
    /// published generation stays live.
    pub fn publish(&self, index: &VectorIndex, docstore: &DocStore) -> Result<String, RagError> {
        if index.len() != docstore.len() {
            return Err(RagError::Consistency {
                index: index.len(),
                docstore: docstore.len(),
            });
        }

        let generations = self.generations_dir();
        fs::create_dir_all(&generations).map_err(|e| RagError::persistence(&generations, e))?;

        let index_bytes = encode_index(index);
        let docstore_bytes =
            serde_json::to_vec(docstore).map_err(|e| RagError::persistence(&self.root, e))?;

        let required = (index_bytes.len() + docstore_bytes.len()) as u64;
        if let Ok(available) = fs2::available_space(&generations) {
            if available < required {
                return Err(RagError::persistence(
                    &generations,
                    format!("needs {} bytes but only {} available", required, available),
                ));
            }
        }

        let previous = self.current_generation().ok().flatten();
        let generation = format!(
            "{}-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.9f"),
            uuid::Uuid::new_v4().simple()
        );
        let staging = self.generation_dir(&generation);

        let written = self.write_generation(&staging, &index_bytes, &docstore_bytes, &generation);
        if let Err(err) = written {
            let _ = fs::remove_dir_all(&staging);
            let _ = fs::remove_file(self.root.join(format!("{}.tmp", CURRENT_FILE)));
            return Err(err);
        }

        tracing::info!(
            "Published generation {} ({} vectors) to {}",
            generation,
            index.len(),
            self.root.display()
        );
        self.prune(&generation, previous.as_deref());
        Ok(generation)
    }

    fn write_generation(
        &self,
        staging: &Path,
        index_bytes: &[u8],
        docstore_bytes: &[u8],
        generation: &str,
    ) -> Result<(), RagError> {
        fs::create_dir_all(staging).map_err(|e| RagError::persistence(staging, e))?;
        write_synced(&staging.join(INDEX_FILE), index_bytes)?;
        write_synced(&staging.join(DOCSTORE_FILE), docstore_bytes)?;

        let tmp_path = self.root.join(format!("{}.tmp", CURRENT_FILE));
        write_synced(&tmp_path, generation.as_bytes())?;
        let current = self.current_path();
        fs::rename(&tmp_path, &current).map_err(|e| RagError::persistence(&current, e))?;

        // The switch is already visible; a failed flush only weakens durability.
        if let Err(e) = sync_dir(&self.root) {
            tracing::warn!("Failed to sync {}: {}", self.root.display(), e);
        }
        Ok(())
    }

    /// Remove generations that sort before the predecessor of `keep`.
    ///
    /// Names start with a UTC timestamp, so anything newer than `previous`
    /// may belong to a concurrent publish that has not switched yet.
    fn prune(&self, keep: &str, previous: Option<&str>) {
        let Some(previous) = previous else {
            return;
        };
        let Ok(entries) = fs::read_dir(self.generations_dir()) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name == keep || name.as_str() >= previous {
                continue;
            }
            if let Err(e) = fs::remove_dir_all(entry.path()) {
                tracing::warn!("Failed to prune generation {}: {}", name, e);
            }
        }
    }

    /// Load the live generation and check that its two halves agree.
    pub fn load(&self) -> Result<LoadedArtifacts, RagError> {
        let generation = self
            .current_generation()?
            .ok_or_else(|| RagError::MissingFile(self.current_path()))?;
        let dir = self.generation_dir(&generation);

        let index = load_index(&dir.join(INDEX_FILE))?;
        let docstore = load_docstore(&dir.join(DOCSTORE_FILE))?;
        if index.len() != docstore.len() {
            return Err(RagError::Consistency {
                index: index.len(),
                docstore: docstore.len(),
            });
        }

        tracing::info!(
            "Loaded generation {} with {} entries (dimension {})",
            generation,
            index.len(),
            index.dimension()
        );
        Ok(LoadedArtifacts {
            generation,
            index,
            docstore,
        })
    }
}
