use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use framecore_common::{
    AudioClip, BlendMode, ClipHandle, MaterialHandle, MaterialResource, MeshHandle, MeshResource,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info_span, warn};

use crate::formats::{self, MeshInfo};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),
    #[error("corrupt asset {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("unsupported asset format: {0}")]
    UnsupportedFormat(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("scene handoff failed: {0}")]
    Handoff(#[from] framecore_scene::HandoffError),
}

/// The asset system as the rest of the core sees it.
pub trait AssetLoader {
    fn load_mesh(&self, path: &Path) -> Result<Arc<MeshResource>, AssetError>;
    fn load_clip(&self, path: &Path) -> Result<AudioClip, AssetError>;
    fn register_material(&self, name: &str, base_color: [f32; 4], blend: BlendMode) -> Arc<MaterialResource>;
}

/// Compute a content hash for asset data.
pub fn content_hash(data: &[u8]) -> u64 {
    let digest = Sha256::digest(data);
    u64::from_le_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    Mesh,
    Material,
    Clip,
}

/// One line of the asset manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub kind: AssetKind,
    pub id: u64,
    pub name: String,
    pub source: Option<PathBuf>,
    pub resident: bool,
}

#[derive(Default)]
struct Caches {
    meshes: HashMap<MeshHandle, (PathBuf, Weak<MeshResource>)>,
    materials: HashMap<MaterialHandle, Weak<MaterialResource>>,
    clips: BTreeMap<ClipHandle, (PathBuf, AudioClip)>,
}

/// File-backed asset store with content-addressed ids.
///
/// Meshes and materials are cached weakly: repeated loads share one
/// resource while any holder keeps it alive. Safe to share across loader
/// threads.
#[derive(Default)]
pub struct AssetStore {
    root: Option<PathBuf>,
    caches: Mutex<Caches>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative paths are resolved against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            caches: Mutex::default(),
        }
    }

    fn caches(&self) -> MutexGuard<'_, Caches> {
        self.caches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn read(&self, path: &Path) -> Result<(PathBuf, Vec<u8>), AssetError> {
        let resolved = self.resolve(path);
        match fs::read(&resolved) {
            Ok(bytes) => Ok((resolved, bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AssetError::NotFound(resolved)),
            Err(source) => Err(AssetError::Io { path: resolved, source }),
        }
    }

    /// Mark a cached mesh non-resident. Renderables holding it stop being
    /// drawn; a later `load_mesh` of the same bytes makes it resident again.
    pub fn evict(&self, handle: MeshHandle) -> bool {
        let caches = self.caches();
        match caches.meshes.get(&handle).and_then(|(_, weak)| weak.upgrade()) {
            Some(mesh) => {
                mesh.set_resident(false);
                debug!(mesh = handle.0, "evicted");
                true
            }
            None => false,
        }
    }

    /// Cached mesh by handle, if some holder still keeps it alive.
    pub fn mesh(&self, handle: MeshHandle) -> Option<Arc<MeshResource>> {
        self.caches().meshes.get(&handle).and_then(|(_, weak)| weak.upgrade())
    }

    pub fn clip(&self, handle: ClipHandle) -> Option<AudioClip> {
        self.caches().clips.get(&handle).map(|(_, clip)| *clip)
    }

    /// Drop cache entries whose resources have no holders left.
    pub fn prune(&self) -> usize {
        let mut caches = self.caches();
        let before = caches.meshes.len() + caches.materials.len();
        caches.meshes.retain(|_, (_, weak)| weak.strong_count() > 0);
        caches.materials.retain(|_, weak| weak.strong_count() > 0);
        before - caches.meshes.len() - caches.materials.len()
    }

    /// Live assets, sorted by kind then id.
    pub fn manifest(&self) -> Vec<ManifestEntry> {
        let caches = self.caches();
        let mut entries = Vec::new();
        for (handle, (path, weak)) in &caches.meshes {
            if let Some(mesh) = weak.upgrade() {
                entries.push(ManifestEntry {
                    kind: AssetKind::Mesh,
                    id: handle.0,
                    name: mesh.name.clone(),
                    source: Some(path.clone()),
                    resident: mesh.is_resident(),
                });
            }
        }
        for (handle, weak) in &caches.materials {
            if let Some(material) = weak.upgrade() {
                entries.push(ManifestEntry {
                    kind: AssetKind::Material,
                    id: handle.0,
                    name: material.name.clone(),
                    source: None,
                    resident: true,
                });
            }
        }
        for (handle, (path, _)) in &caches.clips {
            entries.push(ManifestEntry {
                kind: AssetKind::Clip,
                id: handle.0,
                name: file_stem(path),
                source: Some(path.clone()),
                resident: true,
            });
        }
        entries.sort_by_key(|e| (e.kind, e.id));
        entries
    }

    /// Write the manifest as JSON.
    pub fn save_manifest(&self, path: &Path) -> Result<(), AssetError> {
        let json = serde_json::to_string_pretty(&self.manifest()).map_err(|e| AssetError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl AssetLoader for AssetStore {
    fn load_mesh(&self, path: &Path) -> Result<Arc<MeshResource>, AssetError> {
        let _span = info_span!("load_mesh", path = %path.display()).entered();
        let ext = extension(path);
        let parse: fn(&[u8], &str) -> Result<MeshInfo, String> = match ext.as_str() {
            "gltf" => formats::parse_gltf,
            "obj" => formats::parse_obj,
            _ => return Err(AssetError::UnsupportedFormat(ext)),
        };
        let (resolved, bytes) = self.read(path)?;
        let handle = MeshHandle(content_hash(&bytes));

        let mut caches = self.caches();
        if let Some(mesh) = caches.meshes.get(&handle).and_then(|(_, weak)| weak.upgrade()) {
            mesh.set_resident(true);
            debug!(mesh = handle.0, "cache hit");
            return Ok(mesh);
        }

        let info = parse(&bytes, &file_stem(&resolved)).map_err(|reason| {
            warn!(path = %resolved.display(), %reason, "corrupt mesh");
            AssetError::Corrupt {
                path: resolved.clone(),
                reason,
            }
        })?;
        let mesh = Arc::new(MeshResource::new(
            handle,
            info.name,
            info.vertex_count,
            info.index_count,
            info.bounds,
        ));
        caches.meshes.insert(handle, (resolved, Arc::downgrade(&mesh)));
        debug!(
            mesh = handle.0,
            vertices = mesh.vertex_count,
            indices = mesh.index_count,
            "mesh loaded"
        );
        Ok(mesh)
    }

    fn load_clip(&self, path: &Path) -> Result<AudioClip, AssetError> {
        let _span = info_span!("load_clip", path = %path.display()).entered();
        let ext = extension(path);
        if ext != "wav" {
            return Err(AssetError::UnsupportedFormat(ext));
        }
        let (resolved, bytes) = self.read(path)?;
        let handle = ClipHandle(content_hash(&bytes));
        if let Some(clip) = self.clip(handle) {
            return Ok(clip);
        }
        let duration = formats::parse_wav_duration(&bytes).map_err(|reason| AssetError::Corrupt {
            path: resolved.clone(),
            reason,
        })?;
        let clip = AudioClip { handle, duration };
        self.caches().clips.insert(handle, (resolved, clip));
        debug!(clip = handle.0, duration, "clip loaded");
        Ok(clip)
    }

    fn register_material(&self, name: &str, base_color: [f32; 4], blend: BlendMode) -> Arc<MaterialResource> {
        let mut key = Vec::with_capacity(name.len() + 17);
        key.extend_from_slice(name.as_bytes());
        for c in base_color {
            key.extend_from_slice(&c.to_le_bytes());
        }
        key.push(blend as u8);
        let handle = MaterialHandle(content_hash(&key));

        let mut caches = self.caches();
        if let Some(material) = caches.materials.get(&handle).and_then(Weak::upgrade) {
            return material;
        }
        let material = Arc::new(MaterialResource {
            handle,
            name: name.to_string(),
            base_color,
            blend,
        });
        caches.materials.insert(handle, Arc::downgrade(&material));
        material
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}
