//! Asset system: loads meshes and clips from disk and registers materials.
//!
//! Ids are content hashes, so two files with identical bytes resolve to one
//! resource. The store never keeps a resource alive on its own.

mod formats;
mod loader;
mod store;

pub use formats::{MeshInfo, encode_silent_wav, parse_gltf, parse_obj, parse_wav_duration};
pub use loader::{LoadSummary, MeshLoadRequest};
pub use store::{AssetError, AssetKind, AssetLoader, AssetStore, ManifestEntry, content_hash};

pub fn crate_info() -> &'static str {
    "framecore-assets v0.1.0"
}
