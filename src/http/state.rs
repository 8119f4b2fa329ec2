use std::path::PathBuf;
use crate::store::ImageStore;

/// Shared application state injected into route handlers via axum::extract::State.
/// ImageStore is a cheap-clone handle; all fields are fixed at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: ImageStore,
    /// Static asset root served for "/" and every unrouted path.
    pub site_dir: PathBuf,
    /// Where uploaded binaries land: <site_dir>/uploads, served at /uploads/*.
    pub uploads_dir: PathBuf,
}

impl AppState {
    /// Derive the full state from a data root using the fixed layout:
    /// <root>/images.json, <root>/site, <root>/site/uploads.
    pub fn from_root(root: &std::path::Path, strict_store: bool) -> Self {
        let site_dir = root.join("site");
        let uploads_dir = site_dir.join("uploads");
        AppState {
            store: ImageStore::new(root.join("images.json"), strict_store),
            site_dir,
            uploads_dir,
        }
    }
}
