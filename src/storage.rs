use std::{
    io,
    path::{Path, PathBuf},
};

use tracing::info;
use uuid::Uuid;

/// Always probed, whatever the current allow-list says.
const CANONICAL_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// Flat directory of `{image_id}.{ext}` files. There is no index: an
/// identifier resolves if a file exists under one of the probe extensions.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    probe_extensions: Vec<String>,
}

pub fn generate_image_id() -> String {
    Uuid::new_v4().to_string()
}

/// Identifiers we hand out are UUIDs; anything with path syntax in it can
/// never name a stored file.
pub fn is_well_formed_id(image_id: &str) -> bool {
    !image_id.is_empty()
        && image_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl ImageStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    /// Lookups probe `.jpg`, `.png` and then each of `allowed_extensions`.
    pub fn open<P: AsRef<Path>>(root: P, allowed_extensions: &[String]) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            info!("Creating upload directory {}", root.display());
        }
        std::fs::create_dir_all(&root)?;

        let mut probe_extensions: Vec<String> =
            CANONICAL_EXTENSIONS.iter().map(|ext| ext.to_string()).collect();
        for extension in allowed_extensions {
            let extension = extension.to_ascii_lowercase();
            if !probe_extensions.contains(&extension) {
                probe_extensions.push(extension);
            }
        }

        Ok(ImageStore {
            root,
            probe_extensions,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, image_id: &str, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", image_id, extension.to_ascii_lowercase()))
    }

    pub async fn write(&self, image_id: &str, extension: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(image_id, extension);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    pub async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    /// Existence probe only; file contents are never read.
    pub async fn exists(&self, image_id: &str) -> io::Result<bool> {
        if !is_well_formed_id(image_id) {
            return Ok(false);
        }

        for extension in &self.probe_extensions {
            if tokio::fs::try_exists(self.path_for(image_id, extension)).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
