// Static manifest of builder images (operator-authored YAML)

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;

use super::{Image, ImagesLister, Target};

#[derive(Debug, Deserialize)]
struct ManifestImage {
    target: String,
    name: String,
    /// Versions the one named image internally links, e.g. gcc5 -> gcc 5.0.0.
    gcc_versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    images: Vec<ManifestImage>,
}

/// Images declared by a YAML manifest file:
///
/// ```yaml
/// images:
///   - target: centos
///     name: registry.example.com/builder:centos
///     gcc_versions: ["9.0.0", "10"]
/// ```
///
/// The manifest is the operator's explicit, authoritative input: unreadable
/// or garbled content aborts the resolution rather than silently degrading
/// it.
#[derive(Debug)]
pub struct FileImagesLister {
    pub file_path: PathBuf,
}

impl FileImagesLister {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        FileImagesLister {
            file_path: file_path.into(),
        }
    }
}

impl ImagesLister for FileImagesLister {
    fn load_images(&self) -> Result<Vec<Image>> {
        let path = &self.file_path;
        let raw = fs::read_to_string(path)
            .with_context(|| format!("error opening builder images file {}", path.display()))?;
        let manifest: Manifest = serde_yaml::from_str(&raw)
            .with_context(|| format!("error parsing builder images file {}", path.display()))?;

        if manifest.images.is_empty() {
            warn!(file = %path.display(), "invalid image list: expected at least 1 image");
        }

        let mut res = Vec::new();
        for entry in manifest.images {
            if entry.gcc_versions.is_empty() {
                bail!(
                    "invalid image list {}: image {:?} declares no gcc versions",
                    path.display(),
                    entry.name
                );
            }
            let target = Target::from(entry.target.as_str());
            for gcc in &entry.gcc_versions {
                let gcc_version = gcc.parse().with_context(|| {
                    format!(
                        "invalid gcc version {:?} for image {:?} in {}",
                        gcc,
                        entry.name,
                        path.display()
                    )
                })?;
                res.push(Image {
                    target: target.clone(),
                    gcc_version,
                    name: entry.name.clone(),
                });
            }
        }
        Ok(res)
    }
}
