// Builder image model and the priority-merged image registry

pub mod arch;
pub mod docker;
pub mod manifest;
pub mod repo;
pub mod version;

use std::collections::HashMap;
use std::fmt;

use anyhow::{bail, Result};

pub use arch::Architecture;
pub use version::GccVersion;

/// Platform/distribution family a builder image is specialized for.
///
/// `Any` marks images not tied to a specific target. The registry lookup
/// always prefers a target-specific image over an `Any` one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Any,
    Distro(String),
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        if s == "any" {
            Target::Any
        } else {
            Target::Distro(s.to_string())
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Any => f.write_str("any"),
            Target::Distro(name) => f.write_str(name),
        }
    }
}

/// A container builder image offering one gcc toolchain for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub target: Target,
    pub gcc_version: GccVersion,
    /// Reference name of the underlying container image. Descriptive only;
    /// never part of identity or lookup.
    pub name: String,
}

impl Image {
    fn key(&self) -> ImageKey {
        ImageKey::new(&self.target, self.gcc_version)
    }
}

/// Identity of an image: its target and gcc version, never its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey(String);

impl ImageKey {
    fn new(target: &Target, gcc_version: GccVersion) -> Self {
        ImageKey(format!("{}_{}", target, gcc_version))
    }
}

/// Anything that can produce candidate builder images from a backing store.
///
/// Returning `Err` aborts the whole resolution (corrupt authoritative
/// input); implementations degrade per-source transient failures to an
/// empty list themselves.
pub trait ImagesLister {
    fn load_images(&self) -> Result<Vec<Image>>;
}

/// Deduplicated (target, gcc version) -> image mapping.
#[derive(Debug, Default)]
pub struct ImagesMap {
    images: HashMap<ImageKey, Image>,
}

impl ImagesMap {
    /// First writer wins: later sources never displace an existing entry.
    fn insert_if_absent(&mut self, image: Image) {
        self.images.entry(image.key()).or_insert(image);
    }

    /// Looks up the image for the exact target first, then falls back to an
    /// `Any` image offering the same gcc version.
    pub fn find_image(&self, target: &Target, gcc_version: GccVersion) -> Option<&Image> {
        self.images
            .get(&ImageKey::new(target, gcc_version))
            .or_else(|| self.images.get(&ImageKey::new(&Target::Any, gcc_version)))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Image> {
        self.images.values()
    }
}

/// One build request: what to resolve and which sources to consult.
pub struct Build {
    pub target: Target,
    pub architecture: Architecture,
    /// When set, only images providing exactly this version are considered.
    pub gcc_version: Option<GccVersion>,
    /// Most trusted source first; earlier sources claim keys permanently.
    pub listers: Vec<Box<dyn ImagesLister>>,
}

impl Build {
    /// Populates the image registry from every configured source, in
    /// priority order. An empty registry afterwards means no image can
    /// satisfy the build, which is fatal.
    pub fn load_images(&self) -> Result<ImagesMap> {
        let mut images = ImagesMap::default();
        for lister in &self.listers {
            for image in lister.load_images()? {
                if let Some(fixed) = self.gcc_version {
                    if image.gcc_version != fixed {
                        continue;
                    }
                }
                images.insert_if_absent(image);
            }
        }
        if images.is_empty() {
            bail!("could not load any builder image");
        }
        Ok(images)
    }
}
