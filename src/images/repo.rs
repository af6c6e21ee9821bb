// Live registry source: recovers image metadata from name patterns

use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use super::docker::ImageSearch;
use super::{Architecture, Image, ImagesLister, Target};

/// Bounded result count for one registry search.
const SEARCH_LIMIT: usize = 100;

/// Compiled image-name patterns for one (target, architecture) pair.
///
/// Builder image names follow
/// `driverkit-builder-<target>-<arch>(_gcc<major>.<minor>.<patch>)+`, with
/// the literal target `any` marking generic images. Compile once per build
/// request and share the result across every repository lister; a request
/// for a different architecture needs a freshly compiled set.
#[derive(Debug)]
pub struct NamePatterns {
    specific: Regex,
    generic: Regex,
}

/// Structured result of matching one image name.
#[derive(Debug)]
struct NameMatch {
    /// Captured target; absent when the generic pattern matched.
    target: Option<String>,
    /// One token per `_gcc<version>` suffix.
    gcc_versions: Vec<String>,
}

impl NamePatterns {
    pub fn compile(target: &Target, architecture: Architecture) -> Result<Self> {
        let specific = Regex::new(&format!(
            "driverkit-builder-(?P<target>{})-{}(?P<gccVers>(_gcc[0-9]+\\.[0-9]+\\.[0-9]+)+)$",
            target, architecture
        ))
        .with_context(|| format!("compiling image name pattern for target {}", target))?;
        let generic = Regex::new(&format!(
            "driverkit-builder-any-{}(?P<gccVers>(_gcc[0-9]+\\.[0-9]+\\.[0-9]+)+)$",
            architecture
        ))
        .context("compiling generic image name pattern")?;
        Ok(NamePatterns { specific, generic })
    }

    /// Tries the target-specific pattern first, then the generic one; the
    /// first match wins.
    fn match_name(&self, name: &str) -> Option<NameMatch> {
        for pattern in [&self.specific, &self.generic] {
            if let Some(caps) = pattern.captures(name) {
                let target = caps.name("target").map(|m| m.as_str().to_string());
                let gcc_versions = caps
                    .name("gccVers")
                    .map(|m| {
                        m.as_str()
                            .split("_gcc")
                            .filter(|token| !token.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default();
                return Some(NameMatch {
                    target,
                    gcc_versions,
                });
            }
        }
        None
    }
}

/// Images recovered from a live registry search over one repository.
pub struct RepoImagesLister {
    repo: String,
    patterns: Arc<NamePatterns>,
    search: Arc<dyn ImageSearch>,
}

impl RepoImagesLister {
    pub fn new(
        repo: impl Into<String>,
        patterns: Arc<NamePatterns>,
        search: Arc<dyn ImageSearch>,
    ) -> Self {
        RepoImagesLister {
            repo: repo.into(),
            patterns,
            search,
        }
    }
}

impl ImagesLister for RepoImagesLister {
    fn load_images(&self) -> Result<Vec<Image>> {
        let names = match self.search.search(&self.repo, SEARCH_LIMIT) {
            Ok(names) => names,
            Err(err) => {
                // An unreachable or misconfigured repo must not abort the
                // whole resolution; other sources may still satisfy it.
                warn!(repository = %self.repo, error = %err, "skipping repo");
                return Ok(Vec::new());
            }
        };

        let mut res = Vec::new();
        for name in names {
            let Some(matched) = self.patterns.match_name(&name) else {
                continue;
            };
            if matched.gcc_versions.is_empty() {
                debug!(image = %name, "malformed image name");
                continue;
            }

            // Generic images are stored under the `any` target, not the
            // requested one: a lower-priority repo may still offer a
            // genuinely target-specific image for the same gcc version,
            // and that one must stay distinguishable.
            let target = match matched.target.as_deref() {
                Some(captured) => Target::from(captured),
                None => Target::Any,
            };
            for gcc in &matched.gcc_versions {
                let gcc_version = gcc.parse().with_context(|| {
                    format!("invalid gcc version {:?} in image name {:?}", gcc, name)
                })?;
                res.push(Image {
                    target: target.clone(),
                    gcc_version,
                    name: name.clone(),
                });
            }
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::RefCell;

    struct StaticSearch {
        names: Vec<&'static str>,
        calls: RefCell<Vec<(String, usize)>>,
    }

    impl StaticSearch {
        fn new(names: Vec<&'static str>) -> Self {
            StaticSearch {
                names,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ImageSearch for StaticSearch {
        fn search(&self, term: &str, limit: usize) -> Result<Vec<String>> {
            self.calls.borrow_mut().push((term.to_string(), limit));
            Ok(self.names.iter().map(|name| name.to_string()).collect())
        }
    }

    struct FailingSearch;

    impl ImageSearch for FailingSearch {
        fn search(&self, _term: &str, _limit: usize) -> Result<Vec<String>> {
            bail!("cannot connect to the container daemon")
        }
    }

    fn patterns_for_t1() -> Arc<NamePatterns> {
        Arc::new(NamePatterns::compile(&Target::from("t1"), Architecture::Amd64).unwrap())
    }

    #[test]
    fn test_multi_suffix_name_yields_one_image_per_version() {
        let search = Arc::new(StaticSearch::new(vec![
            "driverkit-builder-t1-x86_64_gcc5.0.0_gcc6.0.0",
        ]));
        let lister = RepoImagesLister::new("repo", patterns_for_t1(), search);

        let images = lister.load_images().unwrap();
        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|image| image.target == Target::from("t1")));
        assert_eq!(images[0].gcc_version, "5.0.0".parse().unwrap());
        assert_eq!(images[1].gcc_version, "6.0.0".parse().unwrap());
        assert!(images
            .iter()
            .all(|image| image.name == "driverkit-builder-t1-x86_64_gcc5.0.0_gcc6.0.0"));
    }

    #[test]
    fn test_generic_name_keeps_the_any_target() {
        let search = Arc::new(StaticSearch::new(vec![
            "driverkit-builder-any-x86_64_gcc8.0.0",
        ]));
        let lister = RepoImagesLister::new("repo", patterns_for_t1(), search);

        let images = lister.load_images().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].target, Target::Any);
        assert_eq!(images[0].gcc_version, "8.0.0".parse().unwrap());
    }

    #[test]
    fn test_unrelated_names_are_ignored() {
        let search = Arc::new(StaticSearch::new(vec![
            // wrong architecture
            "driverkit-builder-t1-aarch64_gcc5.0.0",
            // wrong target
            "driverkit-builder-t2-x86_64_gcc5.0.0",
            // no gcc suffix at all
            "driverkit-builder-t1-x86_64",
            "some/unrelated-image",
        ]));
        let lister = RepoImagesLister::new("repo", patterns_for_t1(), search);

        assert!(lister.load_images().unwrap().is_empty());
    }

    #[test]
    fn test_failed_search_degrades_to_no_images() {
        let lister = RepoImagesLister::new("repo", patterns_for_t1(), Arc::new(FailingSearch));
        assert!(lister.load_images().unwrap().is_empty());
    }

    #[test]
    fn test_search_receives_repo_and_result_limit() {
        let search = Arc::new(StaticSearch::new(vec![]));
        let search_dyn: Arc<dyn ImageSearch> = Arc::clone(&search) as Arc<dyn ImageSearch>;
        let lister =
            RepoImagesLister::new("org/builder-images", patterns_for_t1(), search_dyn);

        lister.load_images().unwrap();
        assert_eq!(
            *search.calls.borrow(),
            vec![("org/builder-images".to_string(), 100)]
        );
    }

    #[test]
    fn test_truncated_gcc_suffix_does_not_match() {
        let search = Arc::new(StaticSearch::new(vec![
            "driverkit-builder-t1-x86_64_gcc5",
            "driverkit-builder-t1-x86_64_gcc5.0",
        ]));
        let lister = RepoImagesLister::new("repo", patterns_for_t1(), search);

        assert!(lister.load_images().unwrap().is_empty());
    }

    #[test]
    fn test_any_request_matches_generic_names_once() {
        let patterns =
            Arc::new(NamePatterns::compile(&Target::Any, Architecture::Amd64).unwrap());
        let search = Arc::new(StaticSearch::new(vec![
            "driverkit-builder-any-x86_64_gcc8.0.0",
        ]));
        let lister = RepoImagesLister::new("repo", patterns, search);

        let images = lister.load_images().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].target, Target::Any);
    }
}
