// Container registry search through the docker/podman CLI

use std::process::Command;

use anyhow::{bail, Context, Result};

/// Capability to search a container registry for repository names.
///
/// The production implementation shells out to the container CLI; tests
/// substitute a stub.
pub trait ImageSearch {
    /// Returns the image names matching `term`, at most `limit` of them.
    fn search(&self, term: &str, limit: usize) -> Result<Vec<String>>;
}

/// Registry search via `docker search` (or `podman search`).
#[derive(Debug, Clone)]
pub struct DockerCliSearch {
    container_cli: String,
}

impl DockerCliSearch {
    pub fn new(container_cli: impl Into<String>) -> Self {
        DockerCliSearch {
            container_cli: container_cli.into(),
        }
    }
}

impl Default for DockerCliSearch {
    fn default() -> Self {
        DockerCliSearch::new("docker")
    }
}

impl ImageSearch for DockerCliSearch {
    fn search(&self, term: &str, limit: usize) -> Result<Vec<String>> {
        let output = Command::new(&self.container_cli)
            .args([
                "search",
                term,
                "--limit",
                &limit.to_string(),
                "--format",
                "{{.Name}}",
            ])
            .output()
            .with_context(|| format!("failed to execute {} search", self.container_cli))?;

        if !output.status.success() {
            bail!(
                "{} search failed with status {}: {}",
                self.container_cli,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(parse_search_output(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}

/// One repository name per line, as produced by `--format {{.Name}}`.
fn parse_search_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
