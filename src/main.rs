use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod images;

use images::docker::{DockerCliSearch, ImageSearch};
use images::manifest::FileImagesLister;
use images::repo::{NamePatterns, RepoImagesLister};
use images::{Architecture, Build, GccVersion, Target};

#[derive(Parser, Debug)]
#[command(author, version, about = "Resolves the container builder image for a kernel-module build", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: config::ConfigOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the builder image for a target/architecture/gcc combination
    Resolve {
        /// Target distribution the kernel module is built for (or "any")
        #[arg(long)]
        target: String,
        /// Build architecture (x86_64/amd64 or aarch64/arm64)
        #[arg(long, default_value = "x86_64")]
        architecture: String,
        /// Only consider images providing exactly this gcc version
        #[arg(long)]
        gcc_version: Option<String>,
        /// Builder images manifest file; the most trusted source when given
        #[arg(long)]
        images_file: Option<String>,
        /// Docker repository to search; repeatable, in descending priority
        #[arg(long = "builder-repo", default_value = "driverkit-builder")]
        builder_repos: Vec<String>,
        /// Container CLI used for registry searches (docker or podman)
        #[arg(long, default_value = "docker")]
        container_cli: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let errors = cli.config.validate();
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("Error: {}", error);
        }
        std::process::exit(1);
    }

    // RUST_LOG overrides the --loglevel flag
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| cli.config.loglevel.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &cli.command {
        Commands::Resolve {
            target,
            architecture,
            gcc_version,
            images_file,
            builder_repos,
            container_cli,
        } => resolve(
            &cli.config,
            target,
            architecture,
            gcc_version.as_deref(),
            images_file.as_deref(),
            builder_repos,
            container_cli,
        ),
    }
}

fn resolve(
    config: &config::ConfigOptions,
    target: &str,
    architecture: &str,
    gcc_version: Option<&str>,
    images_file: Option<&str>,
    builder_repos: &[String],
    container_cli: &str,
) -> Result<()> {
    let architecture: Architecture = architecture.parse()?;
    let gcc_version: Option<GccVersion> = gcc_version
        .map(|raw| {
            raw.parse()
                .with_context(|| format!("invalid --gcc-version {:?}", raw))
        })
        .transpose()?;

    let mut build = Build {
        target: Target::from(target),
        architecture,
        gcc_version,
        listers: Vec::new(),
    };

    // The manifest, when given, is the operator's most trusted source and
    // claims keys before any searched repository can.
    if let Some(path) = images_file {
        build.listers.push(Box::new(FileImagesLister::new(path)));
    }
    let patterns = Arc::new(NamePatterns::compile(&build.target, build.architecture)?);
    let search: Arc<dyn ImageSearch> = Arc::new(DockerCliSearch::new(container_cli));
    for repo in builder_repos {
        build.listers.push(Box::new(RepoImagesLister::new(
            repo.clone(),
            Arc::clone(&patterns),
            Arc::clone(&search),
        )));
    }

    let images = build.load_images()?;
    info!(count = images.len(), "loaded builder images");

    // Hand-off values for the build dispatcher, which bounds and proxies
    // the actual build; resolution itself does neither.
    debug!(
        timeout = config.timeout,
        proxy = config.proxy.as_deref().unwrap_or(""),
        dry_run = config.dry_run,
        "build options"
    );

    match build.gcc_version {
        Some(gcc) => {
            let Some(image) = images.find_image(&build.target, gcc) else {
                bail!(
                    "no builder image for target {} with gcc {}",
                    build.target,
                    gcc
                );
            };
            println!("{}", image.name);
        }
        None => {
            for image in images.iter() {
                println!("{}\t{}\t{}", image.target, image.gcc_version, image.name);
            }
        }
    }
    Ok(())
}
