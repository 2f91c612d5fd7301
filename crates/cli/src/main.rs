//! inkpress: builds a blog's Markdown/MDX posts into a queryable collection.

mod cli;
mod logger;
mod watch;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use inkpress_collection::{BuildConfig, CollectionBuilder, read_snapshot};
use inkpress_render::{ComponentTable, Runtime};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logger::init(cli.verbose).context("failed to install logger")?;

    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let config_path = root.join(&cli.config);
    let config = load_config(&root, &config_path, &cli)?;

    match cli.command {
        Commands::Build => {
            let builder = CollectionBuilder::new(config);
            let output = builder.build_and_write()?;
            log::info!(
                "wrote {} documents to {}",
                output.stats.published,
                builder.config().data_dir().display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Watch => {
            watch::watch(config, config_path)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::List { drafts, tag } => {
            list(&config, drafts, tag.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Render { slug, plain } => render(&config, &slug, plain),
    }
}

/// Reads the config file when present; CLI flags win over it.
fn load_config(root: &Path, config_path: &Path, cli: &Cli) -> Result<BuildConfig> {
    let mut config = if config_path.exists() {
        BuildConfig::load(config_path)?
    } else {
        log::debug!("no {} found, using defaults", config_path.display());
        BuildConfig::rooted_at(root)
    };
    if let Some(mode) = cli.mode() {
        config.build.mode = mode;
    }
    Ok(config)
}

fn list(config: &BuildConfig, drafts: bool, tag: Option<&str>) -> Result<()> {
    let collection = read_snapshot(&config.data_dir(), &config.content.collection)
        .context("no snapshot found, run `inkpress build` first")?;
    for doc in collection.sorted_by_date() {
        if (doc.draft && !drafts) || tag.is_some_and(|tag| !doc.has_tag(tag)) {
            continue;
        }
        let marker = if doc.draft { " (draft)" } else { "" };
        println!(
            "{}  {:<32} {}{marker}",
            doc.date.format("%Y-%m-%d"),
            doc.slug,
            doc.title
        );
    }
    Ok(())
}

fn render(config: &BuildConfig, slug: &str, plain: bool) -> Result<ExitCode> {
    let collection = read_snapshot(&config.data_dir(), &config.content.collection)
        .context("no snapshot found, run `inkpress build` first")?;
    let Some(doc) = collection.get(slug) else {
        log::error!("`{slug}` not found in `{}`", collection.name());
        return Ok(ExitCode::FAILURE);
    };
    let components = if plain {
        ComponentTable::new()
    } else {
        ComponentTable::typography()
    };
    let rendered = Runtime::render(&doc.compiled_body, &components)?;
    println!("{}", rendered.to_html());
    Ok(ExitCode::SUCCESS)
}
