//! # Docs Subcommand
//!
//! Source references and documentation build settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};

use battmo_core::BattmoConfig;
use battmo_docs::{
    expand_roles, setup, RenderFormat, RoleRegistry, SourceLinkBuilder, SourceLocator,
    SourceReference,
};

/// Arguments for the `battmo docs` subcommand.
#[derive(Args, Debug)]
pub struct DocsArgs {
    #[command(subcommand)]
    pub command: DocsCommand,
}

/// Available docs subcommands.
#[derive(Subcommand, Debug)]
pub enum DocsCommand {
    /// Resolve references (`name` or `name#line`) to files and links.
    Locate {
        #[arg(required = true, value_name = "REFERENCE")]
        references: Vec<String>,
    },

    /// Expand documentation roles in a page.
    Expand {
        /// Page to expand.
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = MarkupFormat::Rst)]
        format: MarkupFormat,

        /// Write the result here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the documentation build configuration.
    Config {
        #[arg(long, value_enum, default_value_t = ConfigFormat::Yaml)]
        format: ConfigFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkupFormat {
    Rst,
    Html,
    Markdown,
}

impl From<MarkupFormat> for RenderFormat {
    fn from(format: MarkupFormat) -> Self {
        match format {
            MarkupFormat::Rst => RenderFormat::Rst,
            MarkupFormat::Html => RenderFormat::Html,
            MarkupFormat::Markdown => RenderFormat::Markdown,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

/// Execute the docs subcommand.
pub fn run_docs(args: &DocsArgs, config: &BattmoConfig, repo_root: &Path) -> Result<u8> {
    match &args.command {
        DocsCommand::Locate { references } => run_locate(references, config, repo_root),
        DocsCommand::Expand { file, format, out } => {
            run_expand(file, (*format).into(), out.as_deref(), config, repo_root)
        }
        DocsCommand::Config { format } => run_config(*format, config),
    }
}

fn run_locate(references: &[String], config: &BattmoConfig, repo_root: &Path) -> Result<u8> {
    let source = &config.source;
    let locator = SourceLocator::new(
        repo_root,
        source.ignored_dirs.iter().cloned(),
        source.extension.clone(),
    );
    let links = SourceLinkBuilder::new(&source.repo_url, source.branch.clone())?;

    for text in references {
        let reference: SourceReference = text.parse()?;
        let path = locator.locate_identifier(&reference.identifier)?;
        let url = links.link(&path, reference.line);
        println!("{reference}");
        println!("  file: {}", path.display());
        println!("  link: {url}");
    }
    Ok(0)
}

fn run_expand(
    file: &Path,
    format: RenderFormat,
    out: Option<&Path>,
    config: &BattmoConfig,
    repo_root: &Path,
) -> Result<u8> {
    let path = crate::resolve_path(file, repo_root);
    let page = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut registry = RoleRegistry::new();
    setup(&mut registry, config, repo_root)?;

    let expanded = expand_roles(&page, &registry, format)
        .with_context(|| format!("failed to expand {}", path.display()))?;

    match out {
        Some(out) => {
            std::fs::write(out, &expanded)
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(out = %out.display(), "wrote expanded page");
        }
        None => print!("{expanded}"),
    }
    Ok(0)
}

fn run_config(format: ConfigFormat, config: &BattmoConfig) -> Result<u8> {
    let rendered = match format {
        ConfigFormat::Yaml => config.docs.to_yaml()?,
        ConfigFormat::Json => serde_json::to_string_pretty(&config.docs)? + "\n",
    };
    print!("{rendered}");
    Ok(0)
}
