//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect structure metadata and hydrate documents from a node dump
#[derive(Parser, Debug)]
#[command(name = "structura")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Hydration configuration file (overrides STRUCTURA_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Default locale (overrides STRUCTURA_DEFAULT_LOCALE)
    #[arg(long, global = true)]
    pub default_locale: Option<String>,

    /// Metadata cache directory (overrides STRUCTURA_CACHE_DIR)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List configured document types
    Types,

    /// List every structure of a document type
    Structures {
        document_type: String,
    },

    /// Show one structure; without a type the default structure is shown
    Structure {
        document_type: String,
        structure_type: Option<String>,
    },

    /// Hydrate a document from a JSON array of nodes
    Hydrate {
        /// JSON file with the repository nodes
        #[arg(long)]
        nodes: PathBuf,

        /// Node UUID or path
        identifier: String,

        /// Requested locale
        locale: Option<String>,

        /// Do not fall back to another locale
        #[arg(long)]
        no_ghost: bool,
    },

    /// Remove cached structure metadata
    ClearCache,
}
