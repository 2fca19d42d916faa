use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// formwright - Multi-step content forms in the terminal
#[derive(Parser)]
#[command(name = "formwright")]
#[command(about = "Fill, validate and export multi-step CMS content forms")]
#[command(version)]
pub struct Cli {
    /// Write logs to this file. Without it the console discards logs and
    /// the other commands log to stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a form configuration and, optionally, a document against it
    Validate {
        /// Form configuration (JSON), or a preset name
        config: String,

        /// Document to validate against the form
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Fill a form interactively
    Fill {
        /// Form configuration (JSON), or a preset name such as `product`
        config: String,

        /// Document to start from
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Where the submitted document is written. Printed to stdout when
        /// omitted.
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
    /// Built-in content type forms
    Presets {
        #[command(subcommand)]
        action: PresetCommands,
    },
    /// Show where the files of a document would be uploaded
    Uploads {
        /// Form configuration (JSON), or a preset name
        config: String,

        /// Document holding the file values
        #[arg(short, long)]
        data: PathBuf,

        /// Storage collection, e.g. `products`
        #[arg(short, long)]
        collection: String,

        /// Slug of the content entry
        #[arg(short, long)]
        slug: String,
    },
}

#[derive(Subcommand)]
pub enum PresetCommands {
    /// List the built-in presets
    List,
    /// Write a preset as a form configuration file
    Export {
        /// Preset name
        name: String,

        /// Output file. Printed to stdout when omitted.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
