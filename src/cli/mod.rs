//! CLI Module
//!
//! Command-line interface for the Rigprep export flow.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::host::ExportStrategy;

/// Rigprep - flatten layered artwork and export rig-ready pieces
#[derive(Parser, Debug)]
#[command(name = "rigprep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Flatten nested groups and export each visible top-level node
    #[command(name = "export")]
    Export {
        /// Path to the document file
        path: PathBuf,

        /// Export strategy
        #[arg(short, long, value_enum, default_value = "side-document")]
        strategy: StrategyArg,
    },

    /// Run the preflight checks without touching the document
    #[command(name = "check")]
    Check {
        /// Path to the document file
        path: PathBuf,
    },

    /// Print the document's layer tree
    #[command(name = "inspect")]
    Inspect {
        /// Path to the document file
        path: PathBuf,
    },
}

/// CLI spelling of the export strategies.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    /// Copy each node into a side document, save, close
    SideDocument,
    /// Ask the host to save each node directly
    Direct,
}

impl From<StrategyArg> for ExportStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::SideDocument => ExportStrategy::SideDocument,
            StrategyArg::Direct => ExportStrategy::DirectNodeSave,
        }
    }
}
