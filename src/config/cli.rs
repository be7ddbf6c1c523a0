use crate::domain::model::TemplateKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "scaleiot")]
#[command(about = "Read an HTTP/XML scale and print ZPL labels on network printers")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "scaleiot.toml", global = true)]
    pub config: PathBuf,

    #[arg(short, long, help = "Enable verbose output", global = true)]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List configured scales
    Scales,

    /// List configured printers
    Printers,

    /// Read the scale once
    Poll {
        #[arg(long)]
        scale: Option<String>,

        #[arg(long, help = "Print the measurement as JSON")]
        json: bool,
    },

    /// Render a label to stdout (plain and barcode read the scale first)
    Label {
        template: TemplateKind,

        #[arg(long)]
        scale: Option<String>,
    },

    /// Send a label to a printer
    Print {
        #[arg(long)]
        printer: String,

        /// Label markup file, as edited by the operator
        #[arg(long, conflicts_with = "template", required_unless_present = "template")]
        file: Option<PathBuf>,

        #[arg(long)]
        template: Option<TemplateKind>,

        #[arg(long)]
        scale: Option<String>,
    },

    /// Read the scale and print its barcode label on the first printer
    QuickPrint {
        #[arg(long)]
        scale: Option<String>,
    },

    /// Interactive operator session reading commands from stdin
    Session,
}
