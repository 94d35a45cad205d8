use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use harvest_core::ExportFormat;

#[derive(Debug, Parser)]
#[command(
    name = "contact-harvest",
    version,
    about = "Export your connections with their contact details"
)]
pub struct Cli {
    /// RON config file. Defaults to ./contact-harvest.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Session CSRF token (the JSESSIONID value).
    #[arg(long, global = true, env = "CONTACT_HARVEST_CSRF_TOKEN", hide_env_values = true)]
    pub csrf_token: Option<String>,

    /// Session cookie header value.
    #[arg(long, global = true, env = "CONTACT_HARVEST_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Saved HTML of the connections page, used to read the displayed count.
    #[arg(long, global = true, conflicts_with = "displayed_count")]
    pub page_html: Option<PathBuf>,

    /// Displayed connection count, when no page snapshot is available.
    #[arg(long, global = true)]
    pub displayed_count: Option<u32>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the displayed and verified connection counts.
    Count,
    /// Harvest every connection and write the export.
    Harvest {
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,

        /// Directory for the export file.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Pause between lookups, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}
