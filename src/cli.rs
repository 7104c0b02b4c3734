use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "magickit", about = "Run commands as timed responses, plus small utilities", version)]
pub struct Cli {
    /// Log filter, e.g. `debug` or `magickit=trace,warn`.
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Log output format (full|compact|pretty|json).
    #[arg(long = "log-format", global = true)]
    pub log_format: Option<String>,

    /// Also write logs to this file.
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a shell command and print the response as JSON.
    Exec {
        /// JSON indentation; 0 prints a single line. Defaults to
        /// MAGICKIT_JSON_INDENT (2).
        #[arg(long)]
        indent: Option<usize>,

        /// Give up after this many seconds.
        #[arg(long)]
        timeout: Option<f64>,

        /// Extra attempts when the command fails. Without the flag,
        /// MAGICKIT_RETRY_ATTEMPTS decides; the command runs once if unset.
        #[arg(long)]
        retries: Option<u32>,

        /// Print a colored one-line summary instead of JSON.
        #[arg(long)]
        summary: bool,

        #[arg(value_name = "COMMAND")]
        command: String,
    },

    /// Print the current local time.
    Now {
        /// chrono format string.
        #[arg(long)]
        format: Option<String>,
    },

    /// Hash or encode text.
    Hash {
        #[arg(value_enum)]
        algorithm: HashAlgorithm,
        text: String,
    },

    /// Parse a connection address and print its parts as JSON.
    Addr { address: String },

    /// Print an INI file as JSON.
    Ini { file: PathBuf },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha256,
    Base64,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
