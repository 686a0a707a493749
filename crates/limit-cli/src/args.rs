use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "limit")]
#[command(about = "Limit: scan, parse and check Limit source files")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// When to colour diagnostics
    #[arg(long, value_enum, global = true, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan a source file and dump its tokens
    Tokens {
        /// Path to .lm source file
        file: PathBuf,

        /// Keep trivia attached to the tokens
        #[arg(long)]
        cst: bool,

        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Parse a source file and dump the AST
    Parse {
        /// Path to .lm source file
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Parse a source file and dump the concrete syntax tree
    Cst {
        /// Path to .lm source file
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Report diagnostics only
    Check {
        /// Path to .lm source file
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,

        /// Override the configured syntax error limit
        #[arg(long)]
        max_errors: Option<usize>,
    },
}

impl Command {
    pub fn file(&self) -> &PathBuf {
        match self {
            Command::Tokens { file, .. }
            | Command::Parse { file, .. }
            | Command::Cst { file, .. }
            | Command::Check { file, .. } => file,
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Command::Tokens { format, .. }
            | Command::Parse { format, .. }
            | Command::Cst { format, .. }
            | Command::Check { format, .. } => *format,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// `auto` defers to the configured preference and to whether stderr
    /// supports colour.
    pub fn resolve(self, configured: bool) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                configured
                    && supports_color::on_cached(supports_color::Stream::Stderr)
                        .is_some_and(|level| level.has_basic)
            }
        }
    }
}
