//! Limit CLI library
//!
//! Reads a source file, runs the scanner and parser over it, and prints the
//! requested representation to stdout. Diagnostics go to stderr, or to
//! stdout as JSON lines for `check --format json`.

pub mod config;

mod args;

pub use args::{Args, ColorChoice, Command, Format};

use std::{
    fs,
    io::{self, Write},
};

use anyhow::{bail, Context, Result};
use limit_diagnostics::{Diagnostics, ErrorMessage};
use limit_parse::{parse, scan, ScanMode};
use log::{debug, info};

/// Maximum source file size in bytes (1MB)
pub const MAX_SOURCE_SIZE: usize = 1_000_000;

/// Outcome of a run that got as far as reading the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Clean,
    /// The scanner or parser reported this many diagnostics.
    Failed(usize),
}

impl Status {
    pub fn is_clean(self) -> bool {
        self == Status::Clean
    }
}

/// Run one subcommand, writing its output to `out` and rendered
/// diagnostics to `err`.
pub fn run<O: Write, E: Write>(args: &Args, out: &mut O, err: &mut E) -> Result<Status> {
    let file = args.command.file();
    let file_path = file.display().to_string();
    info!(file = file_path.as_str(), command:? = args.command; "Processing source");

    let config = config::load_config(args.config.as_deref())?;
    let mut render = config.render.clone();
    render.use_colors = args.color.resolve(render.use_colors);
    debug!(config:? = config; "Configuration loaded");

    let source = fs::read_to_string(file).with_context(|| format!("Failed to read {file_path}"))?;
    if source.len() > MAX_SOURCE_SIZE {
        bail!(
            "source file exceeds {}MB limit ({} bytes)",
            MAX_SOURCE_SIZE / 1_000_000,
            source.len()
        );
    }

    let mut diagnostics = Diagnostics::with_options(render);
    let format = args.command.format();
    match &args.command {
        Command::Tokens { cst, .. } => {
            let mode = if *cst { ScanMode::Cst } else { ScanMode::Lossy };
            let stream = scan(&source, mode, &file_path, &mut diagnostics);
            match format {
                Format::Pretty => {
                    for token in &stream.tokens {
                        writeln!(
                            out,
                            "{}:{}..{} {:?} {:?}",
                            token.line, token.span.start, token.span.end, token.kind, token.lexeme
                        )?;
                    }
                }
                Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&stream.tokens)?)?,
            }
        }
        Command::Parse { .. } => {
            let stream = scan(&source, ScanMode::Lossy, &file_path, &mut diagnostics);
            let result = parse(&stream, config.parser_config(false), &mut diagnostics);
            match format {
                Format::Pretty => writeln!(out, "{:#?}", result.program)?,
                Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&result.program)?)?,
            }
        }
        Command::Cst { .. } => {
            let stream = scan(&source, ScanMode::Cst, &file_path, &mut diagnostics);
            let result = parse(&stream, config.parser_config(true), &mut diagnostics);
            let Some(cst) = result.cst else {
                bail!("no concrete syntax tree was built for {file_path}");
            };
            match format {
                Format::Pretty => write!(out, "{}", cst.dump())?,
                Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&cst)?)?,
            }
        }
        Command::Check { max_errors, .. } => {
            let mut parser_config = config.parser_config(false);
            if let Some(limit) = max_errors {
                parser_config.max_errors = (*limit).max(1);
            }
            let stream = scan(&source, ScanMode::Lossy, &file_path, &mut diagnostics);
            parse(&stream, parser_config, &mut diagnostics);
            if format == Format::Json {
                write_json_lines(diagnostics.messages(), out)?;
                return Ok(status(&diagnostics));
            }
            if diagnostics.is_empty() {
                writeln!(out, "{file_path}: ok")?;
            }
        }
    }

    diagnostics.render(err)?;
    Ok(status(&diagnostics))
}

fn status(diagnostics: &Diagnostics) -> Status {
    match diagnostics.len() {
        0 => Status::Clean,
        n => Status::Failed(n),
    }
}

/// One JSON object per diagnostic.
fn write_json_lines<W: Write>(messages: &[ErrorMessage], out: &mut W) -> io::Result<()> {
    for message in messages {
        serde_json::to_writer(&mut *out, message)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(command: Command) -> Args {
        Args {
            command,
            config: None,
            color: ColorChoice::Never,
            log_level: "off".to_string(),
        }
    }

    fn source(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("main.lm");
        fs::write(&path, contents).expect("write source");
        (dir, path)
    }

    fn run_capture(args: &Args) -> (Status, String, String) {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let status = run(args, &mut out, &mut err).unwrap();
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn check_clean_file() {
        let (_dir, file) = source("var a = 1;\n");
        let (status, out, err) = run_capture(&args(Command::Check {
            file,
            format: Format::Pretty,
            max_errors: None,
        }));
        assert!(status.is_clean());
        assert!(out.ends_with(": ok\n"));
        assert!(err.is_empty());
    }

    #[test]
    fn check_renders_errors_without_colour() {
        let (_dir, file) = source("fn f() {\n  var x = 1;\n");
        let (status, out, err) = run_capture(&args(Command::Check {
            file,
            format: Format::Pretty,
            max_errors: None,
        }));
        assert_eq!(status, Status::Failed(1));
        assert!(out.is_empty());
        assert!(err.contains("[SyntaxError]: Expected '}'"), "{err}");
        assert!(!err.contains('\u{1b}'));
    }

    #[test]
    fn check_json_lines() {
        let (_dir, file) = source("var = 1;\nclass { }\n");
        let (status, out, _) = run_capture(&args(Command::Check {
            file,
            format: Format::Json,
            max_errors: None,
        }));
        assert_eq!(status, Status::Failed(2));
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["description"], "Expected variable name.");
        assert_eq!(lines[1]["line"], 2);
    }

    #[test]
    fn cst_dump_starts_at_program() {
        let (_dir, file) = source("var a = 1;");
        let (status, out, _) = run_capture(&args(Command::Cst {
            file,
            format: Format::Pretty,
        }));
        assert!(status.is_clean());
        assert!(out.starts_with("Program@0..10\n"));
    }

    #[test]
    fn oversized_source_is_refused() {
        let (_dir, file) = source(&" ".repeat(MAX_SOURCE_SIZE + 1));
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let e = run(
            &args(Command::Parse {
                file,
                format: Format::Pretty,
            }),
            &mut out,
            &mut err,
        )
        .unwrap_err();
        assert!(e.to_string().contains("exceeds 1MB limit"));
    }
}
