//! Console rendering of [`ErrorMessage`]s.
//!
//! ```text
//! error[E102][SyntaxError]: Expected '}' after block.
//! --> main.lm:3:1
//!    |
//!  2 |   var x = 1;
//!  3 |
//!    | ^
//!
//! Hint: Every block opened with '{' must be closed with a matching '}'.
//! Suggestion: Add a closing brace '}' to end the block.
//! Caused by: Unterminated function starting at line 1:
//!             1 | {
//!               | --------- unclosed block starts here
//!
//! File: main.lm
//! ```

use crate::message::ErrorMessage;
use anstyle::{AnsiColor, Effects, Style};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub use_colors: bool,
    /// Print the `File:` footer.
    pub show_file_path: bool,
    /// Source lines wider than this are cut with an ellipsis.
    pub max_line_width: usize,
    pub context_before: usize,
    pub context_after: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_file_path: true,
            max_line_width: 120,
            context_before: 2,
            context_after: 1,
        }
    }
}

const CAUSED_BY_INDENT: &str = "           ";

struct Palette {
    header: Style,
    gutter: Style,
    line_number: Style,
    indicator: Style,
    hint: Style,
    suggestion: Style,
    path: Style,
    caused_by: Style,
}

impl Palette {
    fn new() -> Self {
        let fg = |c: AnsiColor| Style::new().fg_color(Some(c.into()));
        Self {
            header: fg(AnsiColor::Red).effects(Effects::BOLD),
            gutter: fg(AnsiColor::BrightBlack),
            line_number: fg(AnsiColor::Cyan),
            indicator: fg(AnsiColor::BrightRed),
            hint: fg(AnsiColor::Yellow),
            suggestion: fg(AnsiColor::Green),
            path: fg(AnsiColor::Blue),
            caused_by: fg(AnsiColor::BrightBlue),
        }
    }
}

struct Painter<'w, W: Write> {
    out: &'w mut W,
    colorize: bool,
    palette: Palette,
}

impl<W: Write> Painter<'_, W> {
    fn paint(&mut self, style: Style, text: &str) -> io::Result<()> {
        if self.colorize {
            write!(self.out, "{}{}{}", style.render(), text, style.render_reset())
        } else {
            self.out.write_all(text.as_bytes())
        }
    }

    fn newline(&mut self) -> io::Result<()> {
        self.out.write_all(b"\n")
    }
}

/// Render every message in order, separated by a blank line.
pub fn render<W: Write>(
    messages: &[ErrorMessage],
    sink: &mut W,
    options: &RenderOptions,
) -> io::Result<()> {
    let mut painter = Painter {
        out: sink,
        colorize: options.use_colors,
        palette: Palette::new(),
    };
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            painter.newline()?;
        }
        render_one(message, &mut painter, options)?;
    }
    painter.out.flush()
}

pub fn render_to_string(messages: &[ErrorMessage], options: &RenderOptions) -> String {
    let mut buffer = Vec::new();
    // Writes into a Vec cannot fail.
    let _ = render(messages, &mut buffer, options);
    String::from_utf8_lossy(&buffer).into_owned()
}

fn render_one<W: Write>(
    message: &ErrorMessage,
    p: &mut Painter<'_, W>,
    options: &RenderOptions,
) -> io::Result<()> {
    // header
    let mut header = format!(
        "error[{}][{}]: {}",
        message.error_code, message.error_type, message.description
    );
    let token = message.problematic_token.trim();
    if !token.is_empty() && !message.description.contains(token) {
        header.push_str(&format!(" `{token}`"));
    }
    let style = p.palette.header;
    p.paint(style, &header)?;
    p.newline()?;

    // location
    p.paint(p.palette.gutter, "--> ")?;
    let location = format!("{}:{}:{}", message.file_path, message.line, message.column);
    p.paint(p.palette.path, &location)?;
    p.newline()?;

    if !message.context_lines.is_empty() {
        p.paint(p.palette.gutter, "   |")?;
        p.newline()?;
        for line in &message.context_lines {
            render_context_line(line, p, options.max_line_width)?;
        }
    }

    let has_notes =
        message.hint.is_some() || message.suggestion.is_some() || message.caused_by.is_some();
    if !has_notes {
        return Ok(());
    }
    p.newline()?;

    if let Some(hint) = &message.hint {
        p.paint(p.palette.hint, "Hint:")?;
        write!(p.out, " {hint}")?;
        p.newline()?;
    }
    if let Some(suggestion) = &message.suggestion {
        p.paint(p.palette.suggestion, "Suggestion:")?;
        write!(p.out, " {suggestion}")?;
        p.newline()?;
    }
    if let Some(caused_by) = &message.caused_by {
        let mut lines = caused_by.lines();
        p.paint(p.palette.caused_by, "Caused by:")?;
        if let Some(first) = lines.next() {
            write!(p.out, " {first}")?;
        }
        p.newline()?;
        for rest in lines {
            write!(p.out, "{CAUSED_BY_INDENT}{rest}")?;
            p.newline()?;
        }
    }

    if options.show_file_path {
        p.newline()?;
        write!(p.out, "File: ")?;
        p.paint(p.palette.path, &message.file_path)?;
        p.newline()?;
    }
    Ok(())
}

fn render_context_line<W: Write>(
    line: &str,
    p: &mut Painter<'_, W>,
    max_width: usize,
) -> io::Result<()> {
    let Some((number, text)) = line.split_once(" | ") else {
        p.paint(p.palette.gutter, line)?;
        return p.newline();
    };
    let text = truncate(text, max_width);
    if number.trim().is_empty() {
        p.paint(p.palette.gutter, &format!("{number} | "))?;
        p.paint(p.palette.indicator, &text)?;
    } else {
        p.paint(p.palette.line_number, number)?;
        p.paint(p.palette.gutter, " | ")?;
        write!(p.out, "{text}")?;
    }
    p.newline()
}

fn truncate(text: &str, max_width: usize) -> String {
    if max_width == 0 || text.chars().count() <= max_width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::BlockContext;
    use crate::stage::Stage;

    fn plain() -> RenderOptions {
        RenderOptions {
            use_colors: false,
            ..RenderOptions::default()
        }
    }

    fn unterminated_function() -> ErrorMessage {
        ErrorMessage::new(Stage::Syntax, "Expected '}' after block.")
            .at(3, 1)
            .with_file("main.lm")
            .with_source("fn f() {\n  var x = 1;\n", 2, 1)
            .with_block_context(BlockContext::new("function", 1, 8, "{"))
    }

    #[test]
    fn plain_layout() {
        let text = render_to_string(&[unterminated_function()], &plain());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "error[E102][SyntaxError]: Expected '}' after block.");
        assert_eq!(lines[1], "--> main.lm:3:1");
        assert_eq!(lines[2], "   |");
        assert_eq!(lines[3], " 1 | fn f() {");
        assert!(text.contains("\nHint: "), "hint line present:\n{text}");
        assert!(text.contains("\nSuggestion: Add a closing brace"));
        assert!(text.contains("Caused by: Unterminated function starting at line 1:\n            1 | {"));
        assert!(text.ends_with("File: main.lm\n"));
        assert!(!text.contains('\u{1b}'), "no escapes without colours");
    }

    #[test]
    fn colours_wrap_sections() {
        let text = render_to_string(&[unterminated_function()], &RenderOptions::default());
        assert!(text.contains('\u{1b}'));
        assert!(text.contains("Expected '}' after block."));
    }

    #[test]
    fn token_is_appended_once() {
        let msg = ErrorMessage::new(Stage::Syntax, "Unexpected token").with_token("@");
        let text = render_to_string(&[msg], &plain());
        assert!(text.starts_with("error[E100][SyntaxError]: Unexpected token `@`\n"));

        let msg = ErrorMessage::new(Stage::Scanning, "Unexpected character '$'").with_token("$");
        let text = render_to_string(&[msg], &plain());
        assert!(text.starts_with("error[E001][LexicalError]: Unexpected character '$'\n"));
    }

    #[test]
    fn footer_needs_notes_and_option() {
        let msg = ErrorMessage::new(Stage::Compiling, "backend exploded").with_file("x.lm");
        let text = render_to_string(&[msg.clone()], &plain());
        assert!(!text.contains("File:"), "no notes, no footer");

        let msg = msg.with_hint("look closer");
        let opts = RenderOptions {
            show_file_path: false,
            ..plain()
        };
        assert!(!render_to_string(&[msg], &opts).contains("File:"));
    }

    #[test]
    fn long_lines_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
