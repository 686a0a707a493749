//! Source excerpts shown under a diagnostic.

use unicode_width::UnicodeWidthStr;

/// Most lines shown on either side of the error line.
pub const MAX_CONTEXT: usize = 2;

/// Slice the lines around `line` (1-indexed) into gutter-formatted strings,
/// with a caret indicator under `column` right after the error line.
///
/// Returns an empty list when `line` lies outside the source.
pub fn context_lines(
    source: &str,
    line: u32,
    column: u32,
    token: &str,
    before: usize,
    after: usize,
) -> Vec<String> {
    let lines: Vec<&str> = source
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    let Some(index) = (line as usize).checked_sub(1).filter(|i| *i < lines.len()) else {
        return Vec::new();
    };

    let first = index.saturating_sub(before.min(MAX_CONTEXT));
    let last = (index + after.min(MAX_CONTEXT)).min(lines.len() - 1);
    let gutter = digits(last + 1).max(2);

    let mut out = Vec::with_capacity(last - first + 2);
    for (i, text) in lines.iter().enumerate().take(last + 1).skip(first) {
        out.push(format!("{:>gutter$} | {}", i + 1, text));
        if i == index {
            out.push(indicator_line(text, column, token, gutter));
        }
    }
    out
}

/// `"   | ^^^"`, the carets aligned under `column` and as wide as `token`.
pub fn indicator_line(text: &str, column: u32, token: &str, gutter: usize) -> String {
    let skip = (column as usize).saturating_sub(1);
    let prefix: String = text.chars().take(skip).collect();
    let pad = prefix.width();
    let carets = token.lines().next().map_or(0, |t| t.width()).max(1);
    format!("{:gutter$} | {}{}", "", " ".repeat(pad), "^".repeat(carets))
}

fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_line_gets_indicator() {
        let src = "var a = 1;\nvar b = $;\nprint(b);";
        let lines = context_lines(src, 2, 9, "$", 2, 1);
        assert_eq!(
            lines,
            vec![
                " 1 | var a = 1;".to_string(),
                " 2 | var b = $;".to_string(),
                "   |         ^".to_string(),
                " 3 | print(b);".to_string(),
            ]
        );
    }

    #[test]
    fn caret_width_follows_token() {
        let lines = context_lines("foo bar", 1, 5, "bar", 0, 0);
        assert_eq!(lines[1], "   |     ^^^");
    }

    #[test]
    fn wide_characters_shift_the_caret() {
        let lines = context_lines("\"日本\" x", 1, 6, "x", 0, 0);
        assert_eq!(lines[1], "   |        ^");
    }

    #[test]
    fn out_of_range_line_has_no_context() {
        assert!(context_lines("a", 5, 1, "a", 2, 2).is_empty());
        assert!(context_lines("a", 0, 1, "a", 2, 2).is_empty());
    }

    #[test]
    fn trailing_newline_gives_an_empty_last_line() {
        let lines = context_lines("fn f() {\n", 2, 1, "", 1, 0);
        assert_eq!(lines[0], " 1 | fn f() {");
        assert_eq!(lines[1], " 2 | ");
        assert_eq!(lines[2], "   | ^");
    }
}
