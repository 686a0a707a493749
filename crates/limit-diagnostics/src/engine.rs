use crate::message::ErrorMessage;
use crate::render::{self, RenderOptions};
use std::collections::HashSet;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    description: String,
    line: u32,
    column: u32,
    file_path: String,
}

impl DedupKey {
    fn of(message: &ErrorMessage) -> Self {
        Self {
            description: message.description.clone(),
            line: message.line,
            column: message.column,
            file_path: message.file_path.clone(),
        }
    }
}

/// Error collector for one compilation.
///
/// Threaded by reference through the scanner and the parser. A second
/// report with the same description, position and file is dropped.
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Vec<ErrorMessage>,
    seen: HashSet<DedupKey>,
    had_error: bool,
    options: RenderOptions,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Record `message`, slicing context from `source` when given. Returns
    /// `false` if an identical report was already recorded.
    pub fn report(&mut self, message: ErrorMessage, source: Option<&str>) -> bool {
        if !self.seen.insert(DedupKey::of(&message)) {
            return false;
        }
        let message = match source {
            Some(src) if message.context_lines.is_empty() => {
                message.with_source(src, self.options.context_before, self.options.context_after)
            }
            _ => message,
        };
        self.had_error = true;
        self.messages.push(message);
        true
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn messages(&self) -> &[ErrorMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ErrorMessage> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Forget everything reported so far; the render options stay.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.seen.clear();
        self.had_error = false;
    }

    pub fn render<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        render::render(&self.messages, sink, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    fn sample() -> ErrorMessage {
        ErrorMessage::new(Stage::Syntax, "Expected ';' after value.")
            .at(2, 5)
            .with_file("a.lm")
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut diags = Diagnostics::new();
        assert!(diags.report(sample(), None));
        assert!(!diags.report(sample(), None), "second report is a no-op");
        assert_eq!(diags.len(), 1);
        assert!(diags.had_error());
    }

    #[test]
    fn different_position_is_kept() {
        let mut diags = Diagnostics::new();
        diags.report(sample(), None);
        diags.report(sample().at(2, 6), None);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn reset_clears_dedup_and_flag() {
        let mut diags = Diagnostics::new();
        diags.report(sample(), None);
        diags.reset();
        assert!(!diags.had_error());
        assert!(diags.is_empty());
        assert!(diags.report(sample(), None));
    }

    #[test]
    fn source_feeds_context() {
        let options = RenderOptions {
            context_before: 0,
            context_after: 0,
            ..RenderOptions::default()
        };
        let mut diags = Diagnostics::with_options(options);
        diags.report(sample(), Some("a\nb = 1 c\nd"));
        assert_eq!(diags.messages()[0].context_lines.len(), 2);
    }
}
