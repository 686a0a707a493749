use limit_ast::cst::{Builder, Checkpoint, Node, NodeKind};
use limit_ast::token::Token;

/// CST side of the parser. Every call is a no-op when no tree is being built,
/// so grammar code records structure unconditionally.
pub(crate) struct CstSink {
    builder: Option<Builder>,
}

impl CstSink {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            builder: enabled.then(Builder::new),
        }
    }

    pub(crate) fn start(&mut self, kind: NodeKind) {
        if let Some(b) = &mut self.builder {
            b.start_node(kind);
        }
    }

    pub(crate) fn checkpoint(&self) -> Option<Checkpoint> {
        self.builder.as_ref().map(Builder::checkpoint)
    }

    /// Open `kind` around everything recorded since `checkpoint`.
    pub(crate) fn start_at(&mut self, checkpoint: Option<Checkpoint>, kind: NodeKind) {
        if let (Some(b), Some(cp)) = (&mut self.builder, checkpoint) {
            b.start_node_at(cp, kind);
        }
    }

    pub(crate) fn finish(&mut self) {
        if let Some(b) = &mut self.builder {
            b.finish_node();
        }
    }

    pub(crate) fn token(&mut self, token: &Token) {
        if let Some(b) = &mut self.builder {
            b.token(token.clone());
        }
    }

    pub(crate) fn pop_token(&mut self) {
        if let Some(b) = &mut self.builder {
            b.pop_token();
        }
    }

    pub(crate) fn describe(&mut self, description: impl Into<String>) {
        if let Some(b) = &mut self.builder {
            b.set_description(description);
        }
    }

    pub(crate) fn mark_error(&mut self, error: &str) {
        if let Some(b) = &mut self.builder {
            b.set_error(error);
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.builder.as_ref().map_or(0, Builder::depth)
    }

    pub(crate) fn unwind_to(&mut self, depth: usize) {
        if let Some(b) = &mut self.builder {
            b.unwind_to(depth);
        }
    }

    pub(crate) fn into_tree(self, source_len: u32) -> Option<Node> {
        self.builder.map(|b| b.finish(source_len))
    }
}
