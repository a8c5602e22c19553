//! Non-fatal findings recorded while interpreting a program.

use serde::{Deserialize, Serialize};

/// Classification of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A token that is not `letter + number`; it was dropped.
    Lexical,
    /// Contradictory, unsupported or out-of-context words.
    Semantic,
    /// Degenerate or inconsistent arc geometry.
    Geometric,
    /// A resolved point outside the machine travel envelope.
    Limit,
}

/// One finding, tied to a 1-based source line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Append-only sink threaded through every interpreter stage.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finding and mirrors it to the `tracing` debug stream.
    pub fn push(&mut self, line: usize, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(line, ?kind, "{message}");
        self.entries.push(Diagnostic {
            line,
            kind,
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_insertion_order() {
        let mut diags = Diagnostics::new();
        diags.push(3, DiagnosticKind::Lexical, "first");
        diags.push(1, DiagnosticKind::Geometric, "second");
        let lines: Vec<usize> = diags.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![3, 1]);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let value = serde_json::to_value(DiagnosticKind::Geometric).expect("serialize");
        assert_eq!(value, "geometric");
    }
}
