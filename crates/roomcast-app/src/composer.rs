//! Outgoing message composition.
//!
//! Collects draft text and the per-message assist flag. The draft clears
//! optimistically on submit attempt, not on confirmed delivery; a failed
//! send reports an error without restoring the text (retry-by-retyping is
//! acceptable for this domain).

/// A draft accepted for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Message content as typed.
    pub text: String,
    /// Whether an AI-style assist was requested for this message.
    pub assist_requested: bool,
}

/// Composer state for one room view.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
    assist_requested: bool,
}

impl Composer {
    /// Current draft text.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Whether the assist flag is set for the next message.
    pub fn assist_requested(&self) -> bool {
        self.assist_requested
    }

    /// Replace the draft text.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Toggle the per-message assist flag.
    pub fn toggle_assist(&mut self) {
        self.assist_requested = !self.assist_requested;
    }

    /// Take the draft for submission.
    ///
    /// Whitespace-only drafts are rejected locally without a network round
    /// trip: the draft is kept and `None` is returned. Otherwise the draft
    /// and assist flag are cleared and handed to the caller.
    pub fn submit(&mut self) -> Option<Draft> {
        if self.draft.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.draft);
        let assist_requested = std::mem::take(&mut self.assist_requested);
        Some(Draft { text, assist_requested })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_draft_is_rejected_locally() {
        let mut composer = Composer::default();
        composer.set_draft("   \n\t ");

        assert_eq!(composer.submit(), None);
        assert_eq!(composer.draft(), "   \n\t ", "draft retained for editing");
    }

    #[test]
    fn submit_clears_draft_and_assist() {
        let mut composer = Composer::default();
        composer.set_draft("hello room");
        composer.toggle_assist();

        let draft = composer.submit().unwrap();
        assert_eq!(draft.text, "hello room");
        assert!(draft.assist_requested);

        assert_eq!(composer.draft(), "");
        assert!(!composer.assist_requested(), "assist is per-message");
    }

    #[test]
    fn empty_submit_is_rejected() {
        assert_eq!(Composer::default().submit(), None);
    }
}
