//! Confirmation port (driving the user decision for irreversible steps)
//!
//! The mirror executor asks before deleting remote-only entries. The
//! answer comes from an injected strategy: an interactive prompt in the
//! CLI, or a fixed answer for automation and tests.

/// Port trait for yes/no confirmations
#[async_trait::async_trait]
pub trait IConfirmation: Send + Sync {
    /// Asks `question` and returns the answer
    ///
    /// Implementations must default to `false` when no explicit answer
    /// is given.
    async fn confirm(&self, question: &str) -> anyhow::Result<bool>;
}

/// Non-interactive confirmation that always gives the same answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAnswer(pub bool);

#[async_trait::async_trait]
impl IConfirmation for FixedAnswer {
    async fn confirm(&self, _question: &str) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}
