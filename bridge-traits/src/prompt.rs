//! User confirmation for destructive actions.

use async_trait::async_trait;

/// Content of a confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub title: String,
    pub message: String,
    /// Label of the destructive button ("Delete", "Remove", ...).
    pub confirm_label: String,
}

impl ConfirmationRequest {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        confirm_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: confirm_label.into(),
        }
    }
}

/// Host dialog used before deleting playlists or removing tracks.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Show the dialog and wait for the user's answer.
    ///
    /// Returns `true` only if the user chose the destructive option. Dismissing
    /// the dialog counts as a refusal.
    async fn confirm(&self, request: &ConfirmationRequest) -> bool;
}
