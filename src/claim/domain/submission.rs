//! Completion evidence attached to a claim.

use super::ClaimDomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trimmed, non-empty description of the completed work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionText(String);

impl CompletionText {
    /// Creates validated completion text.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimDomainError::EmptyCompletionText`] for blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, ClaimDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ClaimDomainError::EmptyCompletionText);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The claimer's completion submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSubmission {
    text: CompletionText,
    image_url: Option<String>,
    submitted_at: DateTime<Utc>,
}

impl CompletionSubmission {
    /// Creates a submission made at `submitted_at`.
    ///
    /// A blank image reference is treated as absent.
    #[must_use]
    pub fn new(
        text: CompletionText,
        image_url: Option<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text,
            image_url: image_url.filter(|url| !url.trim().is_empty()),
            submitted_at,
        }
    }

    /// Returns the completion text.
    #[must_use]
    pub const fn text(&self) -> &CompletionText {
        &self.text
    }

    /// Returns the image reference, if any.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Returns when the submission was made.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}
