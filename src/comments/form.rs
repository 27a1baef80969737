//! The comment form's state machine
//!
//! `Unsubmitted` → `Submitted` only after the store accepted the comment.
//! Validation failures never reach the store; store failures leave the form
//! unsubmitted so the reader can try again. There is no way back from
//! `Submitted`.

use serde::Deserialize;

use super::{create_comment, CommentSubmission};
use crate::store::ContentStore;
use crate::templates::{FieldErrorsData, FormView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Unsubmitted,
    Submitted,
}

impl FormState {
    pub fn as_str(self) -> &'static str {
        match self {
            FormState::Unsubmitted => "unsubmitted",
            FormState::Submitted => "submitted",
        }
    }
}

/// A required form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Comment,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Comment => "Comment",
        }
    }

    /// Inline message shown under the field
    pub fn required_message(self) -> String {
        format!("{} is required*", self.label())
    }
}

/// One or more required fields were left empty
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", labels(.missing))]
pub struct ValidationError {
    pub missing: Vec<Field>,
}

impl ValidationError {
    pub fn is_missing(&self, field: Field) -> bool {
        self.missing.contains(&field)
    }
}

fn labels(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raw field values as posted by the browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub comment: String,
}

/// Comment form for one post
#[derive(Debug, Clone, Default)]
pub struct CommentForm {
    state: FormState,
    input: CommentInput,
    errors: Option<ValidationError>,
    notice: Option<String>,
}

impl CommentForm {
    /// An empty, unsubmitted form
    pub fn new() -> Self {
        Self::default()
    }

    /// An unsubmitted form holding `input`
    pub fn with_input(input: CommentInput) -> Self {
        Self {
            input,
            ..Self::default()
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn errors(&self) -> Option<&ValidationError> {
        self.errors.as_ref()
    }

    /// Check required fields and build the submission for `post_id`
    pub fn validate(&self, post_id: &str) -> Result<CommentSubmission, ValidationError> {
        let missing: Vec<Field> = [
            (Field::Name, &self.input.name),
            (Field::Email, &self.input.email),
            (Field::Comment, &self.input.comment),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(ValidationError { missing });
        }

        Ok(CommentSubmission {
            post_id: post_id.to_string(),
            name: self.input.name.clone(),
            email: self.input.email.clone(),
            comment: self.input.comment.clone(),
        })
    }

    /// Validate and, if valid, send the comment to the store
    pub async fn submit(&mut self, store: &dyn ContentStore, post_id: &str) -> FormState {
        if self.state == FormState::Submitted {
            return self.state;
        }

        let submission = match self.validate(post_id) {
            Ok(submission) => submission,
            Err(e) => {
                tracing::debug!(post = %post_id, "comment form rejected: {}", e);
                self.errors = Some(e);
                return self.state;
            }
        };
        self.errors = None;

        match create_comment(store, submission).await {
            Ok(_) => {
                self.state = FormState::Submitted;
                self.notice = None;
            }
            Err(e) => {
                tracing::error!(post = %post_id, error = %e, "comment submission failed");
                self.notice =
                    Some("Something went wrong, couldn't submit comment. Please try again.".into());
            }
        }

        self.state
    }

    /// Template view of the form
    pub fn view(&self) -> FormView {
        let message = |field: Field| {
            self.errors
                .as_ref()
                .filter(|e| e.is_missing(field))
                .map(|_| field.required_message())
        };

        FormView {
            state: self.state.as_str(),
            name: self.input.name.clone(),
            email: self.input.email.clone(),
            comment: self.input.comment.clone(),
            errors: FieldErrorsData {
                name: message(Field::Name),
                email: message(Field::Email),
                comment: message(Field::Comment),
            },
            notice: self.notice.clone(),
        }
    }
}
