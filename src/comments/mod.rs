//! Comment submission
//!
//! A comment is created unapproved: [`NewComment`] has no `approved` field,
//! so nothing a reader sends can mark their own comment as approved.
//! Approval happens in the content store's moderation tooling.

mod form;

pub use form::{CommentForm, CommentInput, Field, FormState, ValidationError};

use serde::Deserialize;
use serde_json::{json, Value};

use crate::content::Reference;
use crate::store::{ContentStore, RemoteQueryError};

/// JSON payload accepted by `POST /api/createComment`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentSubmission {
    /// Id of the post being commented on
    #[serde(rename = "_id", alias = "postId")]
    pub post_id: String,
    pub name: String,
    pub email: String,
    pub comment: String,
}

impl CommentSubmission {
    /// The document to create for this submission
    pub fn into_document(self) -> NewComment {
        NewComment {
            post: Reference::to(self.post_id),
            name: self.name,
            email: self.email,
            comment: self.comment,
        }
    }
}

/// A comment document ready to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post: Reference,
    pub name: String,
    pub email: String,
    pub comment: String,
}

impl NewComment {
    pub fn to_document(&self) -> Value {
        json!({
            "_type": "comment",
            "post": {
                "_ref": self.post.reference,
                "_type": self.post.kind,
            },
            "name": self.name,
            "email": self.email,
            "comment": self.comment,
        })
    }
}

/// Create one unapproved comment in the store
pub async fn create_comment(
    store: &dyn ContentStore,
    submission: CommentSubmission,
) -> Result<Value, RemoteQueryError> {
    let post_id = submission.post_id.clone();
    let created = store.create(submission.into_document().to_document()).await?;
    tracing::info!(post = %post_id, "comment submitted");
    Ok(created)
}
