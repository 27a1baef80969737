//! Post, Author and Comment documents as returned by the content store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::rich_text::Node;
use crate::helpers::post_path;

/// A blog post
///
/// The listing projection only fills the card fields; `created_at`, `body`
/// and `comments` stay empty there.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    /// Document id
    #[serde(rename = "_id")]
    pub id: String,

    /// Creation timestamp
    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: Slug,

    #[serde(rename = "mainImage", default)]
    pub main_image: Option<ImageRef>,

    /// Expanded author reference
    #[serde(default)]
    pub author: Option<Author>,

    /// Rich text body
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<Node>,

    /// Comments attached by the detail query
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
}

impl Post {
    /// URL path of the detail page
    pub fn path(&self) -> String {
        post_path(&self.slug.current)
    }

    /// Author display name, empty when the reference did not resolve
    pub fn author_name(&self) -> &str {
        self.author.as_ref().map(|a| a.name.as_str()).unwrap_or("")
    }

    /// Drop every comment that is not approved or belongs to another post
    pub fn retain_approved_comments(&mut self) {
        let id = self.id.clone();
        let before = self.comments.len();
        self.comments.retain(|c| c.approved && c.post.reference == id);
        let dropped = before - self.comments.len();
        if dropped > 0 {
            tracing::warn!(post = %id, dropped, "store returned comments that are not displayable");
        }
    }
}

/// URL-safe identifier wrapper (`slug.current`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current: String,
}

/// Post author, embedded by reference expansion
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// A reader comment
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "_updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Parent post
    pub post: Reference,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,

    /// Set by moderation; absent means not approved
    #[serde(default, deserialize_with = "null_as_default")]
    pub approved: bool,
}

/// A strong reference to another document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_ref")]
    pub reference: String,
    #[serde(rename = "_type", default = "reference_type")]
    pub kind: String,
}

impl Reference {
    pub fn to(id: impl Into<String>) -> Self {
        Self {
            reference: id.into(),
            kind: reference_type(),
        }
    }
}

fn reference_type() -> String {
    "reference".to_string()
}

/// An image field: either an asset reference or an expanded asset with a URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub asset: Option<AssetRef>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// The `asset` part of an image field
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ImageRef {
    /// Image pointing at an asset document id
    pub fn from_ref(reference: impl Into<String>) -> Self {
        Self {
            asset: Some(AssetRef {
                reference: Some(reference.into()),
                url: None,
            }),
            alt: None,
        }
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
