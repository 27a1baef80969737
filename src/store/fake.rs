//! In-memory content store used by unit tests
//!
//! Answers the three page queries from a list of post documents and a list
//! of comment documents. The post-by-slug query attaches every comment that
//! references the post, approved or not, so tests exercise the renderer's own
//! approval filter.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{queries, ContentStore, QueryParams, RemoteQueryError};

#[derive(Default)]
pub(crate) struct FakeStore {
    posts: Mutex<Vec<Value>>,
    comments: Mutex<Vec<Value>>,
    fail_queries: AtomicBool,
    fail_creates: AtomicBool,
    queries: Mutex<Vec<(String, QueryParams)>>,
    created: Mutex<Vec<Value>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(posts: Vec<Value>) -> Self {
        let store = Self::new();
        *store.posts.lock().unwrap() = posts;
        store
    }

    pub fn add_comment(&self, comment: Value) {
        self.comments.lock().unwrap().push(comment);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn created(&self) -> Vec<Value> {
        self.created.lock().unwrap().clone()
    }

    fn post_by_slug(&self, slug: &str) -> Value {
        let posts = self.posts.lock().unwrap();
        let Some(post) = posts.iter().find(|p| p["slug"]["current"] == slug) else {
            return Value::Null;
        };

        let comments: Vec<Value> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c["post"]["_ref"] == post["_id"])
            .cloned()
            .collect();

        let mut post = post.clone();
        post["comments"] = Value::Array(comments);
        post
    }
}

/// A post document with the fields every projection reads
pub(crate) fn post_doc(id: &str, slug: &str, title: &str) -> Value {
    json!({
        "_id": id,
        "_createdAt": "2022-01-15T15:04:05Z",
        "title": title,
        "description": format!("About {}", title),
        "slug": { "_type": "slug", "current": slug },
        "mainImage": { "_type": "image", "asset": { "_ref": "image-main1-800x600-jpg", "_type": "reference" } },
        "author": { "name": "Don", "image": { "asset": { "_ref": "image-don1-64x64-png" } } },
        "body": [{
            "_type": "block",
            "style": "normal",
            "markDefs": [],
            "children": [{ "_type": "span", "text": format!("{} body", title), "marks": [] }]
        }]
    })
}

/// A comment document on `post_id`
pub(crate) fn comment_doc(id: &str, post_id: &str, text: &str, approved: Option<bool>) -> Value {
    let mut doc = json!({
        "_id": id,
        "_type": "comment",
        "_createdAt": "2022-01-16T10:00:00Z",
        "_updatedAt": "2022-01-16T10:00:00Z",
        "post": { "_ref": post_id, "_type": "reference" },
        "name": format!("{} author", id),
        "email": "reader@example.com",
        "comment": text
    });
    if let Some(approved) = approved {
        doc["approved"] = json!(approved);
    }
    doc
}

#[async_trait]
impl ContentStore for FakeStore {
    async fn query(&self, query: &str, params: &QueryParams) -> Result<Value, RemoteQueryError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), params.clone()));

        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(RemoteQueryError::backend(503, "backend unavailable"));
        }

        match query {
            q if q == queries::ALL_POSTS || q == queries::ALL_SLUGS => {
                Ok(Value::Array(self.posts.lock().unwrap().clone()))
            }
            q if q == queries::POST_BY_SLUG => {
                let slug = params.get("slug").and_then(Value::as_str).unwrap_or("");
                Ok(self.post_by_slug(slug))
            }
            _ => Err(RemoteQueryError::backend(400, "unsupported query")),
        }
    }

    async fn create(&self, document: Value) -> Result<Value, RemoteQueryError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(RemoteQueryError::backend(
                403,
                "Insufficient permissions; permission \"create\" required",
            ));
        }

        let mut stored = document.clone();
        stored["_id"] = json!(format!("comment-{}", self.created.lock().unwrap().len() + 1));
        self.created.lock().unwrap().push(document);
        Ok(stored)
    }
}
