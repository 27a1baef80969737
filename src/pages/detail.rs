use chrono_tz::Tz;
use serde_json::json;

use crate::content::{Post, RichTextRenderer};
use crate::helpers::{locale_datetime, post_path};
use crate::store::{fetch, queries, ContentStore, ImageUrlBuilder, QueryParams, RemoteQueryError};
use crate::templates::{CommentData, PostPage};

use super::AVATAR_WIDTH;

/// Slugs of every post, skipping posts without one
pub async fn enumerate_slugs(store: &dyn ContentStore) -> Result<Vec<String>, RemoteQueryError> {
    let posts: Option<Vec<Post>> = fetch(store, queries::ALL_SLUGS, &QueryParams::new()).await?;

    Ok(posts
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.slug.current)
        .filter(|s| !s.is_empty())
        .collect())
}

/// Detail page paths for every post
pub async fn enumerate_paths(store: &dyn ContentStore) -> Result<Vec<String>, RemoteQueryError> {
    let slugs = enumerate_slugs(store).await?;
    Ok(slugs.iter().map(|s| post_path(s)).collect())
}

/// Fetch one post by slug with its approved comments
///
/// Returns `Ok(None)` when no post has this slug.
pub async fn load_post(
    store: &dyn ContentStore,
    slug: &str,
) -> Result<Option<Post>, RemoteQueryError> {
    let mut params = QueryParams::new();
    params.insert("slug".to_string(), json!(slug));

    let post: Option<Post> = fetch(store, queries::POST_BY_SLUG, &params).await?;
    Ok(post.map(|mut post| {
        post.retain_approved_comments();
        post
    }))
}

/// Shape a loaded post into the detail page view
pub fn build_page(post: &Post, images: &ImageUrlBuilder, tz: Tz) -> PostPage {
    let author_image = post.author.as_ref().and_then(|a| a.image.as_ref());

    PostPage {
        id: post.id.clone(),
        title: post.title.clone(),
        description: post.description.clone(),
        path: post.path(),
        main_image: images.resolve_or_empty(post.main_image.as_ref()),
        author_name: post.author_name().to_string(),
        author_image: images.width(AVATAR_WIDTH).resolve_or_empty(author_image),
        published_at: post.created_at.as_ref().map(|d| locale_datetime(d, tz)),
        body_html: RichTextRenderer::new(images.clone()).render(&post.body),
        comments: post
            .comments
            .iter()
            .map(|c| CommentData {
                id: c.id.clone(),
                name: c.name.clone(),
                comment: c.comment.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::{comment_doc, post_doc, FakeStore};

    #[tokio::test]
    async fn test_enumerate_paths() {
        let mut untitled = post_doc("p3", "", "Draft");
        untitled["slug"] = serde_json::Value::Null;
        let store = FakeStore::with_posts(vec![
            post_doc("p1", "first", "First"),
            post_doc("p2", "hello world", "Second"),
            untitled,
        ]);

        let paths = enumerate_paths(&store).await.unwrap();
        assert_eq!(paths, vec!["/post/first", "/post/hello%20world"]);
    }

    #[tokio::test]
    async fn test_load_post_missing_slug() {
        let store = FakeStore::with_posts(vec![post_doc("p1", "first", "First")]);
        assert!(load_post(&store, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_post_keeps_only_approved_comments() {
        let store = FakeStore::with_posts(vec![post_doc("p1", "first", "First")]);
        store.add_comment(comment_doc("c1", "p1", "approved one", Some(true)));
        store.add_comment(comment_doc("c2", "p1", "rejected one", Some(false)));
        store.add_comment(comment_doc("c3", "p1", "pending one", None));
        store.add_comment(comment_doc("c4", "p2", "other post", Some(true)));

        let post = load_post(&store, "first").await.unwrap().unwrap();
        let ids: Vec<&str> = post.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1"]);
    }

    #[tokio::test]
    async fn test_build_page() {
        let store = FakeStore::with_posts(vec![post_doc("p1", "first", "First")]);
        store.add_comment(comment_doc("c1", "p1", "Nice!", Some(true)));
        let post = load_post(&store, "first").await.unwrap().unwrap();

        let images = ImageUrlBuilder::new("proj", "production");
        let page = build_page(&post, &images, chrono_tz::UTC);

        assert_eq!(page.id, "p1");
        assert_eq!(page.path, "/post/first");
        assert_eq!(page.published_at.as_deref(), Some("1/15/2022, 3:04:05 PM"));
        assert_eq!(page.body_html, "<p>First body</p>");
        assert_eq!(page.comments.len(), 1);
        assert_eq!(page.comments[0].name, "c1 author");
        assert_eq!(page.comments[0].comment, "Nice!");
    }
}
