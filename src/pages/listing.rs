use crate::content::Post;
use crate::store::{fetch, queries, ContentStore, ImageUrlBuilder, QueryParams, RemoteQueryError};
use crate::templates::PostCard;

use super::AVATAR_WIDTH;

/// Fetch every post and shape it into listing cards, in store order
pub async fn load_listing(
    store: &dyn ContentStore,
    images: &ImageUrlBuilder,
) -> Result<Vec<PostCard>, RemoteQueryError> {
    let posts: Option<Vec<Post>> = fetch(store, queries::ALL_POSTS, &QueryParams::new()).await?;
    let posts = posts.unwrap_or_default();
    tracing::debug!(count = posts.len(), "loaded listing");

    Ok(posts.iter().map(|post| build_card(post, images)).collect())
}

pub fn build_card(post: &Post, images: &ImageUrlBuilder) -> PostCard {
    let author_image = post.author.as_ref().and_then(|a| a.image.as_ref());

    PostCard {
        id: post.id.clone(),
        title: post.title.clone(),
        description: post.description.clone(),
        path: post.path(),
        main_image: images.resolve_or_empty(post.main_image.as_ref()),
        author_name: post.author_name().to_string(),
        author_image: images.width(AVATAR_WIDTH).resolve_or_empty(author_image),
    }
}
