//! donblog: a server-rendered blog backed by a Sanity content store
//!
//! Posts are queried from the store, their rich text bodies rendered to
//! HTML with Tera templates, and detail pages kept in a stale-while-revalidate
//! cache. Readers can leave comments, which are created unapproved.

pub mod cache;
pub mod comments;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod pages;
pub mod server;
pub mod store;
pub mod templates;

use anyhow::Result;
use chrono_tz::Tz;
use serde_json::Value;
use std::sync::Arc;

use cache::PageCache;
use comments::{CommentForm, CommentInput, CommentSubmission};
use config::{FallbackPolicy, SiteConfig};
use error::BlogError;
use store::{ContentStore, ImageUrlBuilder, RemoteQueryError, SanityClient};
use templates::{PostPage, SiteData, TemplateRenderer};

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: SiteConfig,
    store: Arc<dyn ContentStore>,
    images: ImageUrlBuilder,
    templates: Arc<TemplateRenderer>,
    /// Rendered detail pages keyed by slug
    pages: PageCache<String, Arc<PostPage>>,
}

impl Blog {
    /// Create the application with a Sanity client built from `config`
    pub fn new(config: SiteConfig) -> Result<Self> {
        let client = SanityClient::new(&config.store)?;
        Self::with_store(config, Arc::new(client))
    }

    /// Create the application around an existing content store
    pub fn with_store(config: SiteConfig, store: Arc<dyn ContentStore>) -> Result<Self> {
        let images = ImageUrlBuilder::new(&config.store.project_id, &config.store.dataset);
        let templates = Arc::new(TemplateRenderer::new()?);
        let pages = PageCache::new(config.revalidate.window());

        Ok(Self {
            config,
            store,
            images,
            templates,
            pages,
        })
    }

    pub fn site(&self) -> SiteData {
        SiteData {
            title: self.config.title.clone(),
            tagline: self.config.tagline.clone(),
        }
    }

    /// Render `err` as an error page carrying this site's title
    pub fn error_response(&self, err: BlogError) -> axum::response::Response {
        err.into_page(&self.site(), Some(&self.templates))
    }

    /// Seconds a detail page is served before it is revalidated
    pub fn revalidate_secs(&self) -> u64 {
        self.config.revalidate.window_secs
    }

    /// Render the home page from a fresh listing query
    pub async fn listing_html(&self) -> Result<String, BlogError> {
        let cards = pages::load_listing(self.store.as_ref(), &self.images).await?;
        Ok(self.templates.render_listing(&self.site(), &cards)?)
    }

    /// Detail paths of every post
    pub async fn paths(&self) -> Result<Vec<String>, RemoteQueryError> {
        pages::enumerate_paths(self.store.as_ref()).await
    }

    /// Render every known post into the page cache
    ///
    /// Returns the number of pages cached. Posts that fail to load are
    /// skipped and left to the fallback policy.
    pub async fn prerender(&self) -> Result<usize, RemoteQueryError> {
        let slugs = pages::enumerate_slugs(self.store.as_ref()).await?;
        let mut rendered = 0;

        for slug in slugs {
            match load_page(self.store.as_ref(), &self.images, self.tz(), &slug).await {
                Ok(Some(page)) => {
                    self.pages.insert(slug, page).await;
                    rendered += 1;
                }
                Ok(None) => tracing::debug!(slug = %slug, "post vanished before prerender"),
                Err(e) => tracing::warn!(slug = %slug, error = %e, "failed to prerender post"),
            }
        }

        tracing::info!(pages = rendered, "prerendered detail pages");
        Ok(rendered)
    }

    /// The cached detail page for `slug`, loading it if allowed
    pub async fn post_page(&self, slug: &str) -> Result<Arc<PostPage>, BlogError> {
        let key = slug.to_string();

        if self.config.revalidate.fallback == FallbackPolicy::None
            && !self.pages.contains(&key)
        {
            return Err(BlogError::NotFound(helpers::post_path(slug)));
        }

        let store = Arc::clone(&self.store);
        let images = self.images.clone();
        let tz = self.tz();
        let owned = key.clone();
        let load = move || async move { load_page(store.as_ref(), &images, tz, &owned).await };

        self.pages
            .get_or_load(key, load)
            .await?
            .ok_or_else(|| BlogError::NotFound(helpers::post_path(slug)))
    }

    /// Render a detail page with the comment form in `form`'s state
    pub async fn post_html(&self, slug: &str, form: &CommentForm) -> Result<String, BlogError> {
        let page = self.post_page(slug).await?;
        Ok(self
            .templates
            .render_post(&self.site(), &page, &form.view())?)
    }

    /// Run a posted comment form and render the resulting page
    pub async fn submit_form(&self, slug: &str, input: CommentInput) -> Result<String, BlogError> {
        let page = self.post_page(slug).await?;

        let mut form = CommentForm::with_input(input);
        form.submit(self.store.as_ref(), &page.id).await;

        Ok(self
            .templates
            .render_post(&self.site(), &page, &form.view())?)
    }

    /// Create a comment from an API submission
    pub async fn create_comment(
        &self,
        submission: CommentSubmission,
    ) -> Result<Value, RemoteQueryError> {
        comments::create_comment(self.store.as_ref(), submission).await
    }

    fn tz(&self) -> Tz {
        self.config.tz()
    }
}

async fn load_page(
    store: &dyn ContentStore,
    images: &ImageUrlBuilder,
    tz: Tz,
    slug: &str,
) -> Result<Option<Arc<PostPage>>, RemoteQueryError> {
    let post = pages::load_post(store, slug).await?;
    Ok(post.map(|post| Arc::new(pages::build_page(&post, images, tz))))
}
