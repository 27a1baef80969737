//! Built-in blog templates using the Tera template engine
//!
//! All templates are embedded directly in the binary.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::helpers::html_escape;

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Autoescaping stays on for .html templates; our escape function
        // leaves '/' alone so paths and URLs read normally in the markup.
        tera.set_escape_fn(html_escape);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("post.html", include_str!("blog/post.html")),
            ("error.html", include_str!("blog/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("blog/partials/header.html"),
            ),
            (
                "partials/comment_form.html",
                include_str!("blog/partials/comment_form.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(template_name, context)
    }

    /// Render the home page listing
    pub fn render_listing(&self, site: &SiteData, posts: &[PostCard]) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("posts", posts);
        self.render("index.html", &context)
    }

    /// Render a post detail page with the comment form in `form` state
    pub fn render_post(
        &self,
        site: &SiteData,
        post: &PostPage,
        form: &FormView,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("post", post);
        context.insert("form", form);
        self.render("post.html", &context)
    }

    /// Render an error page
    pub fn render_error(&self, site: &SiteData, error: &ErrorData) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("error", error);
        self.render("error.html", &context)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub tagline: String,
}

/// One card on the listing page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub path: String,
    pub main_image: String,
    pub author_name: String,
    pub author_image: String,
}

/// Everything the detail page shows about a post
#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub id: String,
    pub title: String,
    pub description: String,
    pub path: String,
    pub main_image: String,
    pub author_name: String,
    pub author_image: String,
    pub published_at: Option<String>,
    /// Pre-rendered rich text body
    pub body_html: String,
    pub comments: Vec<CommentData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentData {
    pub id: String,
    pub name: String,
    pub comment: String,
}

/// Comment form state as shown on the detail page
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormView {
    /// "unsubmitted" or "submitted"
    pub state: &'static str,
    pub name: String,
    pub email: String,
    pub comment: String,
    pub errors: FieldErrorsData,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldErrorsData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorData {
    pub status: u16,
    pub title: String,
    pub message: String,
}
