//! Error type for the page handlers.
//!
//! Errors are rendered as HTML error pages, since every route that returns a
//! `BlogError` serves HTML to a browser.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use lazy_static::lazy_static;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::helpers::html_escape;
use crate::store::RemoteQueryError;
use crate::templates::{ErrorData, SiteData, TemplateRenderer};

lazy_static! {
    static ref ERROR_PAGES: Option<TemplateRenderer> = TemplateRenderer::new()
        .map_err(|e| tracing::error!(error = %e, "error page templates failed to load"))
        .ok();
}

#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    /// The content store could not answer.
    ///
    /// Shared because one failed page load answers every request waiting
    /// on it.
    #[error("content query failed: {0}")]
    RemoteQuery(#[source] Arc<RemoteQueryError>),

    /// No post at the requested path.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RemoteQueryError> for BlogError {
    fn from(err: RemoteQueryError) -> Self {
        Self::RemoteQuery(Arc::new(err))
    }
}

impl From<Arc<RemoteQueryError>> for BlogError {
    fn from(err: Arc<RemoteQueryError>) -> Self {
        Self::RemoteQuery(err)
    }
}

impl BlogError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Status, page title and reader-facing message
    fn page(&self) -> ErrorData {
        let (title, message) = match self {
            Self::NotFound(path) => (
                "Not Found",
                format!("There is no post at {path}."),
            ),
            Self::RemoteQuery(err) => {
                tracing::error!(error = %err, "content query failed");
                (
                    "Service Unavailable",
                    "Posts could not be loaded right now. Please try again later.".to_string(),
                )
            }
            Self::Template(err) => {
                tracing::error!(error = ?err, "template rendering failed");
                (
                    "Internal Error",
                    "An internal error occurred. Please try again later.".to_string(),
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    "Internal Error",
                    "An internal error occurred. Please try again later.".to_string(),
                )
            }
        };

        ErrorData {
            status: self.status().as_u16(),
            title: title.to_string(),
            message,
        }
    }
}

impl BlogError {
    /// Render this error as an HTML page for `site`
    pub fn into_page(self, site: &SiteData, templates: Option<&TemplateRenderer>) -> Response {
        let status = self.status();
        let page = self.page();

        let rendered = templates.and_then(|t| t.render_error(site, &page).ok());

        let body = rendered.unwrap_or_else(|| {
            format!(
                "<!DOCTYPE html><title>{0}</title><h1>{0}</h1><p>{1}</p>",
                html_escape(&page.title),
                html_escape(&page.message)
            )
        });

        (status, Html(body)).into_response()
    }
}

/// Without a [`crate::Blog`] at hand the page carries the default site title.
impl IntoResponse for BlogError {
    fn into_response(self) -> Response {
        let site = SiteConfig::default();
        let site = SiteData {
            title: site.title,
            tagline: site.tagline,
        };
        self.into_page(&site, ERROR_PAGES.as_ref())
    }
}
