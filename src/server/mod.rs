//! HTTP server

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::comments::{CommentForm, CommentInput, CommentSubmission};
use crate::Blog;

/// Listing and form responses are per-request
const NO_STORE: &str = "private, no-cache, no-store, max-age=0, must-revalidate";

/// Build the application router
pub fn router(blog: Arc<Blog>) -> Router {
    let public_dir = blog.config.public_dir.clone();

    Router::new()
        .route("/", get(listing))
        .route("/post/:slug", get(post_detail).post(post_form))
        .route("/api/createComment", post(create_comment))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(blog)
}

/// Start the server on `addr`
pub async fn start(blog: Arc<Blog>, addr: SocketAddr) -> Result<()> {
    let app = router(blog);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running at http://{}", listener.local_addr()?);
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn listing(State(blog): State<Arc<Blog>>) -> Result<Response, Response> {
    let html = blog
        .listing_html()
        .await
        .map_err(|e| blog.error_response(e))?;
    Ok(([(header::CACHE_CONTROL, NO_STORE)], Html(html)).into_response())
}

async fn post_detail(
    State(blog): State<Arc<Blog>>,
    Path(slug): Path<String>,
) -> Result<Response, Response> {
    let html = blog
        .post_html(&slug, &CommentForm::new())
        .await
        .map_err(|e| blog.error_response(e))?;
    let cache_control = format!("s-maxage={}, stale-while-revalidate", blog.revalidate_secs());
    Ok(([(header::CACHE_CONTROL, cache_control)], Html(html)).into_response())
}

async fn post_form(
    State(blog): State<Arc<Blog>>,
    Path(slug): Path<String>,
    Form(input): Form<CommentInput>,
) -> Result<Response, Response> {
    let html = blog
        .submit_form(&slug, input)
        .await
        .map_err(|e| blog.error_response(e))?;
    Ok(([(header::CACHE_CONTROL, NO_STORE)], Html(html)).into_response())
}

/// `POST /api/createComment`
///
/// The body is read as JSON whatever the request's content type says.
async fn create_comment(State(blog): State<Arc<Blog>>, body: String) -> Response {
    let submission: CommentSubmission = match serde_json::from_str(&body) {
        Ok(submission) => submission,
        Err(e) => {
            tracing::debug!(error = %e, "rejected comment payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Invalid comment payload",
                    "error": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    match blog.create_comment(submission).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Comment submitted successfully" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "couldn't submit comment");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Something went wrong, couldn't submit comment",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
