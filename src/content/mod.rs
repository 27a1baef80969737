//! Content module - documents read from the store and rich text rendering

mod post;
pub mod rich_text;

pub use post::{AssetRef, Author, Comment, ImageRef, Post, Reference, Slug};
pub use rich_text::{Node, RichTextRenderer};
