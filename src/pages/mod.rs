//! Page loaders: turn store documents into template view models

mod detail;
mod listing;

pub use detail::{build_page, enumerate_paths, enumerate_slugs, load_post};
pub use listing::{build_card, load_listing};

/// Avatar size used on cards and the detail header
pub const AVATAR_WIDTH: u32 = 48;
