//! Feed entries: seed placeholders and live records.

pub mod model;
pub mod seed;

pub use model::{EdgeKind, EdgeWrite, PendingToggle, Post, PostCard};
pub use seed::{SEED_POST_COUNT, seed_posts};
