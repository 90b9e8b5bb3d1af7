//! The fixed seed posts.
//!
//! Three built-in placeholders shown unconditionally ahead of live
//! content, so the first paint is never an empty feed while the network
//! call is outstanding. Not viewer-specific, never persisted.

use super::model::{Post, PostCard};

/// Number of seed posts every assembled feed starts with.
pub const SEED_POST_COUNT: usize = 3;

/// Returns the seed sequence, always in the same order.
pub fn seed_posts() -> Vec<Post> {
    vec![
        Post::Seed(PostCard {
            author_username: "adventurer".to_string(),
            image_url: "https://images.unsplash.com/photo-1682687220742-aba13b6e50ba"
                .to_string(),
            caption: "Exploring the beautiful mountains today! 🏔️ #nature #adventure"
                .to_string(),
            like_count: 156,
            viewer_has_liked: false,
            viewer_has_saved: false,
        }),
        Post::Seed(PostCard {
            author_username: "techie".to_string(),
            image_url: "https://images.unsplash.com/photo-1682687221038-404670d5f335"
                .to_string(),
            caption: "Coffee and code, perfect morning ☕️ #developer #coding".to_string(),
            like_count: 89,
            viewer_has_liked: false,
            viewer_has_saved: false,
        }),
        Post::Seed(PostCard {
            author_username: "beachlover".to_string(),
            image_url: "https://images.unsplash.com/photo-1682687220199-d0124f48f95b"
                .to_string(),
            caption: "Sunset vibes at the beach 🌅 #sunset #beach #peace".to_string(),
            like_count: 234,
            viewer_has_liked: false,
            viewer_has_saved: false,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_sequence_is_deterministic() {
        let first = seed_posts();
        let second = seed_posts();
        assert_eq!(first, second);
        assert_eq!(first.len(), SEED_POST_COUNT);
    }

    #[test]
    fn test_seeds_carry_no_backend_id_and_no_viewer_flags() {
        for post in seed_posts() {
            assert!(post.is_seed());
            assert!(post.record_id().is_none());
            assert!(!post.card().viewer_has_liked);
            assert!(!post.card().viewer_has_saved);
        }
    }
}
