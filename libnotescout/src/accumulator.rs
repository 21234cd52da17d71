//! Deduplicating post accumulator

use std::collections::HashSet;

use crate::note_url::PostUrl;

/// Collects post URLs in first-seen order, dropping repeats of a post id.
///
/// One accumulator lives for one resolution call; there is no removal.
#[derive(Debug, Default)]
pub struct NoteAccumulator {
    seen: HashSet<String>,
    items: Vec<PostUrl>,
}

impl NoteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the post was new
    pub fn add(&mut self, post_url: PostUrl) -> bool {
        if !self.seen.insert(post_url.post_id.clone()) {
            return false;
        }
        self.items.push(post_url);
        true
    }

    pub fn items(&self) -> &[PostUrl] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<PostUrl> {
        self.items
    }
}
