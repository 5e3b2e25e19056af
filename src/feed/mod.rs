/// Feed query engine: composes author, follow, region, text and tag filters
/// into one timeline read
mod manager;

pub use manager::FeedManager;

/// Filter set for one feed query
///
/// `author_id` and `following_only_for` both narrow the candidate author set;
/// when both arrive the author filter wins.
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub author_id: Option<String>,
    pub following_only_for: Option<String>,
    pub region: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
}
