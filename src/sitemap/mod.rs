//! Sitemap feed over the compiled route set.

pub mod feed;

pub use feed::{sitemap_entries, SitemapEntry};
