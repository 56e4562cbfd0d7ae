//! HTTP client for GitHub API

pub mod client;

pub use client::GitHubApiClient;

/// Items requested per listing. Listings are never paginated past the first page.
pub const PAGE_SIZE: usize = 100;

/// True when a listing filled its single page and may be missing entries
#[inline]
pub fn at_page_cap(len: usize) -> bool {
    len >= PAGE_SIZE
}
