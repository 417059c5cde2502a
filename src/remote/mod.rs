//! Remote fetcher collaborator.
//!
//! ## Contents
//! - [`Fetcher`]        seam: profile + recent actions of one target
//! - [`fetch_target`]   profile-first poll with the advisory short-circuit
//! - [`payload`]        lenient decoding and normalization of forum JSON
//! - [`HttpFetcher`]    `reqwest` implementation (feature `http`)

mod fetcher;
#[cfg(feature = "http")]
mod http;
pub mod payload;

pub use fetcher::{FetchOutcome, Fetcher, PollProbe, fetch_target};
#[cfg(feature = "http")]
pub use http::HttpFetcher;
