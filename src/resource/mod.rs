//! Static content: files and generated directory listings rooted at the
//! served directory.

pub mod listing;
pub mod resolver;

pub use listing::ListingEntry;
pub use resolver::{ResourceResolver, percent_decode};
