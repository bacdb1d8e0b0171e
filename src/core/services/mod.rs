pub mod listing_service;
pub mod rollup_service;

pub use listing_service::{Cursor, Direction, ListingPage, ListingRequest, ListingService};
pub use rollup_service::{RollupRequest, RollupService};
