pub mod contracts;
pub mod enrichment;
pub mod error;
pub mod feed;
pub mod jwt;
pub mod reviews;
pub mod votes;
