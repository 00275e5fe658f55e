pub mod middleware;
pub mod photos;
pub mod reviews;
