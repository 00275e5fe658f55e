pub mod entity;
pub mod filters;
pub mod identity;
pub mod photo;
pub mod review;
pub mod vote;
