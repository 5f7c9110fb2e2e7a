pub mod analytics;
pub mod common;
pub mod response;
pub mod survey;
