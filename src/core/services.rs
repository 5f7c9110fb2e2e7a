pub mod analytics;
pub mod draft;
pub mod export;
pub mod response;
