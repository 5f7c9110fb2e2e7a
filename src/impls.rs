pub mod cache;
pub mod renderer;
pub mod store;
pub mod tokener;
