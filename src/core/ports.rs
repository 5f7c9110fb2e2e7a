pub mod cache;
pub mod renderer;
pub mod repository;
pub mod tokener;
