#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: i64,
    pub size: i64,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0) * self.size
    }
}
