use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub size: i64,
}

impl Pagination {
    /// Pages are 1-based; anything below that would turn into a negative
    /// OFFSET at the database.
    pub fn check(page: i64, size: i64) -> Result<(), Error> {
        if page < 1 || size < 1 {
            return Err(Error::Validation("page and size must be positive".into()));
        }
        Ok(())
    }
}
