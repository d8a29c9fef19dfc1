use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// The number of records returned when no limit is given.
const DEFAULT_LIMIT: i64 = 50;

/// The largest number of records a single page may request.
const MAX_LIMIT: i64 = 1000;

/// Pagination parameters.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// The number of records to skip from the start.
    skip: Option<i64>,
    /// The maximum number of records to return.
    limit: Option<i64>,
}

impl PaginationParams {
    /// Constructs pagination parameters with both values set.
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip: Some(skip),
            limit: Some(limit),
        }
    }

    /// The number of records to skip.
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// The number of records to return.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(0, MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let params = PaginationParams::default();
        assert_eq!(0, params.skip());
        assert_eq!(DEFAULT_LIMIT, params.limit());
    }

    #[test]
    fn explicit_values_are_used() {
        let params = PaginationParams::new(10, 5);
        assert_eq!(10, params.skip());
        assert_eq!(5, params.limit());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let params = PaginationParams::new(-3, MAX_LIMIT + 1);
        assert_eq!(0, params.skip());
        assert_eq!(MAX_LIMIT, params.limit());
    }
}
