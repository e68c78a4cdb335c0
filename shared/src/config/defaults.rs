//! Defaults applied when normalizing query requests.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Page size used when a request does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Length of the search window used when a request has no time bounds.
pub const DEFAULT_WINDOW_SECS: i64 = 3600;

/// Filter expression used when a request has none; matches every row.
pub const DEFAULT_FILTER: &str = "1=1";

/// Defaults for request normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Page size applied when the request's page size is zero.
    pub page_size: u32,
    /// Length in seconds of the trailing window applied when a time bound is zero.
    pub window_secs: i64,
}

impl QueryDefaults {
    /// Creates a new set of defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use shared::config::QueryDefaults;
    ///
    /// let defaults = QueryDefaults::new(50, 900);
    /// assert_eq!(defaults.window().as_secs(), 900);
    /// ```
    #[must_use]
    pub fn new(page_size: u32, window_secs: i64) -> Self {
        Self {
            page_size,
            window_secs,
        }
    }

    /// Returns the default window as a `Duration`.
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.window_secs).unwrap_or(0))
    }

    /// Validates the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The page size is zero
    /// - The window is not positive
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("Default page size must be greater than zero".to_string());
        }
        if self.window_secs <= 0 {
            return Err("Default window must be greater than zero seconds".to_string());
        }
        Ok(())
    }
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_WINDOW_SECS)
    }
}
