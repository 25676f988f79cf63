use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Rows-per-page choices offered by result tables
pub const ROWS_PER_PAGE_OPTIONS: [u32; 4] = [25, 50, 100, 250];

/// Sort direction, in the server's vocabulary
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Table widgets encode order as a sign: -1 is descending, anything else ascending
    pub fn from_sign(sign: i64) -> Self {
        if sign == -1 {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    pub fn sign(&self) -> i64 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Which slice of a result set to show and how to order it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: u32,
    pub rows_per_page: u32,
    pub sort_header: String,
    pub sort_order: SortOrder,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 0,
            rows_per_page: 100,
            sort_header: "score".to_string(),
            sort_order: SortOrder::Descending,
        }
    }
}

impl PaginationState {
    pub fn new(current_page: u32, rows_per_page: u32) -> Self {
        Self {
            current_page,
            rows_per_page,
            ..Default::default()
        }
    }

    /// Sort by `header`; choosing the current header again flips the order.
    /// Any re-sort goes back to the first page.
    pub fn with_sort(mut self, header: impl Into<String>) -> Self {
        let header = header.into();
        if header == self.sort_header {
            self.sort_order = self.sort_order.reversed();
        } else {
            self.sort_header = header;
            self.sort_order = SortOrder::Descending;
        }
        self.current_page = 0;
        self
    }

    /// Back to the first page and default sort, keeping the page size
    pub fn reset(&mut self) {
        let rows_per_page = self.rows_per_page;
        *self = Self {
            rows_per_page,
            ..Default::default()
        };
    }

    /// Number of pages needed to show `total` rows
    pub fn page_count(&self, total: u64) -> u64 {
        if self.rows_per_page == 0 {
            return 0;
        }
        total.div_ceil(u64::from(self.rows_per_page))
    }

    /// Query parameters understood by `GET /parallels/{id}`
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("page_number".to_string(), self.current_page.to_string()),
            ("per_page".to_string(), self.rows_per_page.to_string()),
            ("sort_by".to_string(), self.sort_header.clone()),
            ("sort_order".to_string(), self.sort_order.as_str().to_string()),
        ]
    }
}
