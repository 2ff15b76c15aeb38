//! Filter and sort parameters supplied by the presentation layer.
//!
//! `SortField` and `SortDirection` parse case-insensitively from strings and double
//! as `clap` value enums, so the console front end can take them as flags.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Quote field a view can be ordered by.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
)]
#[serde(rename_all = "camelCase")]
#[clap(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortField {
    #[default]
    Symbol,
    Name,
    Price,
    Change,
    ChangePercent,
}

/// Ordering direction.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lower")]
#[strum(ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    #[strum(to_string = "asc", serialize = "ascending")]
    Asc,
    #[strum(to_string = "desc", serialize = "descending")]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Field plus direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Everything the derivation engine needs besides the snapshot itself.
///
/// The default is an empty search ordered by symbol, ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct FilterSortParams {
    /// Case-insensitive substring matched against symbol or name.
    pub search: String,
    pub sort: SortSpec,
}

impl FilterSortParams {
    pub fn new(search: &str, sort: SortSpec) -> Self {
        Self {
            search: search.to_string(),
            sort,
        }
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = search.to_string();
        self
    }

    pub fn with_sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = SortSpec::new(field, direction);
        self
    }

    /// Column-header behaviour: clicking the active field flips the direction,
    /// clicking another field sorts by it ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort.field == field {
            self.sort.direction = self.sort.direction.flipped();
        } else {
            self.sort = SortSpec::new(field, SortDirection::Asc);
        }
    }

    /// True when the search does not restrict the quote set.
    pub fn search_is_blank(&self) -> bool {
        self.search.trim().is_empty()
    }
}
