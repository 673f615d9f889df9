//! Normalized award rows produced by the results extractor.

use serde::{Deserialize, Serialize};

/// Whether a nominated film took the award in its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AwardStatus {
    Nominated,
    Won,
}

/// One row per (ceremony year, category, nominated film).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardRecord {
    /// Calendar year of the ceremony as displayed by the database.
    pub award_year: i32,
    /// Ordinal of the ceremony (e.g. 95 for the 95th Academy Awards).
    pub ceremony_number: u32,
    pub movie_title: String,
    pub award_category: String,
    pub status: AwardStatus,
}
