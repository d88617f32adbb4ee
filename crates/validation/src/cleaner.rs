//! The `Cleaner` trait and compile-time-checked category dispatch.

use agro_core::{
    CleaningResult, DataCategory, IssueAction, Record, Severity, ValidationIssue,
};
use serde_json::json;

use crate::quality::{cleaning_confidence, quality_score};
use crate::{CropCleaner, MarketCleaner, SoilCleaner, WeatherCleaner};

/// Per-category record cleaner.
pub trait Cleaner {
    fn category(&self) -> DataCategory;
    fn clean(&self, record: Record) -> CleaningResult;
}

/// Enum dispatch over the category cleaners. Recommendation payloads are
/// produced downstream and pass through uncleaned.
#[derive(Debug, Clone, Copy)]
pub enum CategoryCleaner {
    Weather(WeatherCleaner),
    Soil(SoilCleaner),
    Crop(CropCleaner),
    Market(MarketCleaner),
}

impl CategoryCleaner {
    /// Cleaner for a category, or `None` for pass-through categories.
    pub fn for_category(category: DataCategory) -> Option<Self> {
        match category {
            DataCategory::Weather => Some(Self::Weather(WeatherCleaner)),
            DataCategory::Soil => Some(Self::Soil(SoilCleaner)),
            DataCategory::Crop => Some(Self::Crop(CropCleaner)),
            DataCategory::Market => Some(Self::Market(MarketCleaner)),
            DataCategory::Recommendation => None,
        }
    }
}

impl Cleaner for CategoryCleaner {
    fn category(&self) -> DataCategory {
        match self {
            Self::Weather(c) => c.category(),
            Self::Soil(c) => c.category(),
            Self::Crop(c) => c.category(),
            Self::Market(c) => c.category(),
        }
    }

    fn clean(&self, record: Record) -> CleaningResult {
        if record.category() != self.category() {
            return category_mismatch(record, self.category());
        }
        match self {
            Self::Weather(c) => c.clean(record),
            Self::Soil(c) => c.clean(record),
            Self::Crop(c) => c.clean(record),
            Self::Market(c) => c.clean(record),
        }
    }
}

/// Blocking result for a record handed to the wrong cleaner.
pub(crate) fn category_mismatch(record: Record, expected: DataCategory) -> CleaningResult {
    let issue = ValidationIssue::new(
        "category",
        Severity::Critical,
        format!(
            "record category '{}' does not match cleaner '{}'",
            record.category(),
            expected
        ),
        json!(record.category().as_str()),
        None,
        IssueAction::Remove,
    );
    finish(record, vec![issue])
}

/// Assemble a [`CleaningResult`] from the cleaned record and collected
/// issues: scores quality, averages confidence, and renders the action
/// log.
pub(crate) fn finish(record: Record, issues: Vec<ValidationIssue>) -> CleaningResult {
    let quality = quality_score(
        &issues,
        record.present_field_count(),
        record.expected_field_count(),
    );
    let confidence = cleaning_confidence(&issues);
    let actions = issues
        .iter()
        .map(|i| {
            let verb = match i.action {
                IssueAction::Remove => "removed",
                IssueAction::Correct => "corrected",
                IssueAction::Normalize => "normalized",
                IssueAction::Flag => "flagged",
            };
            format!("{} {}: {}", verb, i.field, i.message)
        })
        .collect();

    CleaningResult {
        cleaned: record,
        issues,
        actions,
        quality_score: quality,
        confidence,
    }
}
