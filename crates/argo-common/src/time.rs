//! Filename and calendar helpers for the archive layout.

use chrono::{Datelike, Duration, NaiveDate};

/// Filename suffix of ARGO profile files in the archive.
pub const PROFILE_SUFFIX: &str = "_prof.nc";

/// Extract the date from a profile filename like `20250911_prof.nc`.
///
/// Returns `None` for any malformed name; callers record a skip instead of
/// aborting the batch.
pub fn profile_date(filename: &str) -> Option<NaiveDate> {
    let stem = filename.strip_suffix(PROFILE_SUFFIX)?;
    if stem.len() != 8 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(stem, "%Y%m%d").ok()
}

/// Folder name for a day's downloads, e.g. `11sep2025`.
pub fn date_folder_name(date: NaiveDate) -> String {
    date.format("%d%b%Y").to_string().to_lowercase()
}

/// Months the daily extractor re-scans: always the current month, plus the
/// previous month during the first five days (late arrivals land there).
pub fn months_to_check(today: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = vec![(today.year(), today.month())];
    if today.day() <= 5 {
        if let Some(first) = today.with_day(1) {
            let prev = first - Duration::days(1);
            months.push((prev.year(), prev.month()));
        }
    }
    months
}
