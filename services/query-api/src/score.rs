//! Keyword relevance scoring against hand-built synonym tables.
//!
//! Fixed point bonuses accumulate per record: years named in the question,
//! region synonyms, and measurement-type synonyms for variables the record
//! actually carries. No normalization; ties keep corpus order (stable sort).

use chrono::Datelike;

use crate::corpus::ProfileDoc;

pub const YEAR_BONUS: i32 = 10;
pub const REGION_BONUS: i32 = 5;
pub const MEASUREMENT_BONUS: i32 = 3;
pub const BASELINE: i32 = 1;

/// Variable code -> question words that ask for it.
const MEASUREMENT_SYNONYMS: &[(&str, &[&str])] = &[
    ("TEMP", &["temperature", "temp", "thermal", "warm", "heat"]),
    ("PSAL", &["salinity", "salt", "saline", "psu"]),
    ("PRES", &["pressure", "depth", "deep", "dbar"]),
    ("DOXY", &["oxygen", "doxy", "o2", "hypoxic"]),
    ("CHLA", &["chlorophyll", "chla", "phytoplankton"]),
    ("NITRATE", &["nitrate", "nutrient"]),
    ("PH_IN_SITU_TOTAL", &["ph", "acidification", "acidity"]),
];

/// Region name -> question phrases that name it.
const REGION_SYNONYMS: &[(&str, &[&str])] = &[
    ("Arabian_Sea", &["arabian sea", "arabian"]),
    ("Bay_of_Bengal", &["bay of bengal", "bengal"]),
    ("Equatorial_Indian", &["equatorial indian", "equatorial", "equator"]),
    ("Southern_Ocean", &["southern ocean", "southern"]),
    ("Tropical_Indian", &["tropical indian", "tropical"]),
    ("Monsoon_Region", &["monsoon"]),
];

/// Synonym match: multi-word phrases match as substrings, single words
/// match whole words only (so "ph" does not fire inside "phytoplankton").
fn mentions(question_lower: &str, synonym: &str) -> bool {
    if synonym.contains(' ') {
        question_lower.contains(synonym)
    } else {
        question_lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| word == synonym)
    }
}

/// Four-digit years mentioned in the question (2000-2099).
pub fn years_in(question: &str) -> Vec<i32> {
    let mut years = Vec::new();
    let mut digits = String::new();

    for ch in question.chars().chain(std::iter::once(' ')) {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else {
            if digits.len() == 4 && digits.starts_with("20") {
                if let Ok(year) = digits.parse() {
                    if !years.contains(&year) {
                        years.push(year);
                    }
                }
            }
            digits.clear();
        }
    }

    years
}

/// Accumulated keyword score for one record. Zero means irrelevant, except
/// that records carrying temperature keep a baseline of 1 so a generic
/// question still finds the corpus.
pub fn score(doc: &ProfileDoc, question_lower: &str, years: &[i32]) -> i32 {
    let mut total = 0;

    if let Some(date) = doc.date {
        if years.contains(&date.year()) {
            total += YEAR_BONUS;
        }
    }

    for (region, synonyms) in REGION_SYNONYMS {
        if doc.regions.contains(region) && synonyms.iter().any(|s| mentions(question_lower, s)) {
            total += REGION_BONUS;
        }
    }

    for (variable, synonyms) in MEASUREMENT_SYNONYMS {
        if doc.record.has_variable(variable)
            && synonyms.iter().any(|s| mentions(question_lower, s))
        {
            total += MEASUREMENT_BONUS;
        }
    }

    if total == 0 && doc.record.has_variable("TEMP") {
        total = BASELINE;
    }

    total
}

/// Top records by score. The sort is stable, so equal scores keep corpus
/// order.
pub fn top_matches<'a>(
    docs: &'a [ProfileDoc],
    question: &str,
    limit: usize,
) -> Vec<(&'a ProfileDoc, i32)> {
    let question_lower = question.to_lowercase();
    let years = years_in(&question_lower);

    let mut scored: Vec<(&ProfileDoc, i32)> = docs
        .iter()
        .map(|doc| (doc, score(doc, &question_lower, &years)))
        .filter(|(_, s)| *s > 0)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use test_utils::fixtures::{bgc_record, core_record};

    fn doc(file: &str, lat: f64, lon: f64) -> ProfileDoc {
        let record = core_record(file, lat, lon);
        ProfileDoc {
            date: argo_common::time::profile_date(&record.file),
            regions: argo_common::region::classify(lat, lon),
            json_path: PathBuf::from(format!("{}.json", file)),
            record,
        }
    }

    #[test]
    fn test_mentions_word_boundaries() {
        assert!(mentions("what is the ph here", "ph"));
        assert!(!mentions("phytoplankton bloom", "ph"));
        assert!(mentions("data from the bay of bengal region", "bay of bengal"));
    }

    #[test]
    fn test_years_in() {
        assert_eq!(years_in("salinity in 2024 vs 2025"), vec![2024, 2025]);
        assert_eq!(years_in("top 20250911 readings"), Vec::<i32>::new());
        assert_eq!(years_in("no years here"), Vec::<i32>::new());
    }

    #[test]
    fn test_year_bonus() {
        let doc = doc("20250911_prof.nc", 15.0, 65.0);
        let with_year = score(&doc, "temperature in 2025", &[2025]);
        let without_year = score(&doc, "temperature", &[]);
        assert_eq!(with_year - without_year, YEAR_BONUS);
    }

    #[test]
    fn test_region_bonus_requires_membership() {
        let arabian = doc("20250911_prof.nc", 15.0, 65.0);
        let bengal = doc("20250912_prof.nc", 15.0, 90.0);

        let q = "temperature in the arabian sea";
        assert!(score(&arabian, q, &[]) > score(&bengal, q, &[]));
    }

    #[test]
    fn test_measurement_bonus_requires_variable() {
        let plain = doc("20250911_prof.nc", 15.0, 65.0);
        let record = bgc_record("20250912_prof.nc", 15.0, 65.0, 250.0, 0.5);
        let with_bgc = ProfileDoc {
            date: None,
            regions: vec![],
            json_path: PathBuf::from("x.json"),
            record,
        };

        let q = "dissolved oxygen levels";
        assert_eq!(score(&plain, q, &[]), BASELINE);
        assert_eq!(score(&with_bgc, q, &[]), MEASUREMENT_BONUS);
    }

    #[test]
    fn test_baseline_for_temp_records() {
        let d = doc("20250911_prof.nc", 15.0, 65.0);
        assert_eq!(score(&d, "anything unrelated", &[]), BASELINE);
    }

    #[test]
    fn test_top_matches_stable_on_ties() {
        let docs = vec![
            doc("20250910_prof.nc", 15.0, 65.0),
            doc("20250911_prof.nc", 15.0, 65.0),
            doc("20250912_prof.nc", 15.0, 65.0),
        ];

        // Identical scores everywhere; corpus order must survive.
        let top = top_matches(&docs, "temperature", 3);
        let files: Vec<&str> = top.iter().map(|(d, _)| d.record.file.as_str()).collect();
        assert_eq!(
            files,
            vec!["20250910_prof.nc", "20250911_prof.nc", "20250912_prof.nc"]
        );
    }

    #[test]
    fn test_top_matches_limit() {
        let docs = vec![
            doc("20250910_prof.nc", 15.0, 65.0),
            doc("20250911_prof.nc", 15.0, 65.0),
        ];
        assert_eq!(top_matches(&docs, "temperature", 1).len(), 1);
    }

    #[test]
    fn test_irrelevant_record_filtered() {
        let record = profile_summary::SummaryRecord::new("20250911_prof.nc");
        let empty = ProfileDoc {
            date: None,
            regions: vec![],
            json_path: PathBuf::from("x.json"),
            record,
        };
        assert!(top_matches(&[empty], "temperature", 5).is_empty());
    }
}
