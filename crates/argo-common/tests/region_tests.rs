use argo_common::region::{classify, geographic_zone, grid_1deg, ocean_basin, region};
use argo_common::time::{date_folder_name, months_to_check, profile_date};
use chrono::NaiveDate;

#[test]
fn test_classify_arabian_sea() {
    let regions = classify(15.0, 65.0);
    assert!(regions.contains(&"Arabian_Sea"));
    assert!(regions.contains(&"Tropical_Indian"));
    assert!(regions.contains(&"Monsoon_Region"));
    assert!(!regions.contains(&"Bay_of_Bengal"));
}

#[test]
fn test_classify_bay_of_bengal() {
    let regions = classify(15.0, 90.0);
    assert!(regions.contains(&"Bay_of_Bengal"));
    assert!(!regions.contains(&"Arabian_Sea"));
}

#[test]
fn test_classify_southern_ocean() {
    let regions = classify(-55.0, 80.0);
    assert_eq!(regions, vec!["Southern_Ocean"]);
}

#[test]
fn test_classify_open_water_no_match() {
    assert!(classify(60.0, 10.0).is_empty());
}

#[test]
fn test_region_lookup() {
    let arabian = region("Arabian_Sea").unwrap();
    assert!(arabian.contains(10.0, 60.0));
    assert!(!arabian.contains(-10.0, 60.0));
    assert!(region("Atlantis").is_none());
}

#[test]
fn test_region_center() {
    let (lat, lon) = region("Arabian_Sea").unwrap().center();
    assert!((lat - 19.0).abs() < 1e-9);
    assert!((lon - 65.0).abs() < 1e-9);
}

#[test]
fn test_ocean_basin() {
    assert_eq!(ocean_basin(65.0), "Indian");
    assert_eq!(ocean_basin(10.0), "Atlantic");
    assert_eq!(ocean_basin(160.0), "Pacific");
}

#[test]
fn test_geographic_zone() {
    assert_eq!(geographic_zone(5.0), "Tropical");
    assert_eq!(geographic_zone(-30.0), "Subtropical");
    assert_eq!(geographic_zone(55.0), "Temperate");
}

#[test]
fn test_grid_reference() {
    assert_eq!(grid_1deg(15.7, 72.3), "N15E072");
    assert_eq!(grid_1deg(-8.2, 95.0), "S08E095");
    assert_eq!(grid_1deg(12.0, -45.5), "N12W045");
}

#[test]
fn test_profile_date_valid() {
    let date = profile_date("20250911_prof.nc").unwrap();
    assert_eq!(date, NaiveDate::from_ymd_opt(2025, 9, 11).unwrap());
}

#[test]
fn test_profile_date_malformed() {
    assert!(profile_date("2025091_prof.nc").is_none());
    assert!(profile_date("2025091a_prof.nc").is_none());
    assert!(profile_date("20251341_prof.nc").is_none());
    assert!(profile_date("20250911_meta.nc").is_none());
    assert!(profile_date("readme.txt").is_none());
}

#[test]
fn test_date_folder_name() {
    let date = NaiveDate::from_ymd_opt(2025, 9, 11).unwrap();
    assert_eq!(date_folder_name(date), "11sep2025");
}

#[test]
fn test_months_to_check_mid_month() {
    let today = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
    assert_eq!(months_to_check(today), vec![(2025, 9)]);
}

#[test]
fn test_months_to_check_early_month() {
    let today = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
    assert_eq!(months_to_check(today), vec![(2025, 9), (2025, 8)]);
}

#[test]
fn test_months_to_check_january_rollover() {
    let today = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
    assert_eq!(months_to_check(today), vec![(2026, 1), (2025, 12)]);
}
