//! BGC ecosystem-health analyzer.
//!
//! Aggregates sampled biogeochemical values per focus region from the JSON
//! summary tree, scores them against fixed healthy ranges, and writes one
//! assessment JSON per region per run (overwritten each run). Assessments
//! can additionally be pushed to object storage.

mod assess;
mod params;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use walkdir::WalkDir;

use argo_common::region::{classify, region};
use argo_store::{ObjectStorage, ObjectStorageConfig, StoragePath};
use profile_summary::SummaryRecord;

use assess::{assess_ecosystem, assess_parameter, EcosystemHealth};
use params::{BGC_PARAMETERS, FOCUS_REGIONS};

#[derive(Parser, Debug)]
#[command(name = "bgc-analyzer")]
#[command(about = "Biogeochemical ecosystem-health assessments over summary records")]
struct Args {
    /// Root of the JSON summary tree
    #[arg(long, default_value = "Datasetjson")]
    json_root: PathBuf,

    /// Directory for assessment output
    #[arg(long, default_value = "assessments")]
    out_dir: PathBuf,

    /// Also push assessments to object storage (configured via ARGO_S3_*)
    #[arg(long)]
    upload: bool,

    /// Object key prefix for uploaded assessments
    #[arg(long, default_value = "assessments/")]
    prefix: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// One region's written assessment record.
#[derive(Debug, Serialize)]
struct AssessmentRecord {
    assessment_id: String,
    region: String,
    ecosystem_type: String,
    location: LocationInfo,
    assessed_at: chrono::DateTime<Utc>,
    profiles_observed: usize,
    health: EcosystemHealth,
}

#[derive(Debug, Serialize)]
struct LocationInfo {
    lat: f64,
    lon: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting BGC analyzer");

    let records = load_records(&args.json_root)?;
    info!(count = records.len(), "Loaded summary records");

    let storage = if args.upload {
        // Missing bucket configuration is fatal when upload was requested.
        Some(ObjectStorage::new(&ObjectStorageConfig::from_env()?)?)
    } else {
        None
    };

    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .with_context(|| format!("Cannot create output dir {}", args.out_dir.display()))?;

    let date_tag = Utc::now().format("%Y%m%d").to_string();

    for &(region_name, ecosystem_type) in FOCUS_REGIONS {
        let assessment = assess_region(region_name, ecosystem_type, &records, &date_tag);

        info!(
            region = %region_name,
            score = assessment.health.overall_score,
            status = %assessment.health.status,
            profiles = assessment.profiles_observed,
            "Region assessed"
        );

        let body = serde_json::to_string_pretty(&assessment)?;
        let out_path = args.out_dir.join(format!("{}.json", region_name));
        tokio::fs::write(&out_path, &body)
            .await
            .with_context(|| format!("Cannot write {}", out_path.display()))?;

        if let Some(storage) = &storage {
            let key = StoragePath::assessment_object(&args.prefix, region_name, &date_tag);
            if let Err(e) = storage.put(&key, Bytes::from(body)).await {
                warn!(region = %region_name, error = %e, "Assessment upload failed");
            }
        }
    }

    info!(regions = FOCUS_REGIONS.len(), "BGC analysis complete");
    Ok(())
}

/// Load every readable summary record under the JSON root.
fn load_records(json_root: &Path) -> Result<Vec<SummaryRecord>> {
    let mut records = Vec::new();
    for entry in WalkDir::new(json_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
    {
        match SummaryRecord::load(entry.path()) {
            Ok(record) => records.push(record),
            Err(e) => warn!(path = %entry.path().display(), error = %e, "Skipping unreadable record"),
        }
    }
    Ok(records)
}

/// Records whose sampled position falls inside the region.
fn records_in_region<'a>(records: &'a [SummaryRecord], region_name: &str) -> Vec<&'a SummaryRecord> {
    records
        .iter()
        .filter(|record| {
            match (record.sample("LATITUDE"), record.sample("LONGITUDE")) {
                (Some(lat), Some(lon)) => classify(lat, lon).iter().any(|r| *r == region_name),
                _ => false,
            }
        })
        .collect()
}

/// Mean of the observed samples for one parameter, if any record carries it.
fn mean_sample(records: &[&SummaryRecord], code: &str) -> Option<f64> {
    let values: Vec<f64> = records.iter().filter_map(|r| r.sample(code)).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Build one region's assessment. Parameters without an observed value use
/// the healthy-range midpoint as a deterministic synthetic sample.
fn assess_region(
    region_name: &str,
    ecosystem_type: &str,
    records: &[SummaryRecord],
    date_tag: &str,
) -> AssessmentRecord {
    let observed = records_in_region(records, region_name);

    let mut parameter_scores = BTreeMap::new();
    for param in BGC_PARAMETERS {
        let (value, synthetic) = match mean_sample(&observed, param.code) {
            Some(mean) => (mean, false),
            None => {
                let (lo, hi) = param.healthy_range;
                ((lo + hi) / 2.0, true)
            }
        };
        parameter_scores.insert(
            param.code.to_string(),
            assess_parameter(param, value, synthetic),
        );
    }

    let (lat, lon) = region(region_name).map(|r| r.center()).unwrap_or((0.0, 0.0));

    AssessmentRecord {
        assessment_id: format!("bgc_{}_{}", region_name.to_lowercase(), date_tag),
        region: region_name.to_string(),
        ecosystem_type: ecosystem_type.to_string(),
        location: LocationInfo { lat, lon },
        assessed_at: Utc::now(),
        profiles_observed: observed.len(),
        health: assess_ecosystem(parameter_scores),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{bgc_record, core_record};

    #[test]
    fn test_records_in_region() {
        let records = vec![
            bgc_record("20250911_prof.nc", 15.0, 65.0, 250.0, 0.5),
            core_record("20250912_prof.nc", 15.0, 90.0),
        ];

        let arabian = records_in_region(&records, "Arabian_Sea");
        assert_eq!(arabian.len(), 1);
        assert_eq!(arabian[0].file, "20250911_prof.nc");

        let bengal = records_in_region(&records, "Bay_of_Bengal");
        assert_eq!(bengal.len(), 1);
        assert_eq!(bengal[0].file, "20250912_prof.nc");
    }

    #[test]
    fn test_mean_sample() {
        let a = bgc_record("a.nc", 15.0, 65.0, 200.0, 0.5);
        let b = bgc_record("b.nc", 16.0, 66.0, 300.0, 1.5);
        let refs: Vec<&SummaryRecord> = vec![&a, &b];

        assert_eq!(mean_sample(&refs, "DOXY"), Some(250.0));
        assert_eq!(mean_sample(&refs, "NITRATE"), None);
    }

    #[test]
    fn test_assess_region_with_observations() {
        let records = vec![bgc_record("20250911_prof.nc", 15.0, 65.0, 250.0, 0.5)];
        let assessment = assess_region("Arabian_Sea", "Upwelling system", &records, "20250911");

        assert_eq!(assessment.profiles_observed, 1);
        let doxy = &assessment.health.parameter_scores["DOXY"];
        assert!(!doxy.synthetic);
        assert_eq!(doxy.score, 100.0);
        // NITRATE was never observed, so its midpoint stands in.
        let nitrate = &assessment.health.parameter_scores["NITRATE"];
        assert!(nitrate.synthetic);
        assert_eq!(nitrate.value, 15.0);
    }

    #[test]
    fn test_assess_region_without_observations_is_all_synthetic() {
        let assessment = assess_region("Southern_Ocean", "Subtropical gyre", &[], "20250911");

        assert_eq!(assessment.profiles_observed, 0);
        assert!(assessment
            .health
            .parameter_scores
            .values()
            .all(|a| a.synthetic));
        // Every midpoint is inside its healthy range.
        assert_eq!(assessment.health.overall_score, 100.0);
    }
}
