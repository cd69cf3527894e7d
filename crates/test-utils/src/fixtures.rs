//! Common test fixtures for pipeline tests.
//!
//! Pre-defined data representing common scenarios: a month listing page as
//! the archive serves it, summary records with core and BGC variables, and
//! deterministic embedding vectors.

use profile_summary::{SummaryRecord, VariableSample, VariableSummary};

/// A month index page with two well-formed profile files, one file with a
/// malformed date, and a non-profile link.
pub const MONTH_LISTING_HTML: &str = r#"
<html><head><title>Index of /geo/indian_ocean/2025/09</title></head><body>
<h1>Index of /geo/indian_ocean/2025/09</h1>
<table>
<tr><th>Name</th><th>Last modified</th><th>Size</th></tr>
<tr><td><a href="../">Parent Directory</a></td><td></td><td>-</td></tr>
<tr><td><a href="20250910_prof.nc">20250910_prof.nc</a></td><td>10-Sep-2025 08:12</td><td>2.1M</td></tr>
<tr><td><a href="20250911_prof.nc">20250911_prof.nc</a></td><td>11-Sep-2025 10:00</td><td>2.0M</td></tr>
<tr><td><a href="2025091x_prof.nc">2025091x_prof.nc</a></td><td>11-Sep-2025 10:05</td><td>1.9M</td></tr>
<tr><td><a href="argo_index.txt">argo_index.txt</a></td><td>11-Sep-2025 11:00</td><td>4K</td></tr>
</table>
</body></html>
"#;

/// Build a summary record with the core physical variables plus a position.
pub fn core_record(file: &str, lat: f64, lon: f64) -> SummaryRecord {
    let mut record = SummaryRecord::new(file);
    record.samples = vec![
        VariableSample {
            variable: "LATITUDE".to_string(),
            value: lat,
        },
        VariableSample {
            variable: "LONGITUDE".to_string(),
            value: lon,
        },
        VariableSample {
            variable: "TEMP".to_string(),
            value: 28.4,
        },
        VariableSample {
            variable: "PSAL".to_string(),
            value: 35.1,
        },
        VariableSample {
            variable: "PRES".to_string(),
            value: 4.2,
        },
    ];
    record.summaries = vec![
        VariableSummary {
            variable: "TEMP".to_string(),
            summary: "Sea water temperature near the surface.".to_string(),
        },
        VariableSummary {
            variable: "PSAL".to_string(),
            summary: "Practical salinity of the upper ocean.".to_string(),
        },
        VariableSummary {
            variable: "PRES".to_string(),
            summary: "Sea water pressure at the shallowest level.".to_string(),
        },
    ];
    record
}

/// Build a record that also carries BGC variables.
pub fn bgc_record(file: &str, lat: f64, lon: f64, doxy: f64, chla: f64) -> SummaryRecord {
    let mut record = core_record(file, lat, lon);
    record.samples.push(VariableSample {
        variable: "DOXY".to_string(),
        value: doxy,
    });
    record.samples.push(VariableSample {
        variable: "CHLA".to_string(),
        value: chla,
    });
    record.summaries.push(VariableSummary {
        variable: "DOXY".to_string(),
        summary: "Dissolved oxygen concentration.".to_string(),
    });
    record.summaries.push(VariableSummary {
        variable: "CHLA".to_string(),
        summary: "Chlorophyll-a concentration.".to_string(),
    });
    record
}

/// Unit vector along one axis, for index tests with exact distances.
pub fn unit_vector(dim: usize, axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[axis % dim] = 1.0;
    v
}
