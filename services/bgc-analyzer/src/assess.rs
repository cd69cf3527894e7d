//! Parameter and ecosystem health scoring.
//!
//! Scores are 0-100 per parameter: 100 inside the healthy range, fixed low
//! scores for critical states, otherwise scaled by distance from the range
//! with a floor of 30. The ecosystem score is the plain mean.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::params::BgcParameter;

/// Health score of one parameter value.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterAssessment {
    pub score: f64,
    pub status: String,
    pub value: f64,
    /// Whether the value was synthesized (healthy-range midpoint) because
    /// no observation covered this region.
    pub synthetic: bool,
    pub healthy_range: (f64, f64),
    pub units: &'static str,
    pub ecosystem_role: &'static str,
}

/// Overall ecosystem health for a region.
#[derive(Debug, Clone, Serialize)]
pub struct EcosystemHealth {
    pub overall_score: f64,
    pub status: String,
    pub parameter_scores: BTreeMap<String, ParameterAssessment>,
    pub recommendations: Vec<String>,
    pub parameters_assessed: usize,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score one parameter value against its healthy range.
pub fn assess_parameter(param: &BgcParameter, value: f64, synthetic: bool) -> ParameterAssessment {
    let (min_healthy, max_healthy) = param.healthy_range;

    let (score, status) = if value >= min_healthy && value <= max_healthy {
        (100.0, "Excellent".to_string())
    } else if param.code == "DOXY" && param.critical_low.map_or(false, |c| value < c) {
        (10.0, "Critical - Hypoxic".to_string())
    } else if param.code == "PH_IN_SITU_TOTAL" && param.critical_low.map_or(false, |c| value < c) {
        (15.0, "Critical - Acidified".to_string())
    } else if param.critical_high.map_or(false, |c| value > c) {
        (20.0, "Poor - Elevated".to_string())
    } else {
        // Distance from the healthy range, floored at 30.
        let score = if value < min_healthy && min_healthy > 0.0 {
            (100.0 - (min_healthy - value) / min_healthy * 100.0).max(30.0)
        } else if value > max_healthy && max_healthy > 0.0 {
            (100.0 - (value - max_healthy) / max_healthy * 100.0).max(30.0)
        } else {
            30.0
        };

        let status = if score >= 70.0 {
            "Good".to_string()
        } else if score >= 50.0 {
            "Fair".to_string()
        } else {
            "Poor".to_string()
        };

        (score, status)
    };

    ParameterAssessment {
        score: round1(score),
        status,
        value,
        synthetic,
        healthy_range: param.healthy_range,
        units: param.units,
        ecosystem_role: param.ecosystem_role,
    }
}

/// Status label for an overall score.
pub fn overall_status(score: f64) -> &'static str {
    if score >= 90.0 {
        "Excellent"
    } else if score >= 70.0 {
        "Good"
    } else if score >= 50.0 {
        "Fair"
    } else if score >= 30.0 {
        "Poor"
    } else {
        "Critical"
    }
}

/// Mean the parameter scores into an ecosystem assessment.
pub fn assess_ecosystem(parameter_scores: BTreeMap<String, ParameterAssessment>) -> EcosystemHealth {
    let count = parameter_scores.len();
    let overall = if count == 0 {
        0.0
    } else {
        parameter_scores.values().map(|a| a.score).sum::<f64>() / count as f64
    };
    let overall = round1(overall);

    let recommendations = recommendations(&parameter_scores, overall);

    EcosystemHealth {
        overall_score: overall,
        status: overall_status(overall).to_string(),
        parameters_assessed: count,
        parameter_scores,
        recommendations,
    }
}

/// Management recommendations derived from failing parameters.
fn recommendations(
    parameter_scores: &BTreeMap<String, ParameterAssessment>,
    overall: f64,
) -> Vec<String> {
    let mut out = Vec::new();

    for (code, assessment) in parameter_scores {
        if assessment.score >= 50.0 {
            continue;
        }
        let line = match code.as_str() {
            "DOXY" => "Monitor oxygen minimum zone extent; low dissolved oxygen stresses fish and benthic life.",
            "CHLA" => "Investigate elevated chlorophyll; possible bloom or eutrophication pressure.",
            "BBP700" => "Elevated particle backscatter; check for sediment plumes or bloom debris.",
            "PH_IN_SITU_TOTAL" => "Acidification signal; track carbonate chemistry and shell-forming species.",
            "NITRATE" => "Nutrient loading above healthy range; review river discharge and upwelling inputs.",
            _ => "Parameter outside its healthy range; increase observation frequency.",
        };
        out.push(line.to_string());
    }

    if overall < 50.0 {
        out.push(
            "Overall ecosystem health is degraded; prioritize this region for repeat BGC profiling."
                .to_string(),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::parameter;

    #[test]
    fn test_in_range_scores_100() {
        let doxy = parameter("DOXY").unwrap();
        let a = assess_parameter(doxy, 250.0, false);
        assert_eq!(a.score, 100.0);
        assert_eq!(a.status, "Excellent");
    }

    #[test]
    fn test_hypoxic_doxy() {
        let doxy = parameter("DOXY").unwrap();
        let a = assess_parameter(doxy, 50.0, false);
        assert_eq!(a.score, 10.0);
        assert_eq!(a.status, "Critical - Hypoxic");
    }

    #[test]
    fn test_acidified_ph() {
        let ph = parameter("PH_IN_SITU_TOTAL").unwrap();
        let a = assess_parameter(ph, 7.5, false);
        assert_eq!(a.score, 15.0);
        assert_eq!(a.status, "Critical - Acidified");
    }

    #[test]
    fn test_elevated_chla() {
        let chla = parameter("CHLA").unwrap();
        let a = assess_parameter(chla, 12.0, false);
        assert_eq!(a.score, 20.0);
        assert_eq!(a.status, "Poor - Elevated");
    }

    #[test]
    fn test_distance_scaled_below_range() {
        let doxy = parameter("DOXY").unwrap();
        // 150 is 25% below the 200 floor but above critical_low: 100 - 25 = 75.
        let a = assess_parameter(doxy, 150.0, false);
        assert_eq!(a.score, 75.0);
        assert_eq!(a.status, "Good");
    }

    #[test]
    fn test_distance_scaled_between_range_and_critical() {
        let ph = parameter("PH_IN_SITU_TOTAL").unwrap();
        // 7.75 is below the healthy floor but above critical_low, so the
        // distance scaling applies.
        let a = assess_parameter(ph, 7.75, false);
        assert!(a.score >= 30.0);
        assert!(a.score < 100.0);
    }

    #[test]
    fn test_overall_status_thresholds() {
        assert_eq!(overall_status(95.0), "Excellent");
        assert_eq!(overall_status(75.0), "Good");
        assert_eq!(overall_status(55.0), "Fair");
        assert_eq!(overall_status(35.0), "Poor");
        assert_eq!(overall_status(10.0), "Critical");
    }

    #[test]
    fn test_ecosystem_mean_and_recommendations() {
        let doxy = parameter("DOXY").unwrap();
        let chla = parameter("CHLA").unwrap();

        let mut scores = BTreeMap::new();
        scores.insert("DOXY".to_string(), assess_parameter(doxy, 50.0, false)); // 10
        scores.insert("CHLA".to_string(), assess_parameter(chla, 0.5, false)); // 100

        let health = assess_ecosystem(scores);
        assert_eq!(health.overall_score, 55.0);
        assert_eq!(health.status, "Fair");
        assert_eq!(health.parameters_assessed, 2);
        // The failing DOXY parameter yields a recommendation.
        assert!(health.recommendations.iter().any(|r| r.contains("oxygen")));
    }

    #[test]
    fn test_empty_assessment() {
        let health = assess_ecosystem(BTreeMap::new());
        assert_eq!(health.overall_score, 0.0);
        assert_eq!(health.status, "Critical");
        assert_eq!(health.parameters_assessed, 0);
    }
}
