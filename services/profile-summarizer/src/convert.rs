//! NetCDF sampling and summary generation.
//!
//! Each data variable contributes one sampled value (the first element
//! along every dimension) and one model-generated two-line description.
//! A model outage substitutes the templated fallback text; conversion of a
//! file never aborts the run over the API.

use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::debug;

use llm_client::ChatClient;
use profile_summary::{VariableSample, VariableSummary};

/// System prompt for variable descriptions.
pub const SYSTEM_PROMPT: &str = "You are an oceanographer describing variables measured by \
ARGO profiling floats. Answer in exactly two lines of plain text.";

/// Fixed prompt template for one variable.
pub fn user_prompt(variable: &str, value: f64) -> String {
    format!(
        "Describe the variable {} with sampled value {} from an ARGO float profile. \
Reply in 2 lines.",
        variable, value
    )
}

/// Templated fallback used when the chat API fails.
pub fn fallback_summary(variable: &str, value: f64) -> String {
    format!(
        "{} sampled at {} (no model description available).",
        variable, value
    )
}

/// Take one sample value per variable: first-index selection along every
/// dimension. Non-numeric and empty variables are skipped.
pub fn sample_variables(path: &Path) -> Result<Vec<VariableSample>> {
    let file = netcdf::open(path).map_err(|e| anyhow!("Failed to open NetCDF: {}", e))?;

    let mut samples = Vec::new();
    for var in file.variables() {
        let name = var.name();
        let extents: Vec<std::ops::Range<usize>> = var.dimensions().iter().map(|_| 0..1).collect();

        match var.get_values::<f64, _>(extents.as_slice()) {
            Ok(values) if !values.is_empty() => samples.push(VariableSample {
                variable: name,
                value: values[0],
            }),
            Ok(_) => debug!(variable = %name, "Variable has no data, skipping"),
            Err(e) => {
                debug!(variable = %name, error = %e, "Non-numeric or unreadable variable, skipping")
            }
        }
    }

    Ok(samples)
}

/// Generate one description per sample, in sample order.
pub async fn summarize_samples(
    chat: &ChatClient,
    samples: &[VariableSample],
) -> Vec<VariableSummary> {
    let mut summaries = Vec::with_capacity(samples.len());
    for sample in samples {
        let text = chat
            .complete_or_fallback(
                SYSTEM_PROMPT,
                &user_prompt(&sample.variable, sample.value),
                fallback_summary(&sample.variable, sample.value),
            )
            .await;
        summaries.push(VariableSummary {
            variable: sample.variable.clone(),
            summary: text,
        });
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_names_variable_and_value() {
        let prompt = user_prompt("TEMP", 28.4);
        assert!(prompt.contains("TEMP"));
        assert!(prompt.contains("28.4"));
        assert!(prompt.contains("2 lines"));
    }

    #[test]
    fn test_fallback_summary_is_self_contained() {
        let text = fallback_summary("PSAL", 35.1);
        assert_eq!(text, "PSAL sampled at 35.1 (no model description available).");
    }
}
