//! Context assembly for the chat model.

use crate::corpus::ProfileDoc;

/// System prompt restricting answers to the supplied context.
pub const ANSWER_SYSTEM_PROMPT: &str = "You are an expert oceanographer analyzing ARGO float \
data. Answer only from the provided data context; when the context does not cover the \
question, say so plainly. Be concise and cite the specific values given.";

/// One line per selected record, joined with " || ". Forwarded verbatim to
/// the model.
pub fn build_context(matches: &[(&ProfileDoc, i32)]) -> String {
    let mut parts = Vec::with_capacity(matches.len());

    for (doc, _) in matches {
        let date = doc
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown date".to_string());
        let regions = if doc.regions.is_empty() {
            "Open Ocean".to_string()
        } else {
            doc.regions.join(", ")
        };

        let mut line = format!("Profile {} ({}) from {}", doc.record.file, date, regions);
        for summary in &doc.record.summaries {
            match doc.record.sample(&summary.variable) {
                Some(value) => {
                    line.push_str(&format!(
                        " | {}={:.3}: {}",
                        summary.variable, value, summary.summary
                    ));
                }
                None => {
                    line.push_str(&format!(" | {}: {}", summary.variable, summary.summary));
                }
            }
        }
        parts.push(line);
    }

    parts.join(" || ")
}

/// User message carrying the context and question.
pub fn user_message(context: &str, question: &str) -> String {
    format!("DATA CONTEXT: {}\n\nUSER QUESTION: {}", context, question)
}

/// Answer substituted when the chat API fails.
pub fn fallback_answer(matched: usize) -> String {
    format!(
        "The model service is currently unavailable. {} matching profiles were found; \
please retry later.",
        matched
    )
}
