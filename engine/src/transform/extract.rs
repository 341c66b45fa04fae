//! Header Text Extractor
//!
//! Pulls document-level values (periods, account names, dates) out of the
//! text found above the header row. Each value becomes a constant column.

use super::cleanup::{run_cleanup, CleanupStep};
use crate::error::ExpressionResult;
use crate::logs::LogSink;
use crate::models::{CellValue, Dataset};
use crate::schema::ExtractionRule;

const STEP: &str = "Extract Values";
const SOURCE: &str = "HeaderTextExtractor";
const RANGE_SEPARATOR: &str = " to ";

/// Text after the first occurrence of `delim`, or all of `text`.
fn after<'a>(text: &'a str, delim: &str) -> &'a str {
    if delim.is_empty() {
        return text;
    }
    text.split_once(delim).map(|(_, rest)| rest).unwrap_or(text)
}

/// Text before the first occurrence of `delim`, or all of `text`.
fn before<'a>(text: &'a str, delim: &str) -> &'a str {
    if delim.is_empty() {
        return text;
    }
    text.split_once(delim).map(|(head, _)| head).unwrap_or(text)
}

/// Raw value selected by the delimiters of a rule, before cleanup.
pub fn locate_value(text: &str, rule: &ExtractionRule) -> String {
    let remainder = after(text, &rule.start_delim);
    let remainder = match rule.sub_start_delim.as_deref() {
        Some(sub) => after(remainder, sub),
        None => remainder,
    };

    if rule.is_date_range {
        if let Some((start, end)) = remainder.split_once(RANGE_SEPARATOR) {
            let start = before(start, &rule.end_delim).trim();
            let end = before(end, &rule.end_delim).trim();
            let want_start = rule
                .return_part
                .as_deref()
                .is_some_and(|p| p.trim().eq_ignore_ascii_case("start"));
            return if want_start { start } else { end }.to_string();
        }
    }

    before(remainder, &rule.end_delim).trim().to_string()
}

/// Apply one rule: locate the value, then run its cleanup steps.
pub fn extract_value(text: &str, rule: &ExtractionRule) -> ExpressionResult<String> {
    run_cleanup(&locate_value(text, rule), &rule.cleanup_steps)
}

/// Run every rule and add the extracted values as constant columns.
pub fn apply_extractions(
    mut data: Dataset,
    pre_header_text: &str,
    rules: &[ExtractionRule],
    log: &mut LogSink,
) -> Dataset {
    if pre_header_text.is_empty() || rules.is_empty() {
        log.info(STEP, SOURCE, "No source text or field definitions", "No changes made");
        return data;
    }

    let mut extracted: Vec<(String, String)> = Vec::new();

    for rule in rules {
        let name = rule.field_name.trim();
        if name.is_empty() {
            log.warning(STEP, SOURCE, "Missing field name in definition", "Skipping");
            continue;
        }

        for step in rule.cleanup_steps.iter().filter(|s| **s == CleanupStep::Unknown) {
            log.warning(
                STEP,
                SOURCE,
                format!("Field: {}; Step: {}", name, step.name()),
                "Unknown cleanup step ignored",
            );
        }

        match extract_value(pre_header_text, rule) {
            Ok(value) => {
                log.success(STEP, SOURCE, format!("Field: {}; Value: {}", name, value), "Extracted");
                match extracted.iter_mut().find(|(n, _)| n == name) {
                    Some(slot) => slot.1 = value,
                    None => extracted.push((name.to_string(), value)),
                }
            }
            Err(err) => {
                log.error(STEP, SOURCE, format!("Error extracting field {}", name), err.to_string());
            }
        }
    }

    for (name, value) in &extracted {
        data.fill_column(name, CellValue::Text(value.clone()));
    }

    log.info(
        "Extract Values Summary",
        SOURCE,
        format!("Added {} extracted fields to data", extracted.len()),
        "Completed",
    );

    data
}
