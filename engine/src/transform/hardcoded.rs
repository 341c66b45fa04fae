//! Hardcoded Field Injector: constant columns from the provider schema.

use crate::logs::LogSink;
use crate::models::{CellValue, Dataset};
use crate::schema::HardcodedField;

const STEP: &str = "Apply Hardcoded Fields";
const SOURCE: &str = "HardcodedInjector";

pub fn apply_hardcoded_fields(mut data: Dataset, fields: &[HardcodedField], log: &mut LogSink) -> Dataset {
    if data.is_empty() || fields.is_empty() {
        log.info(STEP, SOURCE, "No data or fields", "No changes made");
        return data;
    }

    for field in fields {
        let name = field.field_name.trim();
        if name.is_empty() {
            log.warning(STEP, SOURCE, "Invalid field definition", "Missing field name");
            continue;
        }

        let value = CellValue::from_json(&field.value);
        let detail = format!("Added field: {} = {}", name, value.to_text());
        data.fill_column(name, value);
        log.success(STEP, SOURCE, detail, "Success");
    }

    data
}
