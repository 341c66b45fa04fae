//! Synonym Resolver: rename provider columns to logical field names.

use crate::logs::LogSink;
use crate::models::Dataset;
use crate::schema::Synonym;

const STEP: &str = "Apply Synonyms";
const SOURCE: &str = "SynonymResolver";

/// A queued `source -> target` rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub column: usize,
    pub from: String,
    pub to: String,
}

/// Work out which columns to rename.
///
/// Matching is exact after trimming and case-folding. The first synonym
/// entry to claim a column wins; a column already carrying its logical name
/// is claimed without a rename. Renames that would duplicate a column name,
/// compared case-insensitively, are returned separately as conflicts.
pub fn plan_renames(columns: &[String], synonyms: &[Synonym]) -> (Vec<Rename>, Vec<Rename>) {
    let mut claimed = vec![false; columns.len()];
    let mut renames: Vec<Rename> = Vec::new();
    let mut conflicts: Vec<Rename> = Vec::new();

    for synonym in synonyms {
        let target = synonym.logical_field.trim();
        if target.is_empty() {
            continue;
        }

        for alt in &synonym.alternate_names {
            let alt = alt.trim().to_lowercase();
            if alt.is_empty() {
                continue;
            }

            for (idx, column) in columns.iter().enumerate() {
                if claimed[idx] || column.to_lowercase() != alt {
                    continue;
                }
                claimed[idx] = true;

                if column == target {
                    continue;
                }

                let rename = Rename {
                    column: idx,
                    from: column.clone(),
                    to: target.to_string(),
                };
                // Later stages lower-case column names, so names must differ ignoring case
                let folded = target.to_lowercase();
                let taken = renames.iter().any(|r| r.to.to_lowercase() == folded)
                    || columns
                        .iter()
                        .enumerate()
                        .any(|(i, c)| i != idx && c.to_lowercase() == folded);
                if taken {
                    conflicts.push(rename);
                } else {
                    renames.push(rename);
                }
            }
        }
    }

    (renames, conflicts)
}

/// Rename matching columns in one pass.
pub fn apply_synonyms(mut data: Dataset, synonyms: &[Synonym], log: &mut LogSink) -> Dataset {
    if data.is_empty() || synonyms.is_empty() {
        log.info(STEP, SOURCE, "No data or synonyms", "No changes made");
        return data;
    }

    let (renames, conflicts) = plan_renames(data.columns(), synonyms);

    for conflict in &conflicts {
        log.warning(
            STEP,
            SOURCE,
            format!("Skipped rename: {} to {}", conflict.from, conflict.to),
            "Target column already exists",
        );
    }

    if renames.is_empty() {
        log.info(STEP, SOURCE, "No matching columns found", "No changes made");
        return data;
    }

    for rename in &renames {
        data.rename_column(rename.column, rename.to.clone());
    }

    let from: Vec<&str> = renames.iter().map(|r| r.from.as_str()).collect();
    let to: Vec<&str> = renames.iter().map(|r| r.to.as_str()).collect();
    log.success(
        STEP,
        SOURCE,
        format!("Renamed columns: {} to {}", from.join(", "), to.join(", ")),
        "Success",
    );

    data
}
