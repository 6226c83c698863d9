//! CSV import/export of the disease taxonomy.
//!
//! Curators exchange taxonomy snapshots as UTF-8 CSV with a header row.
//! Column lookup is lenient (case-insensitive substring match on the
//! header), row handling mirrors the curation workflow: empty names are
//! skipped and counted, per-row failures are reported as `行 N` strings
//! with N matching the spreadsheet row number, and the whole batch commits
//! in one transaction.

use crate::discovery::terms::contains_japanese;
use crate::error::{RegistryError, Result};
use crate::registry::models::NewDisease;
use crate::registry::store::RegistryStore;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::info;

/// Outcome of a taxonomy import.
#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Parse CSV text into rows of fields. Quote-aware: handles embedded
/// commas, doubled quotes, and newlines inside quoted fields.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Serialize rows to CSV, quoting only fields that need it.
pub fn write_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row.iter().map(|f| escape_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn header_index(header: &[String], needles: &[&str]) -> Option<usize> {
    for needle in needles {
        if let Some(idx) = header.iter().position(|h| h.contains(needle)) {
            return Some(idx);
        }
    }
    None
}

fn field<'a>(row: &'a [String], idx: usize) -> &'a str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn optional_field(row: &[String], idx: Option<usize>) -> Option<String> {
    idx.map(|i| field(row, i))
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Import a taxonomy CSV. Rows upsert by NANDO identifier when present,
/// else by exact name. New rows are not searchable until classified or
/// flagged.
pub fn import_diseases(store: &mut RegistryStore, csv_text: &str) -> Result<ImportOutcome> {
    let rows = parse_csv(csv_text);
    let Some((header_row, data)) = rows.split_first() else {
        return Err(RegistryError::Validation(
            "CSVにヘッダー行がありません".to_string(),
        ));
    };
    let header: Vec<String> = header_row.iter().map(|h| h.trim().to_lowercase()).collect();

    let id_idx = header_index(&header, &["nando"]);
    let name_idx = header_index(&header, &["label", "疾患名", "name"]);
    let mut missing = Vec::new();
    if id_idx.is_none() {
        missing.push("NANDO");
    }
    if name_idx.is_none() {
        missing.push("label");
    }
    if !missing.is_empty() {
        return Err(RegistryError::Validation(format!(
            "必要なカラムが見つかりません: {}",
            missing.join(", ")
        )));
    }
    let (id_idx, name_idx) = (id_idx.unwrap(), name_idx.unwrap());
    let kana_idx = header_index(&header, &["kana", "ふりがな"]);
    let english_idx = header_index(&header, &["name_en", "english"]);
    let overview_idx = header_index(&header, &["overview", "概要"]);

    let mut batch: Vec<(usize, NewDisease)> = Vec::new();
    let mut skipped = 0usize;
    for (i, row) in data.iter().enumerate() {
        let name = field(row, name_idx);
        if name.is_empty() {
            skipped += 1;
            continue;
        }
        let external_id = Some(field(row, id_idx))
            .filter(|s| !s.is_empty())
            .map(String::from);
        let name_english = optional_field(row, english_idx).or_else(|| {
            if contains_japanese(name) {
                None
            } else {
                Some(name.to_string())
            }
        });
        batch.push((
            i,
            NewDisease {
                external_id,
                name: name.to_string(),
                name_kana: optional_field(row, kana_idx),
                name_english,
                overview: optional_field(row, overview_idx),
                ..Default::default()
            },
        ));
    }

    let outcome = store.upsert_imported(&batch)?;
    let errors = outcome
        .row_errors
        .iter()
        .map(|(i, reason)| format!("行 {}: {}", i + 2, reason))
        .collect();
    info!(
        imported = outcome.inserted,
        updated = outcome.updated,
        skipped,
        "taxonomy import finished"
    );
    Ok(ImportOutcome {
        imported: outcome.inserted,
        updated: outcome.updated,
        skipped,
        errors,
    })
}

/// Export the searchable-flag sheet: `NANDO,label,is_searchable` ordered by
/// identifier, rows without one last, by name.
pub fn export_searchable(store: &RegistryStore) -> Result<String> {
    let mut diseases = store.all_diseases()?;
    diseases.sort_by(|a, b| match (&a.external_id, &b.external_id) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });

    let mut rows = vec![vec![
        "NANDO".to_string(),
        "label".to_string(),
        "is_searchable".to_string(),
    ]];
    for d in diseases {
        rows.push(vec![
            d.external_id.unwrap_or_default(),
            d.name,
            if d.is_searchable { "1" } else { "0" }.to_string(),
        ]);
    }
    Ok(write_csv(&rows))
}

/// Re-import a searchable-flag sheet. Matches by identifier first, else by
/// exact name; touches the flag only; unmatched rows are silently skipped.
/// Returns the count of rows updated.
pub fn import_searchable(store: &mut RegistryStore, csv_text: &str) -> Result<usize> {
    let rows = parse_csv(csv_text);
    let Some((header_row, data)) = rows.split_first() else {
        return Err(RegistryError::Validation(
            "CSVにヘッダー行がありません".to_string(),
        ));
    };
    let header: Vec<String> = header_row.iter().map(|h| h.trim().to_lowercase()).collect();

    let id_idx = header_index(&header, &["nando"]);
    let name_idx = header_index(&header, &["label", "疾患名", "name"]);
    let Some(flag_idx) = header_index(&header, &["searchable"]) else {
        return Err(RegistryError::Validation(
            "必要なカラムが見つかりません: is_searchable".to_string(),
        ));
    };
    if id_idx.is_none() && name_idx.is_none() {
        return Err(RegistryError::Validation(
            "必要なカラムが見つかりません: NANDO, label".to_string(),
        ));
    }

    let mut updates: Vec<(i64, bool)> = Vec::new();
    for row in data {
        let flag_raw = field(row, flag_idx);
        let flag = flag_raw == "1" || flag_raw.eq_ignore_ascii_case("true");

        let by_id = id_idx
            .map(|i| field(row, i))
            .filter(|s| !s.is_empty())
            .map(|ext| store.get_disease_by_external_id(ext))
            .transpose()?
            .flatten();
        let matched = match by_id {
            Some(d) => Some(d),
            None => name_idx
                .map(|i| field(row, i))
                .filter(|s| !s.is_empty())
                .map(|name| store.get_disease_by_name(name))
                .transpose()?
                .flatten(),
        };
        if let Some(disease) = matched {
            updates.push((disease.id, flag));
        }
    }
    let updated = store.set_searchable_batch(&updates)?;
    info!(updated, "searchable flags imported");
    Ok(updated)
}
