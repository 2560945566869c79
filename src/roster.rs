//! Roster import: identifier extraction from raw spreadsheet-like lines,
//! heuristic name/email recovery, and the import run that feeds the
//! resolver and the linking engine.
//!
//! Source data is pasted from spreadsheets and is not schema-validated:
//! column order drifts, identifiers show up in whatever column had room,
//! and drive sharing links put an `@` where an email parser expects one.

use crate::creators;
use crate::db::Pool;
use crate::error::Result;
use crate::tags;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, instrument, warn};

static CID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"CID-\d+").expect("valid regex"));

/// Column values containing these fragments are hosting links, not emails,
/// even though sharing URLs carry an `@`.
const NON_EMAIL_FRAGMENTS: [&str; 2] = ["drive.google", "docs.google"];

const PLACEHOLDER_DOMAIN: &str = "placeholder.com";

/// Content identifiers found anywhere in the line: `CID-` plus exactly
/// four digits. Duplicates collapse, first-appearance order is kept.
pub fn extract_cids(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in CID_RE.find_iter(line) {
        let token = m.as_str();
        // A longer digit run is a different identifier space, not a CID.
        if token.len() != "CID-".len() + 4 {
            continue;
        }
        if !out.iter().any(|t| t == token) {
            out.push(token.to_string());
        }
    }
    out
}

/// One parsed roster row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub name: String,
    pub email: String,
    pub cids: Vec<String>,
}

/// Parse one raw line. Tab-delimited when tabs are present, comma-delimited
/// otherwise. Returns `None` for rows without a name — expected noise in
/// source data, not an error.
pub fn parse_line(line: &str) -> Option<RosterRow> {
    let cols: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split(',').collect()
    };

    let name = cols.first()?.trim();
    if name.is_empty() {
        return None;
    }

    let email = cols
        .iter()
        .map(|c| c.trim())
        .find(|c| c.contains('@') && !NON_EMAIL_FRAGMENTS.iter().any(|f| c.contains(f)))
        .map(str::to_string)
        .unwrap_or_else(|| placeholder_email(name));

    Some(RosterRow {
        name: name.to_string(),
        email,
        cids: extract_cids(line),
    })
}

/// Deterministic stand-in for rows that ship no usable email.
fn placeholder_email(name: &str) -> String {
    let local = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".");
    format!("{local}@{PLACEHOLDER_DOMAIN}")
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub rows_imported: usize,
    pub rows_skipped: usize,
    pub creatives_linked: u64,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    pub line: usize,
    pub message: String,
}

/// One import run over an in-memory batch of lines. Each row resolves its
/// creator, then links every extracted identifier. Row failures go into
/// the report; they never abort the run.
#[instrument(skip_all)]
pub async fn run_import(pool: &Pool, text: &str, concurrency: usize) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let Some(row) = parse_line(line) else {
            if !line.trim().is_empty() {
                report.rows_skipped += 1;
            }
            continue;
        };

        let creator = match creators::resolve(pool, &row.name, &row.email).await {
            Ok(c) => c,
            Err(err) => {
                warn!(line = line_no, ?err, "failed to resolve creator");
                report.failures.push(RowFailure {
                    line: line_no,
                    message: err.to_string(),
                });
                continue;
            }
        };
        report.rows_imported += 1;

        for cid in &row.cids {
            match tags::link_by_identifier(pool, creator.id, cid, concurrency).await {
                Ok(n) => report.creatives_linked += n,
                Err(err) => {
                    warn!(line = line_no, cid = %cid, ?err, "failed to link identifier");
                    report.failures.push(RowFailure {
                        line: line_no,
                        message: format!("{cid}: {err}"),
                    });
                }
            }
        }
    }

    info!(
        rows = report.rows_imported,
        skipped = report.rows_skipped,
        linked = report.creatives_linked,
        "import run finished"
    );
    Ok(report)
}
