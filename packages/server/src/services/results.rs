use std::collections::HashMap;

use chrono::Utc;
use common::{EventStatus, ResultStatus};
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};

use crate::entity::{event, race_result, registration};
use crate::error::AppError;
use crate::models::results::ImportSummary;

const BIB_HEADERS: &[&str] = &["bibNumber", "bib", "numero"];
const POSITION_HEADERS: &[&str] = &["position", "posicao"];
const CATEGORY_POSITION_HEADERS: &[&str] = &["categoryPosition", "posicaoCategoria"];
const TIME_HEADERS: &[&str] = &["time", "tempo"];
const PACE_HEADERS: &[&str] = &["pace", "ritmo"];
const STATUS_HEADERS: &[&str] = &["status"];
/// Candidate separators, in the order they are tried.
const DELIMITERS: &[u8] = b",;\t|";

/// One usable line of a results file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// 1-based line in the file, header included.
    pub line: u64,
    pub bib_number: String,
    pub position: Option<i32>,
    pub category_position: Option<i32>,
    pub time: Option<String>,
    pub pace: Option<String>,
    pub status: ResultStatus,
}

/// Rows that parsed, plus one message per row that did not.
#[derive(Debug, Default)]
pub struct ParsedResults {
    pub rows: Vec<ResultRow>,
    pub errors: Vec<String>,
}

#[derive(Default)]
struct Columns {
    bib: Option<usize>,
    position: Option<usize>,
    category_position: Option<usize>,
    time: Option<usize>,
    pace: Option<usize>,
    status: Option<usize>,
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    // Earlier aliases win, matching the precedence of the documented header names.
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(alias))
    })
}

fn cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Pick the separator whose header row contains a bib column.
///
/// Falls back to a comma, which then fails the missing-column check.
fn sniff_delimiter(data: &[u8]) -> u8 {
    DELIMITERS
        .iter()
        .copied()
        .find(|&delimiter| {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .trim(csv::Trim::All)
                .from_reader(data);
            reader
                .headers()
                .is_ok_and(|headers| find_column(headers, BIB_HEADERS).is_some())
        })
        .unwrap_or(b',')
}

/// Parse a delimited results file. Comma, semicolon, tab and pipe
/// separators are detected from the header row.
///
/// Only a missing bib column or unreadable CSV fails the whole file. Bad
/// rows are reported in [`ParsedResults::errors`] and skipped. Positions
/// that are not integers are stored as empty.
pub fn parse_results_csv(data: &[u8]) -> Result<ParsedResults, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(data))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("Unreadable results file: {e}")))?
        .clone();
    let columns = Columns {
        bib: find_column(&headers, BIB_HEADERS),
        position: find_column(&headers, POSITION_HEADERS),
        category_position: find_column(&headers, CATEGORY_POSITION_HEADERS),
        time: find_column(&headers, TIME_HEADERS),
        pace: find_column(&headers, PACE_HEADERS),
        status: find_column(&headers, STATUS_HEADERS),
    };
    if columns.bib.is_none() {
        return Err(AppError::Validation(format!(
            "Results file needs a bib column ({})",
            BIB_HEADERS.join(", ")
        )));
    }

    let mut parsed = ParsedResults::default();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                parsed.errors.push(format!("Line {line}: {e}"));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let Some(bib) = cell(&record, columns.bib) else {
            parsed.errors.push(format!("Line {line}: missing bib number"));
            continue;
        };
        let status = match cell(&record, columns.status) {
            None => ResultStatus::Completed,
            Some(raw) => match raw.to_ascii_uppercase().parse::<ResultStatus>() {
                Ok(s) => s,
                Err(e) => {
                    parsed.errors.push(format!("Line {line}: {e}"));
                    continue;
                }
            },
        };

        parsed.rows.push(ResultRow {
            line,
            bib_number: bib.to_string(),
            position: cell(&record, columns.position).and_then(|v| v.parse().ok()),
            category_position: cell(&record, columns.category_position)
                .and_then(|v| v.parse().ok()),
            time: cell(&record, columns.time).map(str::to_string),
            pace: cell(&record, columns.pace).map(str::to_string),
            status,
        });
    }
    Ok(parsed)
}

pub struct ResultsService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ResultsService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Upsert one result per row, keyed by the registration owning the bib,
    /// then mark the event `COMPLETED`. Unknown bibs are reported, not fatal.
    pub async fn import(
        &self,
        event_id: i32,
        parsed: ParsedResults,
    ) -> Result<ImportSummary, AppError> {
        let bibs: HashMap<String, i32> = registration::Entity::find()
            .filter(registration::Column::EventId.eq(event_id))
            .filter(registration::Column::BibNumber.is_not_null())
            .all(self.conn)
            .await?
            .into_iter()
            .filter_map(|r| r.bib_number.map(|bib| (bib, r.id)))
            .collect();

        let mut errors = parsed.errors;
        let (mut created, mut updated) = (0u64, 0u64);
        let now = Utc::now();

        for row in parsed.rows {
            let Some(&registration_id) = bibs.get(&row.bib_number) else {
                errors.push(format!(
                    "Line {}: bib {} not found",
                    row.line, row.bib_number
                ));
                continue;
            };

            let existing = race_result::Entity::find()
                .filter(race_result::Column::RegistrationId.eq(registration_id))
                .one(self.conn)
                .await?;

            match existing {
                Some(model) => {
                    let mut active: race_result::ActiveModel = model.into();
                    active.position = Set(row.position);
                    active.category_position = Set(row.category_position);
                    active.time = Set(row.time);
                    active.pace = Set(row.pace);
                    active.status = Set(row.status);
                    active.updated_at = Set(now);
                    active.update(self.conn).await?;
                    updated += 1;
                }
                None => {
                    race_result::ActiveModel {
                        registration_id: Set(registration_id),
                        position: Set(row.position),
                        category_position: Set(row.category_position),
                        time: Set(row.time),
                        pace: Set(row.pace),
                        status: Set(row.status),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(self.conn)
                    .await?;
                    created += 1;
                }
            }
        }

        event::Entity::update_many()
            .col_expr(event::Column::Status, Expr::value(EventStatus::Completed.as_str()))
            .col_expr(event::Column::UpdatedAt, Expr::value(now))
            .filter(event::Column::Id.eq(event_id))
            .exec(self.conn)
            .await?;

        tracing::info!(
            event_id,
            created,
            updated,
            rejected = errors.len(),
            "Results import finished"
        );

        Ok(ImportSummary {
            created,
            updated,
            total: created + updated,
            errors: (!errors.is_empty()).then_some(errors),
        })
    }
}
