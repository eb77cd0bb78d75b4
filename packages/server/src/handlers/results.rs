use std::collections::HashMap;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, race_result, registration, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::results::*;
use crate::models::shared::ApiResponse;
use crate::policy::Action;
use crate::services::results::{ResultsService, parse_results_csv};
use crate::state::AppState;
use crate::utils::lookup::find_event;

/// Body limit for the results upload route. Multipart framing gets some headroom.
pub fn upload_body_limit(max_upload_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_bytes + 16 * 1024)
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Results",
    operation_id = "uploadResults",
    summary = "Import race results from a CSV file",
    description = "Multipart form with a `file` field and `eventId` (or `event_id`). \
        Rows are matched to registrations by bib number and upserted in one transaction; \
        the event is then marked `COMPLETED`. Row-level problems are reported in `errors`.",
    request_body(content_type = "multipart/form-data", description = "`file` plus `eventId`"),
    responses(
        (status = 200, description = "Import summary", body = ApiResponse<ImportSummary>),
        (status = 400, description = "Bad file or form (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_results(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportSummary>>, AppError> {
    let max = state.config.results.max_upload_bytes;
    let mut file: Option<Vec<u8>> = None;
    let mut event_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                if bytes.len() > max {
                    return Err(AppError::Validation(format!(
                        "File exceeds the {max} byte limit"
                    )));
                }
                file = Some(bytes.to_vec());
            }
            Some("eventId" | "event_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read eventId: {e}")))?;
                event_id = Some(text);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let event_id: i32 = event_id
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| AppError::Validation("Missing 'eventId' field".into()))?
        .parse()
        .map_err(|_| AppError::Validation("eventId must be an integer".into()))?;

    let event = find_event(&state.db, event_id).await?;
    auth_user.authorize(Action::ManageEvent {
        organizer_id: event.organizer_id,
    })?;

    let parsed = parse_results_csv(&file)?;
    let txn = state.db.begin().await?;
    let summary = ResultsService::new(&txn).import(event.id, parsed).await?;
    txn.commit().await?;

    Ok(ApiResponse::ok(summary))
}

#[utoipa::path(
    get,
    path = "/{event_id}",
    tag = "Results",
    operation_id = "getEventResults",
    summary = "Results of an event",
    description = "Public. Ordered by overall position; rows without a position come last.",
    params(
        ("event_id" = i32, Path, description = "Event ID"),
        ResultsQuery,
    ),
    responses(
        (status = 200, description = "Results", body = ApiResponse<Vec<EventResultItem>>),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn get_event_results(
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ApiResponse<Vec<EventResultItem>>>, AppError> {
    find_event(&state.db, event_id).await?;

    let mut select = registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id));
    if let Some(category_id) = query.category_id {
        select = select.filter(registration::Column::CategoryId.eq(category_id));
    }
    let registrations: HashMap<i32, registration::Model> = select
        .all(&state.db)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();
    if registrations.is_empty() {
        return Ok(ApiResponse::ok(Vec::new()));
    }

    let results = race_result::Entity::find()
        .filter(race_result::Column::RegistrationId.is_in(registrations.keys().copied()))
        .all(&state.db)
        .await?;

    let user_ids: Vec<i32> = registrations.values().map(|r| r.user_id).collect();
    let names: HashMap<i32, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();
    let categories: HashMap<i32, String> = category::Entity::find()
        .filter(category::Column::EventId.eq(event_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut items: Vec<EventResultItem> = results
        .into_iter()
        .filter_map(|res| {
            let reg = registrations.get(&res.registration_id)?;
            Some(EventResultItem {
                position: res.position,
                category_position: res.category_position,
                time: res.time,
                pace: res.pace,
                status: res.status,
                bib_number: reg.bib_number.clone(),
                participant_name: names.get(&reg.user_id).cloned().unwrap_or_default(),
                category_id: reg.category_id,
                category_name: categories.get(&reg.category_id).cloned().unwrap_or_default(),
            })
        })
        .collect();
    items.sort_by_key(|i| {
        (
            i.position.is_none(),
            i.position,
            i.category_position.is_none(),
            i.category_position,
        )
    });

    Ok(ApiResponse::ok(items))
}
