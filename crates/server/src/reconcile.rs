//! Reconciliation of confirmed event drafts into the relational store.
//!
//! Saving is deliberately tolerant: the idol is resolved (or created) once
//! up front, then every draft is processed independently. A failure while
//! writing one event, one of its deadlines, or its user link is logged and
//! the batch moves on; only empty input or an idol-resolution failure
//! aborts the whole request. The returned count reflects drafts whose
//! event row was actually created.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::warn;
use uuid::Uuid;

use favea_core::EventDraft;

use crate::error::ApiError;
use crate::store::{EventStore, NewDeadline, NewEvent};

/// Result of one save batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Number of drafts that reached event creation successfully.
    pub saved_count: usize,
}

/// Parses the ISO-8601-ish timestamps the model emits.
///
/// Accepts full RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (assumed UTC), or a
/// bare date (midnight UTC). Anything else is unusable.
fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(dt);
    }
    let datetime_format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(dt) = PrimitiveDateTime::parse(value, datetime_format) {
        return Some(dt.assume_utc());
    }
    let date_format = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(value, date_format) {
        return Some(date.midnight().assume_utc());
    }
    None
}

/// Persists a user-confirmed batch of event drafts.
///
/// The persisted events carry `is_draft = false`: reaching this function
/// means a human reviewed and confirmed the drafts.
pub async fn save_drafts(
    store: &dyn EventStore,
    user_id: Uuid,
    idol_name: &str,
    events: &[EventDraft],
) -> Result<SaveOutcome, ApiError> {
    if idol_name.trim().is_empty() {
        return Err(ApiError::invalid_input("idol name is required"));
    }
    if events.is_empty() {
        return Err(ApiError::invalid_input("no events to save"));
    }

    let idol = match store.find_idol_by_name(idol_name).await {
        Ok(Some(idol)) => idol,
        Ok(None) => store.create_idol(idol_name).await.map_err(|err| {
            warn!(idol = idol_name, error = %err, "failed to create idol");
            ApiError::internal()
        })?,
        Err(err) => {
            warn!(idol = idol_name, error = %err, "idol lookup failed");
            return Err(ApiError::internal());
        }
    };

    let mut saved_count = 0usize;

    for draft in events {
        let event_date = draft.event_date.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!(title = %draft.title, value = raw, "unparsable event date, storing none");
            }
            parsed
        });

        let new_event = NewEvent {
            idol_id: idol.id,
            title: draft.title.clone(),
            event_date,
            venue: draft.venue.clone(),
            source_url: draft.source_url.clone(),
            is_draft: false,
            created_by: user_id,
        };

        let event = match store.create_event(&new_event).await {
            Ok(event) => event,
            Err(err) => {
                warn!(title = %draft.title, error = %err, "failed to create event, skipping draft");
                continue;
            }
        };
        saved_count += 1;

        for deadline in &draft.deadlines {
            let Some(end_at) = parse_timestamp(&deadline.end_at) else {
                warn!(
                    event_id = %event.id,
                    value = %deadline.end_at,
                    "unparsable deadline end, skipping deadline"
                );
                continue;
            };
            let start_at = deadline.start_at.as_deref().and_then(parse_timestamp);

            let new_deadline = NewDeadline {
                event_id: event.id,
                deadline_type: deadline.deadline_type.as_str().to_string(),
                start_at,
                end_at,
                description: deadline.description.clone(),
            };
            if let Err(err) = store.create_deadline(&new_deadline).await {
                warn!(event_id = %event.id, error = %err, "failed to create deadline");
            }
        }

        if let Err(err) = store.create_user_event_link(user_id, event.id).await {
            warn!(event_id = %event.id, error = %err, "failed to link event to user");
        }
    }

    Ok(SaveOutcome { saved_count })
}
