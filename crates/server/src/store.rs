//! Typed repository over the relational store.
//!
//! The save pipeline talks to the database only through the [`EventStore`]
//! trait — one narrow method per table operation — so the reconciliation
//! logic stays decoupled from query building and is testable with an
//! in-memory double. [`PgStore`] is the Postgres implementation over a
//! deadpool connection pool.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Storage-layer failure. Per-record failures during save are logged and
/// skipped by the reconciler; only precondition failures abort a batch.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("database error: {0}")]
    Db(#[from] tokio_postgres::Error),
    /// Failure reported by a non-Postgres backend (test doubles included).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// An artist/group entity. Looked up by exact name, created lazily.
#[derive(Debug, Clone, Serialize)]
pub struct IdolRow {
    pub id: Uuid,
    pub name: String,
    pub tags: Vec<String>,
}

/// A persisted ticketed event.
#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub id: Uuid,
    pub idol_id: Uuid,
    pub title: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub event_date: Option<OffsetDateTime>,
    pub venue: Option<String>,
    pub source_url: Option<String>,
    pub is_draft: bool,
    pub created_by: Uuid,
}

/// Insert shape for [`EventRow`].
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub idol_id: Uuid,
    pub title: String,
    pub event_date: Option<OffsetDateTime>,
    pub venue: Option<String>,
    pub source_url: Option<String>,
    pub is_draft: bool,
    pub created_by: Uuid,
}

/// A persisted deadline window attached to an event.
#[derive(Debug, Clone, Serialize)]
pub struct DeadlineRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub deadline_type: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub end_at: OffsetDateTime,
    pub description: Option<String>,
}

/// Insert shape for [`DeadlineRow`].
#[derive(Debug, Clone)]
pub struct NewDeadline {
    pub event_id: Uuid,
    pub deadline_type: String,
    pub start_at: Option<OffsetDateTime>,
    pub end_at: OffsetDateTime,
    pub description: Option<String>,
}

/// Associates a user with an event they track.
#[derive(Debug, Clone, Serialize)]
pub struct UserEventRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: String,
}

/// One entry of the collection history: a user's link joined with its
/// event, idol name, and deadlines.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedEvent {
    pub link: UserEventRow,
    pub event: EventRow,
    pub idol_name: String,
    pub deadlines: Vec<DeadlineRow>,
}

/// Narrow table-level operations used by the save pipeline and history view.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Exact, case-sensitive name lookup.
    async fn find_idol_by_name(&self, name: &str) -> Result<Option<IdolRow>, StoreError>;

    /// Creates an idol with an empty tag set. On a name conflict the
    /// existing row is returned instead, which narrows (but does not fully
    /// close) the concurrent lookup-then-create race.
    async fn create_idol(&self, name: &str) -> Result<IdolRow, StoreError>;

    async fn create_event(&self, event: &NewEvent) -> Result<EventRow, StoreError>;

    async fn create_deadline(&self, deadline: &NewDeadline) -> Result<DeadlineRow, StoreError>;

    async fn create_user_event_link(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<UserEventRow, StoreError>;

    /// Newest-first collection history for one user.
    async fn list_user_events(&self, user_id: Uuid) -> Result<Vec<TrackedEvent>, StoreError>;
}

/// Postgres-backed [`EventStore`].
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn find_idol_by_name(&self, name: &str) -> Result<Option<IdolRow>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT id, name, tags FROM idols WHERE name = $1", &[&name])
            .await?;
        Ok(row.map(|r| IdolRow { id: r.get(0), name: r.get(1), tags: r.get(2) }))
    }

    async fn create_idol(&self, name: &str) -> Result<IdolRow, StoreError> {
        let client = self.pool.get().await?;
        let tags: Vec<String> = Vec::new();
        let row = client
            .query_one(
                "INSERT INTO idols (id, name, tags) VALUES ($1, $2, $3)
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                 RETURNING id, name, tags",
                &[&Uuid::new_v4(), &name, &tags],
            )
            .await?;
        Ok(IdolRow { id: row.get(0), name: row.get(1), tags: row.get(2) })
    }

    async fn create_event(&self, event: &NewEvent) -> Result<EventRow, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO events
                     (id, idol_id, title, event_date, venue, source_url, is_draft, created_by)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING id, idol_id, title, event_date, venue, source_url, is_draft, created_by",
                &[
                    &Uuid::new_v4(),
                    &event.idol_id,
                    &event.title,
                    &event.event_date,
                    &event.venue,
                    &event.source_url,
                    &event.is_draft,
                    &event.created_by,
                ],
            )
            .await?;
        Ok(event_row(&row))
    }

    async fn create_deadline(&self, deadline: &NewDeadline) -> Result<DeadlineRow, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO ticket_deadlines
                     (id, event_id, deadline_type, start_at, end_at, description)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING id, event_id, deadline_type, start_at, end_at, description",
                &[
                    &Uuid::new_v4(),
                    &deadline.event_id,
                    &deadline.deadline_type,
                    &deadline.start_at,
                    &deadline.end_at,
                    &deadline.description,
                ],
            )
            .await?;
        Ok(deadline_row(&row))
    }

    async fn create_user_event_link(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<UserEventRow, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO user_events (id, user_id, event_id, status)
                 VALUES ($1, $2, $3, 'not_applied')
                 RETURNING id, user_id, event_id, status",
                &[&Uuid::new_v4(), &user_id, &event_id],
            )
            .await?;
        Ok(UserEventRow {
            id: row.get(0),
            user_id: row.get(1),
            event_id: row.get(2),
            status: row.get(3),
        })
    }

    async fn list_user_events(&self, user_id: Uuid) -> Result<Vec<TrackedEvent>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT ue.id, ue.user_id, ue.event_id, ue.status,
                        e.id, e.idol_id, e.title, e.event_date, e.venue,
                        e.source_url, e.is_draft, e.created_by,
                        i.name
                 FROM user_events ue
                 JOIN events e ON e.id = ue.event_id
                 JOIN idols i ON i.id = e.idol_id
                 WHERE ue.user_id = $1
                 ORDER BY ue.created_at DESC",
                &[&user_id],
            )
            .await?;

        let mut tracked: Vec<TrackedEvent> = rows
            .iter()
            .map(|r| TrackedEvent {
                link: UserEventRow {
                    id: r.get(0),
                    user_id: r.get(1),
                    event_id: r.get(2),
                    status: r.get(3),
                },
                event: EventRow {
                    id: r.get(4),
                    idol_id: r.get(5),
                    title: r.get(6),
                    event_date: r.get(7),
                    venue: r.get(8),
                    source_url: r.get(9),
                    is_draft: r.get(10),
                    created_by: r.get(11),
                },
                idol_name: r.get(12),
                deadlines: Vec::new(),
            })
            .collect();

        if tracked.is_empty() {
            return Ok(tracked);
        }

        let event_ids: Vec<Uuid> = tracked.iter().map(|t| t.event.id).collect();
        let deadline_rows = client
            .query(
                "SELECT id, event_id, deadline_type, start_at, end_at, description
                 FROM ticket_deadlines
                 WHERE event_id = ANY($1)
                 ORDER BY end_at",
                &[&event_ids],
            )
            .await?;

        for row in &deadline_rows {
            let deadline = deadline_row(row);
            if let Some(entry) = tracked.iter_mut().find(|t| t.event.id == deadline.event_id) {
                entry.deadlines.push(deadline);
            }
        }

        Ok(tracked)
    }
}

fn event_row(row: &tokio_postgres::Row) -> EventRow {
    EventRow {
        id: row.get(0),
        idol_id: row.get(1),
        title: row.get(2),
        event_date: row.get(3),
        venue: row.get(4),
        source_url: row.get(5),
        is_draft: row.get(6),
        created_by: row.get(7),
    }
}

fn deadline_row(row: &tokio_postgres::Row) -> DeadlineRow {
    DeadlineRow {
        id: row.get(0),
        event_id: row.get(1),
        deadline_type: row.get(2),
        start_at: row.get(3),
        end_at: row.get(4),
        description: row.get(5),
    }
}
