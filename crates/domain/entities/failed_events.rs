use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::failed_events;

// Dead-letter rows. Append-only; resolved out-of-band.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = failed_events)]
pub struct FailedEventEntity {
    pub id: i64,
    pub order_id: i64,
    pub external_id: String,
    pub failed_type: i32,
    pub notes: String,
    pub status: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = failed_events)]
pub struct InsertFailedEventEntity {
    pub order_id: i64,
    pub external_id: String,
    pub failed_type: i32,
    pub notes: String,
    pub status: i32,
}
