use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::payment_anomalies;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_anomalies)]
pub struct PaymentAnomalyEntity {
    pub id: i64,
    pub order_id: i64,
    pub external_id: String,
    pub anomaly_type: i32,
    pub notes: String,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payment_anomalies)]
pub struct InsertPaymentAnomalyEntity {
    pub order_id: i64,
    pub external_id: String,
    pub anomaly_type: i32,
    pub notes: String,
    pub status: i32,
}
