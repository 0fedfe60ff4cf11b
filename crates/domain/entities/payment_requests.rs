use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::infra::db::postgres::schema::payment_requests;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_requests)]
pub struct PaymentRequestEntity {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub payer_email: Option<String>,
    pub status: String,
    pub retry_count: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payment_requests)]
pub struct InsertPaymentRequestEntity {
    pub order_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub payer_email: Option<String>,
    pub status: String,
    pub retry_count: i32,
    pub notes: Option<String>,
}
