use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::infra::db::postgres::schema::payments;

/// One gateway invoice tied to one order. `status` is a catalog code, see
/// `payment_statuses`.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub external_id: String,
    pub amount: Decimal,
    pub status: i64,
    pub created_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub order_id: i64,
    pub user_id: i64,
    pub external_id: String,
    pub amount: Decimal,
    pub status: i64,
    pub expired_at: DateTime<Utc>,
}
