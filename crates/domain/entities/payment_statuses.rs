use diesel::prelude::*;

use crate::infra::db::postgres::schema::payment_statuses;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_statuses)]
pub struct PaymentStatusEntity {
    pub id: i64,
    pub name: String,
}
