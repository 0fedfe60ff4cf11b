use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payment_requests},
};
use domain::{
    entities::payment_requests::{InsertPaymentRequestEntity, PaymentRequestEntity},
    repositories::payment_requests::PaymentRequestRepository,
    value_objects::enums::payment_request_statuses::PaymentRequestStatus,
};

pub struct PaymentRequestPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentRequestPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRequestRepository for PaymentRequestPostgres {
    async fn save_payment_request(&self, request: InsertPaymentRequestEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let request_id = insert_into(payment_requests::table)
            .values(&request)
            .returning(payment_requests::id)
            .get_result::<i64>(&mut conn)?;

        Ok(request_id)
    }

    async fn list_pending_payment_requests(&self) -> Result<Vec<PaymentRequestEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = payment_requests::table
            .filter(payment_requests::status.eq(PaymentRequestStatus::Pending.as_str()))
            .order(payment_requests::created_at.asc())
            .select(PaymentRequestEntity::as_select())
            .load::<PaymentRequestEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_retryable_failed_payment_requests(
        &self,
        max_retries: i32,
    ) -> Result<Vec<PaymentRequestEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = payment_requests::table
            .filter(payment_requests::status.eq(PaymentRequestStatus::Failed.as_str()))
            .filter(payment_requests::retry_count.lt(max_retries))
            .order(payment_requests::created_at.asc())
            .select(PaymentRequestEntity::as_select())
            .load::<PaymentRequestEntity>(&mut conn)?;

        Ok(results)
    }

    async fn mark_success(&self, request_id: i64) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(payment_requests::table.filter(payment_requests::id.eq(request_id)))
            .set((
                payment_requests::status.eq(PaymentRequestStatus::Success.as_str()),
                payment_requests::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_failed(&self, request_id: i64, notes: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Single statement so concurrent failures cannot lose an increment.
        update(payment_requests::table.filter(payment_requests::id.eq(request_id)))
            .set((
                payment_requests::status.eq(PaymentRequestStatus::Failed.as_str()),
                payment_requests::retry_count.eq(payment_requests::retry_count + 1),
                payment_requests::notes.eq(Some(notes)),
                payment_requests::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn reset_to_pending(&self, request_id: i64) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(
            payment_requests::table
                .filter(payment_requests::id.eq(request_id))
                .filter(payment_requests::status.eq(PaymentRequestStatus::Failed.as_str())),
        )
        .set((
            payment_requests::status.eq(PaymentRequestStatus::Pending.as_str()),
            payment_requests::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(())
    }
}
