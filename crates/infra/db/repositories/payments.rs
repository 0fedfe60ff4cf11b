use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    OptionalExtension, PgConnection, RunQueryDsl,
    connection::{AnsiTransactionManager, TransactionManager},
    insert_into,
    prelude::*,
    update,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::{PgPoolSquad, PgPooledConnection},
        schema::{failed_events, payment_anomalies, payments},
    },
};
use domain::{
    entities::{
        failed_events::InsertFailedEventEntity,
        payment_anomalies::InsertPaymentAnomalyEntity,
        payments::{InsertPaymentEntity, PaymentEntity},
    },
    repositories::payments::{PaymentLedgerTransaction, PaymentRepository},
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn begin_transaction(&self) -> Result<Box<dyn PaymentLedgerTransaction>> {
        let conn = Arc::clone(&self.db_pool).get()?;
        let tx = PaymentLedgerPgTransaction::begin(conn)?;
        Ok(Box::new(tx))
    }

    async fn is_already_paid(&self, order_id: i64, paid_status: i64) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let status = payments::table
            .filter(payments::order_id.eq(order_id))
            .select(payments::status)
            .order(payments::created_at.desc())
            .first::<i64>(&mut conn)
            .optional()?;

        Ok(status == Some(paid_status))
    }

    async fn find_payment_by_order_id(&self, order_id: i64) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let payment = payments::table
            .filter(payments::order_id.eq(order_id))
            .select(PaymentEntity::as_select())
            .order(payments::created_at.desc())
            .first::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(payment)
    }

    async fn get_payment_amount_by_order_id(&self, order_id: i64) -> Result<Decimal> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let amount = payments::table
            .filter(payments::order_id.eq(order_id))
            .select(payments::amount)
            .order(payments::created_at.desc())
            .first::<Decimal>(&mut conn)
            .optional()?
            .ok_or_else(|| anyhow!("payment for order {order_id} not found"))?;

        Ok(amount)
    }

    async fn save_payment(&self, payment: InsertPaymentEntity) -> Result<Option<i64>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let payment_id = insert_into(payments::table)
            .values(&payment)
            .on_conflict(payments::order_id)
            .do_nothing()
            .returning(payments::id)
            .get_result::<i64>(&mut conn)
            .optional()?;

        Ok(payment_id)
    }

    async fn list_payments_by_status(&self, status: i64) -> Result<Vec<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = payments::table
            .filter(payments::status.eq(status))
            .order(payments::created_at.asc())
            .select(PaymentEntity::as_select())
            .load::<PaymentEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_payments_expired_before(
        &self,
        status: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = payments::table
            .filter(payments::status.eq(status))
            .filter(payments::expired_at.lt(cutoff))
            .order(payments::created_at.asc())
            .select(PaymentEntity::as_select())
            .load::<PaymentEntity>(&mut conn)?;

        Ok(results)
    }

    async fn transition_status(&self, payment_id: i64, from: i64, to: i64) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(
            payments::table
                .filter(payments::id.eq(payment_id))
                .filter(payments::status.eq(from)),
        )
        .set((
            payments::status.eq(to),
            payments::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn save_payment_anomaly(&self, anomaly: InsertPaymentAnomalyEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let anomaly_id = insert_into(payment_anomalies::table)
            .values(&anomaly)
            .returning(payment_anomalies::id)
            .get_result::<i64>(&mut conn)?;

        Ok(anomaly_id)
    }
}

/// A transaction driven by hand so it can stay open across awaits (the
/// publish retries) instead of living inside a `conn.transaction` closure.
pub struct PaymentLedgerPgTransaction {
    conn: PgPooledConnection,
    open: bool,
}

impl PaymentLedgerPgTransaction {
    fn begin(mut conn: PgPooledConnection) -> Result<Self> {
        <AnsiTransactionManager as TransactionManager<PgConnection>>::begin_transaction(&mut *conn)
            .context("failed to begin payment ledger transaction")?;
        Ok(Self { conn, open: true })
    }

    fn ensure_open(&self) -> Result<()> {
        if !self.open {
            bail!("payment ledger transaction is already finished");
        }
        Ok(())
    }
}

impl PaymentLedgerTransaction for PaymentLedgerPgTransaction {
    fn update_status(&mut self, order_id: i64, status: i64, unless_status: i64) -> Result<usize> {
        self.ensure_open()?;

        let updated = update(
            payments::table
                .filter(payments::order_id.eq(order_id))
                .filter(payments::status.ne(unless_status)),
        )
        .set((
            payments::status.eq(status),
            payments::updated_at.eq(Utc::now()),
        ))
        .execute(&mut *self.conn)?;

        Ok(updated)
    }

    fn save_failed_event(&mut self, event: InsertFailedEventEntity) -> Result<i64> {
        self.ensure_open()?;

        let failed_event_id = insert_into(failed_events::table)
            .values(&event)
            .returning(failed_events::id)
            .get_result::<i64>(&mut *self.conn)?;

        Ok(failed_event_id)
    }

    fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.open = false;
        <AnsiTransactionManager as TransactionManager<PgConnection>>::commit_transaction(
            &mut *self.conn,
        )
        .context("failed to commit payment ledger transaction")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        <AnsiTransactionManager as TransactionManager<PgConnection>>::rollback_transaction(
            &mut *self.conn,
        )
        .context("failed to roll back payment ledger transaction")?;
        Ok(())
    }
}

impl Drop for PaymentLedgerPgTransaction {
    fn drop(&mut self) {
        if self.open {
            let rolled_back =
                <AnsiTransactionManager as TransactionManager<PgConnection>>::rollback_transaction(
                    &mut *self.conn,
                );
            if let Err(err) = rolled_back {
                warn!(
                    db_error = %err,
                    "payment_ledger: rollback on drop failed"
                );
            }
        }
    }
}
