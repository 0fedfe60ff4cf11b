use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payment_statuses},
};
use domain::{
    entities::payment_statuses::PaymentStatusEntity,
    repositories::payment_statuses::PaymentStatusCatalogRepository,
};

pub struct PaymentStatusCatalogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentStatusCatalogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentStatusCatalogRepository for PaymentStatusCatalogPostgres {
    async fn list_statuses(&self) -> Result<Vec<PaymentStatusEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let statuses = payment_statuses::table
            .order(payment_statuses::id.asc())
            .select(PaymentStatusEntity::as_select())
            .load::<PaymentStatusEntity>(&mut conn)?;

        Ok(statuses)
    }
}
