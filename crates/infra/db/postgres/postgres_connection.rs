use std::time::Duration;

use anyhow::{Context, Result};
use diesel::{
    PgConnection,
    r2d2::{ConnectionManager, Pool, PooledConnection},
};

pub type PgPoolSquad = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Checkout wait. A stuck pool surfaces as an ordinary error instead of
/// blocking a scheduler loop.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

pub fn establish_connection(database_url: &str) -> Result<PgPoolSquad> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .connection_timeout(CONNECTION_TIMEOUT)
        .build(manager)
        .context("failed to build postgres connection pool")?;
    Ok(pool)
}
