use sqlx::PgPool;

/// Runs entity queries against the shared pool.
///
/// Each query is a plain struct with a `kanau::processor::Processor` impl on
/// this type, see [`crate::entities`].
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
