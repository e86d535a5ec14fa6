//! PostgreSQL implementation of the repository traits.

mod calendar;
mod chat;
mod notification;
mod shift;

use magjob_core::page::DEFAULT_SORT_FIELD;
use magjob_core::{PageError, PageRequest, Sort};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::AppError;

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps API sort fields to columns. The first column is the tie-breaker.
pub(crate) type SortColumns = &'static [(&'static str, &'static str)];

/// `ORDER BY` clause for `page`, rejecting fields outside `columns`.
pub(crate) fn order_by(page: &PageRequest, columns: SortColumns) -> Result<String, AppError> {
    let sort = page
        .sort
        .clone()
        .unwrap_or_else(|| Sort::new(DEFAULT_SORT_FIELD, true));
    let column = columns
        .iter()
        .find(|(field, _)| *field == sort.field)
        .map(|(_, column)| *column)
        .ok_or_else(|| PageError::UnknownSortField(sort.field.clone()))?;
    let direction = if sort.ascending() { "ASC" } else { "DESC" };
    let tie_breaker = columns.first().map(|(_, c)| *c).unwrap_or(column);
    Ok(format!("ORDER BY {} {}, {} ASC", column, direction, tie_breaker))
}

/// Row count as the page total.
pub(crate) fn total(count: i64) -> usize {
    usize::try_from(count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: SortColumns = &[("id", "id"), ("startTime", "start_time")];

    #[test]
    fn test_order_by_defaults_to_id() {
        let clause = order_by(&PageRequest::default(), COLUMNS).unwrap();
        assert_eq!(clause, "ORDER BY id ASC, id ASC");
    }

    #[test]
    fn test_order_by_maps_fields() {
        let page = PageRequest::default().sorted_by(Sort::new("startTime", false));
        let clause = order_by(&page, COLUMNS).unwrap();
        assert_eq!(clause, "ORDER BY start_time DESC, id ASC");
    }

    #[test]
    fn test_order_by_rejects_unknown_field() {
        let page = PageRequest::default().sorted_by(Sort::new("password", true));
        assert!(matches!(order_by(&page, COLUMNS), Err(AppError::BadRequest(_))));
    }
}
