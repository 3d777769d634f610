use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::transaction::{
    NewTransaction, Sort, StatusAggregate, TransactionFilter, TransactionPatch, TransactionRecord,
};

const COLUMNS: &str = "id, public_id, amount, status, date, description, currency, created_at, updated_at";

#[derive(Clone)]
pub struct TransactionStore {
    pool: SqlitePool,
}

impl TransactionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        public_id: &str,
        transaction: &NewTransaction,
    ) -> Result<TransactionRecord, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, TransactionRecord>(
            "INSERT INTO transactions \
             (public_id, amount, status, date, description, currency, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, public_id, amount, status, date, description, currency, created_at, updated_at",
        )
        .bind(public_id)
        .bind(transaction.amount)
        .bind(transaction.status)
        .bind(transaction.date)
        .bind(&transaction.description)
        .bind(&transaction.currency)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_public_id(
        &self,
        public_id: &str,
    ) -> Result<Option<TransactionRecord>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRecord>("SELECT * FROM transactions WHERE public_id = ?")
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_page(
        &self,
        filter: &TransactionFilter,
        sort: Sort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {COLUMNS} FROM transactions WHERE 1 = 1"
        ));
        push_filter(&mut query, filter);
        query.push(" ORDER BY ");
        query.push(sort.field.column());
        query.push(if sort.descending { " DESC" } else { " ASC" });
        query.push(" LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        query
            .build_query_as::<TransactionRecord>()
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count(&self, filter: &TransactionFilter) -> Result<i64, sqlx::Error> {
        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM transactions WHERE 1 = 1");
        push_filter(&mut query, filter);

        query.build_query_scalar::<i64>().fetch_one(&self.pool).await
    }

    /// Applies the patch and bumps `updated_at` in one statement. `None`
    /// means no row carried that public id.
    pub async fn update_by_public_id(
        &self,
        public_id: &str,
        patch: &TransactionPatch,
    ) -> Result<Option<TransactionRecord>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE transactions SET updated_at = ");
        query.push_bind(Utc::now());
        if let Some(amount) = patch.amount {
            query.push(", amount = ");
            query.push_bind(amount);
        }
        if let Some(status) = patch.status {
            query.push(", status = ");
            query.push_bind(status);
        }
        if let Some(date) = patch.date {
            query.push(", date = ");
            query.push_bind(date);
        }
        if let Some(description) = &patch.description {
            query.push(", description = ");
            query.push_bind(description.as_deref());
        }
        if let Some(currency) = &patch.currency {
            query.push(", currency = ");
            query.push_bind(currency.as_deref());
        }
        query.push(" WHERE public_id = ");
        query.push_bind(public_id);
        query.push(format!(" RETURNING {COLUMNS}"));

        query
            .build_query_as::<TransactionRecord>()
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete_by_public_id(&self, public_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM transactions WHERE public_id = ?")
            .bind(public_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn aggregate_by_status(&self) -> Result<Vec<StatusAggregate>, sqlx::Error> {
        sqlx::query_as::<_, StatusAggregate>(
            "SELECT status, COUNT(*) AS count, SUM(amount) AS total_amount, \
             MIN(amount) AS min_amount, MAX(amount) AS max_amount \
             FROM transactions GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &TransactionFilter) {
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status);
    }
    if let Some(min) = filter.amount_min {
        query.push(" AND amount >= ");
        query.push_bind(min);
    }
    if let Some(max) = filter.amount_max {
        query.push(" AND amount <= ");
        query.push_bind(max);
    }
    if let Some(from) = filter.date_from {
        query.push(" AND date >= ");
        query.push_bind(from);
    }
    if let Some(to) = filter.date_to {
        query.push(" AND date <= ");
        query.push_bind(to);
    }
}
