use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::transaction::{
    ListQuery, NewTransaction, OverallStats, PaginatedTransactions, Sort, StatusStats,
    TransactionFilter, TransactionPatch, TransactionStatistics, TransactionView,
};
use crate::store::transactions::TransactionStore;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct TransactionService {
    store: TransactionStore,
}

impl TransactionService {
    pub fn new(store: TransactionStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: NewTransaction) -> Result<TransactionView, AppError> {
        let public_id = Uuid::new_v4().to_string();
        let record = self.store.insert(&public_id, &input).await?;
        Ok(record.into())
    }

    pub async fn list(&self, query: ListQuery) -> Result<PaginatedTransactions, AppError> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let sort = query.sort.unwrap_or_else(Sort::date_desc);
        self.page(query.filter, sort, page, limit).await
    }

    /// Unfiltered listing, newest first. Out-of-range paging inputs are
    /// clamped here instead of rejected.
    pub async fn list_all(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<PaginatedTransactions, AppError> {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        self.page(TransactionFilter::default(), Sort::date_desc(), page, limit)
            .await
    }

    async fn page(
        &self,
        filter: TransactionFilter,
        sort: Sort,
        page: i64,
        limit: i64,
    ) -> Result<PaginatedTransactions, AppError> {
        // Absurd page numbers saturate into an offset past the last row
        // rather than overflowing the multiplication.
        let offset = page.saturating_sub(1).saturating_mul(limit);
        // The page rows and the filtered count are independent reads.
        let (records, total) = tokio::try_join!(
            self.store.find_page(&filter, sort, limit, offset),
            self.store.count(&filter),
        )?;

        Ok(PaginatedTransactions {
            data: records.into_iter().map(Into::into).collect(),
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        })
    }

    pub async fn get(&self, public_id: &str) -> Result<TransactionView, AppError> {
        self.store
            .find_by_public_id(public_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| not_found(public_id))
    }

    pub async fn update(
        &self,
        public_id: &str,
        patch: TransactionPatch,
    ) -> Result<TransactionView, AppError> {
        self.store
            .update_by_public_id(public_id, &patch)
            .await?
            .map(Into::into)
            .ok_or_else(|| not_found(public_id))
    }

    pub async fn remove(&self, public_id: &str) -> Result<(), AppError> {
        let deleted = self.store.delete_by_public_id(public_id).await?;
        if deleted == 0 {
            return Err(not_found(public_id));
        }
        Ok(())
    }

    /// Folds the per-status aggregates into the overall block. An empty
    /// table reports zeros across the board.
    pub async fn statistics(&self) -> Result<TransactionStatistics, AppError> {
        let groups = self.store.aggregate_by_status().await?;

        let mut total = OverallStats::default();
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut by_status = BTreeMap::new();

        for group in groups {
            total.total_amount += group.total_amount;
            total.total_transactions += group.count;
            min = Some(min.map_or(group.min_amount, |m| m.min(group.min_amount)));
            max = Some(max.map_or(group.max_amount, |m| m.max(group.max_amount)));
            by_status.insert(
                group.status,
                StatusStats {
                    count: group.count,
                    total_amount: group.total_amount,
                },
            );
        }

        if total.total_transactions > 0 {
            total.average_amount = total.total_amount / total.total_transactions as f64;
        }
        total.min_amount = min.unwrap_or(0.0);
        total.max_amount = max.unwrap_or(0.0);

        Ok(TransactionStatistics { total, by_status })
    }
}

fn not_found(public_id: &str) -> AppError {
    AppError::NotFound(format!("transaction with id {public_id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::transaction::{SortField, TransactionStatus};
    use chrono::{DateTime, Utc};

    async fn service() -> TransactionService {
        TransactionService::new(TransactionStore::new(db::connect_test().await))
    }

    fn input(amount: f64, status: TransactionStatus, date: &str) -> NewTransaction {
        NewTransaction {
            amount,
            status,
            date: date.parse::<DateTime<Utc>>().unwrap(),
            description: None,
            currency: None,
        }
    }

    fn query(page: Option<i64>, limit: Option<i64>, sort: Option<Sort>) -> ListQuery {
        ListQuery {
            filter: TransactionFilter::default(),
            page,
            limit,
            sort,
        }
    }

    #[tokio::test]
    async fn create_assigns_a_unique_uuid_per_transaction() {
        let service = service().await;
        let first = service
            .create(input(1.0, TransactionStatus::Pending, "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        let second = service
            .create(input(2.0, TransactionStatus::Pending, "2024-01-02T00:00:00Z"))
            .await
            .unwrap();

        assert!(uuid::Uuid::parse_str(&first.id).is_ok());
        assert!(uuid::Uuid::parse_str(&second.id).is_ok());
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn create_then_get_round_trips_every_field() {
        let service = service().await;
        let mut new = input(12.5, TransactionStatus::Success, "2024-01-15T10:00:00Z");
        new.description = Some("groceries".to_string());
        new.currency = Some("USD".to_string());

        let created = service.create(new).await.unwrap();
        let fetched = service.get(&created.id).await.unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.amount, 12.5);
        assert_eq!(fetched.status, TransactionStatus::Success);
        assert_eq!(fetched.date, created.date);
        assert_eq!(fetched.description.as_deref(), Some("groceries"));
        assert_eq!(fetched.currency.as_deref(), Some("USD"));
    }

    #[tokio::test]
    async fn list_defaults_to_first_page_of_ten_newest_first() {
        let service = service().await;
        for day in 1..=12 {
            service
                .create(input(
                    day as f64,
                    TransactionStatus::Pending,
                    &format!("2024-01-{day:02}T00:00:00Z"),
                ))
                .await
                .unwrap();
        }

        let page = service.list(query(None, None, None)).await.unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.total, 12);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.data[0].amount, 12.0);
        assert_eq!(page.data[9].amount, 3.0);
    }

    #[tokio::test]
    async fn list_clamps_limit_to_one_hundred_and_echoes_it() {
        let service = service().await;
        service
            .create(input(1.0, TransactionStatus::Pending, "2024-01-01T00:00:00Z"))
            .await
            .unwrap();

        let page = service.list(query(None, Some(500), None)).await.unwrap();

        assert_eq!(page.limit, 100);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn clamped_limit_caps_the_page_size_itself() {
        let service = service().await;
        for n in 0..101 {
            service
                .create(input(n as f64, TransactionStatus::Pending, "2024-01-01T00:00:00Z"))
                .await
                .unwrap();
        }

        let page = service.list(query(None, Some(500), None)).await.unwrap();

        assert_eq!(page.limit, 100);
        assert_eq!(page.data.len(), 100);
        assert_eq!(page.total, 101);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn list_beyond_last_page_is_empty_but_counted() {
        let service = service().await;
        for day in 1..=3 {
            service
                .create(input(
                    day as f64,
                    TransactionStatus::Pending,
                    &format!("2024-01-{day:02}T00:00:00Z"),
                ))
                .await
                .unwrap();
        }

        let page = service.list(query(Some(5), Some(2), None)).await.unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 5);
    }

    #[tokio::test]
    async fn extreme_page_numbers_read_as_empty_pages() {
        let service = service().await;
        for day in 1..=3 {
            service
                .create(input(
                    day as f64,
                    TransactionStatus::Pending,
                    &format!("2024-01-{day:02}T00:00:00Z"),
                ))
                .await
                .unwrap();
        }

        let page = service
            .list(query(Some(i64::MAX), Some(100), None))
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.page, i64::MAX);
        assert_eq!(page.total_pages, 1);

        let all = service.list_all(Some(i64::MAX), Some(100)).await.unwrap();
        assert!(all.data.is_empty());
        assert_eq!(all.total, 3);
    }

    #[tokio::test]
    async fn amount_range_bounds_results_and_status_narrows_further() {
        let service = service().await;
        for (amount, status) in [
            (50.0, TransactionStatus::Success),
            (150.0, TransactionStatus::Success),
            (500.0, TransactionStatus::Pending),
            (1500.0, TransactionStatus::Success),
        ] {
            service
                .create(input(amount, status, "2024-01-01T00:00:00Z"))
                .await
                .unwrap();
        }

        let range = TransactionFilter {
            amount_min: Some(100.0),
            amount_max: Some(1000.0),
            ..Default::default()
        };
        let bounded = service
            .list(ListQuery {
                filter: range.clone(),
                page: None,
                limit: None,
                sort: None,
            })
            .await
            .unwrap();
        assert_eq!(bounded.total, 2);
        assert!(bounded.data.iter().all(|t| (100.0..=1000.0).contains(&t.amount)));

        let narrowed = service
            .list(ListQuery {
                filter: TransactionFilter {
                    status: Some(TransactionStatus::Success),
                    ..range
                },
                page: None,
                limit: None,
                sort: None,
            })
            .await
            .unwrap();
        assert_eq!(narrowed.total, 1);
        assert_eq!(narrowed.data[0].amount, 150.0);
    }

    #[tokio::test]
    async fn list_honors_ascending_amount_sort() {
        let service = service().await;
        for (amount, date) in [(30.0, "2024-01-01"), (10.0, "2024-01-02"), (20.0, "2024-01-03")] {
            service
                .create(input(
                    amount,
                    TransactionStatus::Pending,
                    &format!("{date}T00:00:00Z"),
                ))
                .await
                .unwrap();
        }

        let sort = Sort { field: SortField::Amount, descending: false };
        let page = service.list(query(None, None, Some(sort))).await.unwrap();

        let amounts: Vec<f64> = page.data.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![10.0, 20.0, 30.0]);
    }

    #[tokio::test]
    async fn list_all_clamps_out_of_range_paging() {
        let service = service().await;
        for day in 1..=3 {
            service
                .create(input(
                    day as f64,
                    TransactionStatus::Pending,
                    &format!("2024-01-{day:02}T00:00:00Z"),
                ))
                .await
                .unwrap();
        }

        let page = service.list_all(Some(-5), Some(0)).await.unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1);
        assert_eq!(page.total, 3);
        assert_eq!(page.data.len(), 1);
        // Newest first.
        assert_eq!(page.data[0].amount, 3.0);
    }

    #[tokio::test]
    async fn update_merges_patch_into_existing_row() {
        let service = service().await;
        let created = service
            .create(input(10.0, TransactionStatus::Pending, "2024-01-01T00:00:00Z"))
            .await
            .unwrap();

        let patch = TransactionPatch {
            amount: Some(99.5),
            currency: Some(Some("EUR".to_string())),
            ..Default::default()
        };
        let updated = service.update(&created.id, patch).await.unwrap();

        assert_eq!(updated.amount, 99.5);
        assert_eq!(updated.currency.as_deref(), Some("EUR"));
        assert_eq!(updated.status, TransactionStatus::Pending);
        assert_eq!(updated.date, created.date);
    }

    #[tokio::test]
    async fn missing_ids_surface_as_not_found() {
        let service = service().await;

        assert!(matches!(service.get("ghost").await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.update("ghost", TransactionPatch::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(service.remove("ghost").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn remove_deletes_exactly_once() {
        let service = service().await;
        let created = service
            .create(input(1.0, TransactionStatus::Pending, "2024-01-01T00:00:00Z"))
            .await
            .unwrap();

        service.remove(&created.id).await.unwrap();
        assert!(matches!(service.remove(&created.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.get(&created.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn statistics_of_empty_table_are_all_zero() {
        let service = service().await;
        let stats = service.statistics().await.unwrap();

        assert_eq!(stats.total, OverallStats::default());
        assert!(stats.by_status.is_empty());
    }

    #[tokio::test]
    async fn statistics_fold_overall_and_per_status_blocks() {
        let service = service().await;
        for (amount, status) in [
            (10.0, TransactionStatus::Success),
            (30.0, TransactionStatus::Success),
            (5.0, TransactionStatus::Failed),
        ] {
            service
                .create(input(amount, status, "2024-01-01T00:00:00Z"))
                .await
                .unwrap();
        }

        let stats = service.statistics().await.unwrap();

        assert_eq!(stats.total.total_transactions, 3);
        assert_eq!(stats.total.total_amount, 45.0);
        assert_eq!(stats.total.average_amount, 15.0);
        assert_eq!(stats.total.min_amount, 5.0);
        assert_eq!(stats.total.max_amount, 30.0);

        assert_eq!(stats.by_status.len(), 2);
        let success = &stats.by_status[&TransactionStatus::Success];
        assert_eq!(success.count, 2);
        assert_eq!(success.total_amount, 40.0);
        let failed = &stats.by_status[&TransactionStatus::Failed];
        assert_eq!(failed.count, 1);
        assert_eq!(failed.total_amount, 5.0);
    }
}
