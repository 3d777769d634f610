use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(Self::Success),
            "pending" => Some(Self::Pending),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Stored transaction row. `id` is the internal rowid and never serialized;
/// clients only ever see `public_id`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRecord {
    pub id: i64,
    pub public_id: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionView {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: record.public_id,
            amount: record.amount,
            status: record.status,
            date: record.date,
            description: record.description,
            currency: record.currency,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTransactionRequest {
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub currency: Option<String>,
}

/// Patch body. On `description` and `currency` an explicit JSON `null`
/// clears the stored value, while leaving the field out keeps it; the
/// double wrapping preserves that distinction through serde.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTransactionRequest {
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub currency: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Raw query-string parameters for the filtered listing. Everything arrives
/// as text; the validation layer turns it into a [`ListQuery`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionListParams {
    pub status: Option<String>,
    pub amount_min: Option<String>,
    pub amount_max: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAllParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Checked creation input.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: f64,
    pub status: TransactionStatus,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub currency: Option<String>,
}

/// Checked partial update. Absent fields are left untouched; `Some(None)`
/// on the nullable columns writes NULL.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub amount: Option<f64>,
    pub status: Option<TransactionStatus>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<Option<String>>,
    pub currency: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    Amount,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub descending: bool,
}

impl Sort {
    pub fn date_desc() -> Self {
        Self {
            field: SortField::Date,
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Checked listing query.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub filter: TransactionFilter,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<Sort>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedTransactions {
    pub data: Vec<TransactionView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_amount: f64,
    pub average_amount: f64,
    pub total_transactions: i64,
    pub min_amount: f64,
    pub max_amount: f64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusStats {
    pub count: i64,
    pub total_amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatistics {
    pub total: OverallStats,
    pub by_status: BTreeMap<TransactionStatus, StatusStats>,
}

/// One GROUP BY bucket from the statistics query.
#[derive(Debug, sqlx::FromRow)]
pub struct StatusAggregate {
    pub status: TransactionStatus,
    pub count: i64,
    pub total_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
}
