//! Turns raw wire payloads into checked inputs, collecting every field
//! error instead of stopping at the first one.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::models::transaction::{
    CreateTransactionRequest, ListQuery, NewTransaction, Sort, SortField, TransactionFilter,
    TransactionListParams, TransactionPatch, TransactionStatus, UpdateTransactionRequest,
};
use crate::models::user::{LoginAttempt, LoginRequest, Registration, RegisterRequest};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn register(req: RegisterRequest) -> Result<Registration, Vec<FieldError>> {
    let mut errors = Vec::new();

    let email = match req.email.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("email", "email is required"));
            None
        }
        Some(raw) if !is_email(raw) => {
            errors.push(FieldError::new("email", "email must be a valid email address"));
            None
        }
        Some(raw) => Some(raw.to_string()),
    };

    let login = match req.login.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("login", "login is required"));
            None
        }
        Some(raw) if raw.chars().count() < 3 => {
            errors.push(FieldError::new("login", "login must be at least 3 characters"));
            None
        }
        Some(raw) => Some(raw.to_string()),
    };

    let password = match req.password.as_deref() {
        None | Some("") => {
            errors.push(FieldError::new("password", "password is required"));
            None
        }
        Some(raw) if raw.chars().count() < 6 => {
            errors.push(FieldError::new("password", "password must be at least 6 characters"));
            None
        }
        Some(raw) => Some(raw.to_string()),
    };

    match (email, login, password) {
        (Some(email), Some(login), Some(password)) => Ok(Registration {
            email,
            login,
            password,
        }),
        _ => Err(errors),
    }
}

pub fn login(req: LoginRequest) -> Result<LoginAttempt, Vec<FieldError>> {
    let mut errors = Vec::new();

    let email = match req.email.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("email", "email is required"));
            None
        }
        Some(raw) if !is_email(raw) => {
            errors.push(FieldError::new("email", "email must be a valid email address"));
            None
        }
        Some(raw) => Some(raw.to_string()),
    };

    let password = match req.password.as_deref() {
        None | Some("") => {
            errors.push(FieldError::new("password", "password is required"));
            None
        }
        Some(raw) => Some(raw.to_string()),
    };

    match (email, password) {
        (Some(email), Some(password)) => Ok(LoginAttempt { email, password }),
        _ => Err(errors),
    }
}

pub fn create(req: CreateTransactionRequest) -> Result<NewTransaction, Vec<FieldError>> {
    let mut errors = Vec::new();

    let amount = match req.amount {
        None => {
            errors.push(FieldError::new("amount", "amount is required"));
            None
        }
        Some(raw) if raw < 0.0 => {
            errors.push(FieldError::new("amount", "amount must not be negative"));
            None
        }
        Some(raw) => Some(raw),
    };

    let status = match req.status.as_deref() {
        None | Some("") => {
            errors.push(FieldError::new("status", "status is required"));
            None
        }
        Some(raw) => parse_status(raw, &mut errors),
    };

    let date = match req.date.as_deref() {
        None | Some("") => {
            errors.push(FieldError::new("date", "date is required"));
            None
        }
        Some(raw) => parse_date_field(raw, "date", &mut errors),
    };

    match (amount, status, date) {
        (Some(amount), Some(status), Some(date)) => Ok(NewTransaction {
            amount,
            status,
            date,
            description: req.description,
            currency: req.currency,
        }),
        _ => Err(errors),
    }
}

pub fn update(req: UpdateTransactionRequest) -> Result<TransactionPatch, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut patch = TransactionPatch::default();

    if let Some(amount) = req.amount {
        if amount < 0.0 {
            errors.push(FieldError::new("amount", "amount must not be negative"));
        } else {
            patch.amount = Some(amount);
        }
    }
    if let Some(raw) = req.status.as_deref() {
        patch.status = parse_status(raw, &mut errors);
    }
    if let Some(raw) = req.date.as_deref() {
        patch.date = parse_date_field(raw, "date", &mut errors);
    }
    patch.description = req.description;
    patch.currency = req.currency;

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}

pub fn list_query(params: TransactionListParams) -> Result<ListQuery, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut filter = TransactionFilter::default();

    if let Some(raw) = params.status.as_deref() {
        filter.status = parse_status(raw, &mut errors);
    }
    filter.amount_min = parse_amount_bound(params.amount_min.as_deref(), "amount_min", &mut errors);
    filter.amount_max = parse_amount_bound(params.amount_max.as_deref(), "amount_max", &mut errors);
    if let Some(raw) = params.date_from.as_deref() {
        filter.date_from = parse_date_field(raw, "date_from", &mut errors);
    }
    if let Some(raw) = params.date_to.as_deref() {
        filter.date_to = parse_date_field(raw, "date_to", &mut errors);
    }

    let page = parse_positive_int(params.page.as_deref(), "page", &mut errors);
    let limit = parse_positive_int(params.limit.as_deref(), "limit", &mut errors);

    let sort = match params.sort.as_deref() {
        None => None,
        Some(raw) => parse_sort(raw, &mut errors),
    };

    if errors.is_empty() {
        Ok(ListQuery {
            filter,
            page,
            limit,
            sort,
        })
    } else {
        Err(errors)
    }
}

fn parse_status(raw: &str, errors: &mut Vec<FieldError>) -> Option<TransactionStatus> {
    match TransactionStatus::parse(raw) {
        Some(status) => Some(status),
        None => {
            errors.push(FieldError::new(
                "status",
                "status must be one of: success, pending, failed",
            ));
            None
        }
    }
}

fn parse_sort(raw: &str, errors: &mut Vec<FieldError>) -> Option<Sort> {
    let (descending, field) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let field = match field {
        "date" => SortField::Date,
        "amount" => SortField::Amount,
        _ => {
            errors.push(FieldError::new(
                "sort",
                "sort must be one of: date, -date, amount, -amount",
            ));
            return None;
        }
    };
    Some(Sort { field, descending })
}

fn parse_amount_bound(
    raw: Option<&str>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    let raw = raw?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        Ok(value) if value.is_finite() => {
            errors.push(FieldError::new(field, format!("{field} must not be negative")));
            None
        }
        _ => {
            errors.push(FieldError::new(field, format!("{field} must be a number")));
            None
        }
    }
}

fn parse_positive_int(
    raw: Option<&str>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    let raw = raw?;
    match raw.parse::<i64>() {
        Ok(value) if value >= 1 => Some(value),
        Ok(_) => {
            errors.push(FieldError::new(field, format!("{field} must be at least 1")));
            None
        }
        Err(_) => {
            errors.push(FieldError::new(field, format!("{field} must be a number")));
            None
        }
    }
}

fn parse_date_field(
    raw: &str,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<DateTime<Utc>> {
    match parse_date(raw) {
        Some(date) => Some(date),
        None => {
            errors.push(FieldError::new(
                field,
                format!("{field} must be an ISO 8601 date string"),
            ));
            None
        }
    }
}

/// Accepts RFC 3339 timestamps, offset-less `YYYY-MM-DDTHH:MM:SS` datetimes
/// (read as UTC) and bare `YYYY-MM-DD` dates, which become midnight UTC.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn is_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !raw.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.len() >= 3
}
