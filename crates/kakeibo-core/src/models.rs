//! Domain models for Kakeibo

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Exchange rate applied when no explicit rate is supplied (TWD -> JPY).
pub const DEFAULT_EXCHANGE_RATE: f64 = 4.5;

/// Default threshold above which a purchase counts as expensive (JPY).
pub const EXPENSIVE_THRESHOLD: f64 = 10_000.0;

/// Fallback label for expenses without a category, also used as the
/// legacy `category` alias.
pub const UNCATEGORIZED: &str = "その他";

/// Generate a fresh row id.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Contract for persisted record types: self-validation plus a flat
/// JSON rendering for API consumers.
pub trait Record {
    /// Returns an ordered list of human-readable violations.
    /// An empty list means the record is valid.
    fn validate(&self) -> Vec<String>;

    /// Flat JSON record as served by the API.
    fn to_json(&self) -> serde_json::Value;
}

/// Input currency of an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Jpy,
    Twd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpy => "JPY",
            Self::Twd => "TWD",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "JPY" => Ok(Self::Jpy),
            "TWD" => Ok(Self::Twd),
            _ => Err(format!("Unknown currency: {}", s)),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded transaction
///
/// The JPY amount is canonical and always populated; when the expense was
/// entered in TWD the original amount and the conversion rate ride along.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    /// Captured receipt this expense was filled from, if any
    pub receipt_id: Option<String>,
    pub date: NaiveDate,
    pub store: Option<String>,
    pub memo: Option<String>,
    /// Original amount when entered in TWD
    pub twd_amount: Option<f64>,
    /// Canonical amount used for all aggregation
    pub jpy_amount: f64,
    /// Rate used to derive `jpy_amount`; set exactly when `twd_amount` is
    pub fx_rate_used: Option<f64>,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for building a new expense via [`Expense::create_from_input`]
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub user_id: String,
    pub amount: f64,
    pub currency: Currency,
    pub date: NaiveDate,
    pub store: Option<String>,
    pub memo: Option<String>,
    pub category_id: Option<String>,
    /// Overrides [`DEFAULT_EXCHANGE_RATE`] when set
    pub exchange_rate: Option<f64>,
}

impl Expense {
    /// Build an expense from user input, deriving the canonical JPY amount.
    ///
    /// TWD input is converted at the given rate and rounded to the nearest
    /// yen; JPY input is stored as-is with no rate recorded.
    pub fn create_from_input(input: ExpenseInput) -> Self {
        let rate = input.exchange_rate.unwrap_or(DEFAULT_EXCHANGE_RATE);

        let (twd_amount, jpy_amount, fx_rate_used) = match input.currency {
            Currency::Twd => (Some(input.amount), (input.amount * rate).round(), Some(rate)),
            Currency::Jpy => (None, input.amount, None),
        };

        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: input.user_id,
            receipt_id: None,
            date: input.date,
            store: input.store,
            memo: input.memo,
            twd_amount,
            jpy_amount,
            fx_rate_used,
            category_id: input.category_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Currency the expense was originally entered in (derived, not stored)
    pub fn input_currency(&self) -> Currency {
        if self.twd_amount.is_some() {
            Currency::Twd
        } else {
            Currency::Jpy
        }
    }

    /// Amount in the input currency
    pub fn input_amount(&self) -> f64 {
        self.twd_amount.unwrap_or(self.jpy_amount)
    }

    /// Whether the canonical amount exceeds the threshold (strictly)
    pub fn is_expensive(&self, threshold: f64) -> bool {
        self.jpy_amount > threshold
    }

    /// Whether the expense falls in the same calendar month as `date`
    pub fn is_same_month(&self, date: NaiveDate) -> bool {
        self.date.year() == date.year() && self.date.month() == date.month()
    }

    /// Input-currency amount formatted for display, e.g. `NT$1,234` or `¥1,234`
    pub fn formatted_input_amount(&self) -> String {
        match self.twd_amount {
            Some(twd) => format!("NT${}", group_thousands(twd)),
            None => format!("¥{}", group_thousands(self.jpy_amount)),
        }
    }

    /// Canonical amount formatted for display, e.g. `¥1,234`
    pub fn formatted_jpy_amount(&self) -> String {
        format!("¥{}", group_thousands(self.jpy_amount))
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Record for Expense {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.jpy_amount <= 0.0 {
            errors.push("JPY amount must be greater than 0".to_string());
        }

        if let Some(twd) = self.twd_amount {
            if twd <= 0.0 {
                errors.push("TWD amount must be greater than 0".to_string());
            }
        }

        if self.user_id.trim().is_empty() {
            errors.push("User ID is required".to_string());
        }

        if self.twd_amount.is_some() && self.fx_rate_used.is_none() {
            errors.push("Exchange rate is required when TWD amount is set".to_string());
        }

        errors
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "userId": self.user_id,
            "receiptId": self.receipt_id,
            "date": self.date.format("%Y-%m-%d").to_string(),
            "store": self.store,
            "memo": self.memo,
            "twdAmount": self.twd_amount,
            "jpyAmount": self.jpy_amount,
            "fxRateUsed": self.fx_rate_used,
            "categoryId": self.category_id,
            "createdAt": self.created_at.to_rfc3339(),
            "updatedAt": self.updated_at.to_rfc3339(),
            // Legacy compatibility fields
            "amount": self.input_amount(),
            "currency": self.input_currency().as_str(),
            "storeName": self.store,
            "category": self.category_id.as_deref().unwrap_or(UNCATEGORIZED),
        })
    }
}

/// A user-scoped expense category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Display color, e.g. "#FF6B6B"
    pub color: String,
    /// Manual ordering, assigned max+1 per user on creation
    pub sort_order: i64,
    /// Soft delete; hidden categories are excluded from listings and lookup
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Category {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Category name is required".to_string());
        }

        if self.user_id.trim().is_empty() {
            errors.push("User ID is required".to_string());
        }

        errors
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "userId": self.user_id,
            "name": self.name,
            "color": self.color,
            "sortOrder": self.sort_order,
            "hidden": self.hidden,
            "createdAt": self.created_at.to_rfc3339(),
            "updatedAt": self.updated_at.to_rfc3339(),
        })
    }
}

/// An application user
///
/// The profile is normally supplied by the external identity provider;
/// rows created here are placeholder provisioning only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Auth provider tag (e.g. "password", "google")
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

/// Per-category aggregate over a filtered expense set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Sum of canonical JPY amounts
    pub total: f64,
    pub count: i64,
}

/// Category total with its share of the grand total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub total: f64,
    pub count: i64,
    /// Percentage of the grand total, rounded to 2 decimal places
    pub percentage: f64,
}

/// Monthly spending report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub expenses: Vec<Expense>,
    pub category_totals: Vec<CategoryTotal>,
    pub total_amount: f64,
    pub count: i64,
    /// Rounded to 2 decimal places; 0 when the month is empty
    pub average_amount: f64,
}

/// Format an amount with thousands separators, trimming insignificant
/// fractional digits (`1234.5` -> "1,234.5", `450.0` -> "450").
fn group_thousands(amount: f64) -> String {
    let mut s = format!("{:.2}", amount.abs());
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (s, None),
    };

    let mut grouped = String::new();
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if amount < 0.0 {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_expense() -> Expense {
        Expense::create_from_input(ExpenseInput {
            user_id: "user-1".to_string(),
            amount: 100.0,
            currency: Currency::Twd,
            date: NaiveDate::from_ymd_opt(2024, 12, 15).unwrap(),
            store: Some("7-Eleven".to_string()),
            memo: None,
            category_id: Some("cat-1".to_string()),
            exchange_rate: None,
        })
    }

    #[test]
    fn test_create_from_twd_input() {
        let expense = sample_expense();
        assert_eq!(expense.twd_amount, Some(100.0));
        assert_eq!(expense.jpy_amount, 450.0);
        assert_eq!(expense.fx_rate_used, Some(DEFAULT_EXCHANGE_RATE));
        assert_eq!(expense.input_currency(), Currency::Twd);
        assert_eq!(expense.input_amount(), 100.0);
    }

    #[test]
    fn test_create_from_jpy_input() {
        let expense = Expense::create_from_input(ExpenseInput {
            user_id: "user-1".to_string(),
            amount: 1200.0,
            currency: Currency::Jpy,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            store: None,
            memo: None,
            category_id: None,
            exchange_rate: None,
        });
        assert_eq!(expense.twd_amount, None);
        assert_eq!(expense.jpy_amount, 1200.0);
        assert_eq!(expense.fx_rate_used, None);
        assert_eq!(expense.input_currency(), Currency::Jpy);
    }

    #[test]
    fn test_conversion_rounds_to_nearest_yen() {
        let expense = Expense::create_from_input(ExpenseInput {
            user_id: "user-1".to_string(),
            amount: 33.0,
            currency: Currency::Twd,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            store: None,
            memo: None,
            category_id: None,
            exchange_rate: Some(4.55),
        });
        // 33 * 4.55 = 150.15 -> 150
        assert_eq!(expense.jpy_amount, 150.0);
    }

    #[test]
    fn test_validate_accepts_well_formed_expense() {
        assert!(sample_expense().validate().is_empty());
    }

    #[test]
    fn test_validate_rejects_non_positive_amounts() {
        let mut expense = sample_expense();
        expense.jpy_amount = 0.0;
        let errors = expense.validate();
        assert_eq!(errors, vec!["JPY amount must be greater than 0"]);

        let mut expense = sample_expense();
        expense.twd_amount = Some(-5.0);
        let errors = expense.validate();
        assert_eq!(errors, vec!["TWD amount must be greater than 0"]);
    }

    #[test]
    fn test_validate_rejects_zero_twd_amount() {
        let mut expense = sample_expense();
        expense.twd_amount = Some(0.0);
        assert!(expense
            .validate()
            .contains(&"TWD amount must be greater than 0".to_string()));
    }

    #[test]
    fn test_validate_requires_user_id() {
        let mut expense = sample_expense();
        expense.user_id = "  ".to_string();
        assert!(expense
            .validate()
            .contains(&"User ID is required".to_string()));
    }

    #[test]
    fn test_validate_requires_rate_with_twd_amount() {
        let mut expense = sample_expense();
        expense.fx_rate_used = None;
        assert_eq!(
            expense.validate(),
            vec!["Exchange rate is required when TWD amount is set"]
        );
    }

    #[test]
    fn test_is_expensive_is_strict() {
        let mut expense = sample_expense();
        expense.jpy_amount = 10_000.0;
        assert!(!expense.is_expensive(EXPENSIVE_THRESHOLD));
        expense.jpy_amount = 10_001.0;
        assert!(expense.is_expensive(EXPENSIVE_THRESHOLD));
    }

    #[test]
    fn test_is_same_month() {
        let expense = sample_expense();
        assert!(expense.is_same_month(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()));
        assert!(!expense.is_same_month(NaiveDate::from_ymd_opt(2024, 11, 15).unwrap()));
        assert!(!expense.is_same_month(NaiveDate::from_ymd_opt(2023, 12, 15).unwrap()));
    }

    #[test]
    fn test_formatted_amounts() {
        let mut expense = sample_expense();
        expense.twd_amount = Some(1234.0);
        expense.jpy_amount = 5553.0;
        assert_eq!(expense.formatted_input_amount(), "NT$1,234");
        assert_eq!(expense.formatted_jpy_amount(), "¥5,553");

        expense.twd_amount = None;
        assert_eq!(expense.formatted_input_amount(), "¥5,553");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.0), "1,234,567");
        assert_eq!(group_thousands(1234.5), "1,234.5");
        assert_eq!(group_thousands(-4500.0), "-4,500");
    }

    #[test]
    fn test_to_json_includes_legacy_aliases() {
        let expense = sample_expense();
        let json = expense.to_json();
        assert_eq!(json["amount"], 100.0);
        assert_eq!(json["currency"], "TWD");
        assert_eq!(json["storeName"], "7-Eleven");
        assert_eq!(json["category"], "cat-1");
        assert_eq!(json["date"], "2024-12-15");

        let mut uncategorized = sample_expense();
        uncategorized.category_id = None;
        assert_eq!(uncategorized.to_json()["category"], UNCATEGORIZED);
    }

    #[test]
    fn test_currency_round_trip() {
        assert_eq!("JPY".parse::<Currency>().unwrap(), Currency::Jpy);
        assert_eq!("twd".parse::<Currency>().unwrap(), Currency::Twd);
        assert!("EUR".parse::<Currency>().is_err());
        assert_eq!(Currency::Twd.to_string(), "TWD");
    }
}
