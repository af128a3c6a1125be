use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Closed set of expense categories
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum ExpenseCategory {
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    Transportation,
    Shopping,
    Entertainment,
    #[serde(rename = "Bills & Utilities")]
    BillsAndUtilities,
    Healthcare,
    Education,
    Travel,
    Business,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 10] = [
        ExpenseCategory::FoodAndDining,
        ExpenseCategory::Transportation,
        ExpenseCategory::Shopping,
        ExpenseCategory::Entertainment,
        ExpenseCategory::BillsAndUtilities,
        ExpenseCategory::Healthcare,
        ExpenseCategory::Education,
        ExpenseCategory::Travel,
        ExpenseCategory::Business,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::FoodAndDining => "Food & Dining",
            ExpenseCategory::Transportation => "Transportation",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::BillsAndUtilities => "Bills & Utilities",
            ExpenseCategory::Healthcare => "Healthcare",
            ExpenseCategory::Education => "Education",
            ExpenseCategory::Travel => "Travel",
            ExpenseCategory::Business => "Business",
            ExpenseCategory::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
pub enum PaymentMethod {
    #[default]
    Cash,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "Digital Wallet")]
    DigitalWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::DebitCard => "Debit Card",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::DigitalWallet => "Digital Wallet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecurringType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringType::Daily => "daily",
            RecurringType::Weekly => "weekly",
            RecurringType::Monthly => "monthly",
            RecurringType::Yearly => "yearly",
        }
    }
}

/// Smallest storable amount
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
/// Largest value of the `NUMERIC(12, 2)` column
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Amount must fit the money column exactly: 0.01 up to MAX_AMOUNT, at most two decimals
fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < MIN_AMOUNT || *amount > MAX_AMOUNT {
        return Err(ValidationError::new("amount_out_of_range"));
    }
    if amount.normalize().scale() > 2 {
        return Err(ValidationError::new("amount_too_precise"));
    }
    Ok(())
}

/// A recurring expense must say how often it recurs
fn validate_recurring(dto: &ExpenseDto) -> Result<(), ValidationError> {
    if dto.is_recurring && dto.recurring_type.is_none() {
        let mut err = ValidationError::new("recurring_type_required");
        err.message = Some("Recurring type is required for recurring expenses".into());
        return Err(err);
    }
    Ok(())
}

/// Database model for expenses
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub expense_date: NaiveDate,
    pub payment_method: String,
    pub is_recurring: bool,
    pub recurring_type: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Expense information returned in responses
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: Uuid,
    #[schema(example = "Morning coffee")]
    pub title: String,
    #[schema(example = 4.50)]
    pub amount: Decimal,
    #[schema(example = "Food & Dining")]
    pub category: String,
    pub description: Option<String>,
    /// Date the expense occurred
    pub date: NaiveDate,
    #[schema(example = "Cash")]
    pub payment_method: String,
    pub is_recurring: bool,
    #[schema(example = "monthly")]
    pub recurring_type: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(e: Expense) -> Self {
        Self {
            id: e.id,
            title: e.title,
            amount: e.amount,
            category: e.category,
            description: e.description,
            date: e.expense_date,
            payment_method: e.payment_method,
            is_recurring: e.is_recurring,
            recurring_type: e.recurring_type,
            tags: e.tags,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Request body for creating or replacing an expense
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_recurring"))]
pub struct ExpenseDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title must be between 1 and 100 characters"
    ))]
    #[schema(example = "Morning coffee")]
    pub title: String,

    #[validate(custom(
        function = "validate_amount",
        message = "Amount must be at least 0.01 with no more than 2 decimal places"
    ))]
    #[schema(example = 4.50)]
    pub amount: Decimal,

    pub category: ExpenseCategory,

    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,

    /// Date the expense occurred (YYYY-MM-DD)
    pub date: NaiveDate,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub is_recurring: bool,

    /// Required when `isRecurring` is true
    pub recurring_type: Option<RecurringType>,

    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ExpenseDto {
    /// Trim text fields, drop blank tags and a recurring type on one-off expenses.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !self.is_recurring {
            self.recurring_type = None;
        }
        self
    }
}

/// Raw query parameters for listing expenses.
///
/// Everything arrives as text so malformed values can fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpenseQuery {
    /// 1-indexed page number (default 1)
    #[param(example = "1")]
    pub page: Option<String>,
    /// Page size (default 10). Large values are honored as given.
    #[serde(alias = "pageSize")]
    #[param(example = "10")]
    pub limit: Option<String>,
    /// Category label, or "all" for no category filter
    #[param(example = "Food & Dining")]
    pub category: Option<String>,
    /// Inclusive lower date bound (YYYY-MM-DD)
    #[param(example = "2024-01-01")]
    pub start_date: Option<String>,
    /// Inclusive upper date bound (YYYY-MM-DD)
    #[param(example = "2024-12-31")]
    pub end_date: Option<String>,
    /// Case-insensitive text matched against title and description
    #[param(example = "coffee")]
    pub search: Option<String>,
}

/// Raw query parameters for expense statistics
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Calendar year (defaults to the current year)
    #[param(example = "2024")]
    pub year: Option<String>,
    /// Month 1-12; omit for the whole year
    #[param(example = "3")]
    pub month: Option<String>,
}

/// Paginated list of expenses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListResponse {
    pub expenses: Vec<ExpenseResponse>,
    /// Number of expenses matching the filters across all pages
    #[schema(example = 25)]
    pub total: i64,
    #[schema(example = 3)]
    pub total_pages: i64,
    #[schema(example = 1)]
    pub current_page: i64,
    #[schema(example = 10)]
    pub page_size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategoryStat {
    #[schema(example = "Food & Dining")]
    pub category: String,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyStat {
    /// Calendar month, 1-12
    #[schema(example = 3)]
    pub month: u32,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TotalStat {
    pub total: Decimal,
    pub count: i64,
}

impl TotalStat {
    pub fn zero() -> Self {
        Self {
            total: Decimal::ZERO,
            count: 0,
        }
    }
}

/// Inclusive date window used for category and total stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Aggregated spending statistics
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseStatsResponse {
    /// Per-category totals in the selected period, largest first
    pub category_stats: Vec<CategoryStat>,
    /// Per-month totals for the whole selected year
    pub monthly_stats: Vec<MonthlyStat>,
    pub total_expenses: TotalStat,
    pub period: StatsPeriod,
}

/// Path parameters for expense ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct ExpenseIdPath {
    /// Expense UUID
    pub id: Uuid,
}
