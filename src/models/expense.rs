use serde::{Deserialize, Serialize};

/// Largest accepted amount: ten billion whole units. Far below the point where
/// summing many entries could overflow an `i64` of cents.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// A single logged spending event. Never edited after creation, only deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub category_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Non-negative, in minor units of the configured currency.
    pub amount_cents: i64,
    /// Epoch milliseconds, assigned once at creation.
    pub created_at: i64,
}

/// Add-form input exactly as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseDraft {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: String,
}

/// A draft that passed validation and is ready to be stamped with an id and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub category_id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount_cents: i64,
}

impl ExpenseDraft {
    /// Returns `None` when the title or amount is empty, or the amount is not
    /// a finite number in `0..=MAX_AMOUNT_CENTS` cents. Callers treat `None`
    /// as a no-op.
    pub fn validate(&self) -> Option<NewExpense> {
        let title = self.title.trim();
        let amount = self.amount.trim();
        if title.is_empty() || amount.is_empty() {
            return None;
        }

        let amount_cents = parse_amount_cents(amount)?;
        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(String::from);

        Some(NewExpense {
            category_id: self.category_id.trim().to_string(),
            title: title.to_string(),
            description,
            amount_cents,
        })
    }
}

impl NewExpense {
    pub fn into_expense(self, id: String, created_at: i64) -> Expense {
        Expense {
            id,
            category_id: self.category_id,
            title: self.title,
            description: self.description,
            amount_cents: self.amount_cents,
            created_at,
        }
    }
}

fn parse_amount_cents(input: &str) -> Option<i64> {
    let value: f64 = input.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let cents = (value * 100.0).round();
    if cents > MAX_AMOUNT_CENTS as f64 {
        return None;
    }
    Some(cents as i64)
}
