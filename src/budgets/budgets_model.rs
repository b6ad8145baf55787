use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DEFAULT_ALERT_THRESHOLD;
use crate::errors::{Result, ValidationError};
use crate::repositories::repository_traits::{Entity, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BudgetPeriod {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "quarterly" => Ok(BudgetPeriod::Quarterly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown budget period '{}'",
                other
            ))
            .into()),
        }
    }

    /// Last day of the window opening at `start`: a week is start+6, the
    /// calendar periods run to the day before the next window opens.
    pub fn end_of(&self, start: NaiveDate) -> NaiveDate {
        match self {
            BudgetPeriod::Weekly => start
                .checked_add_days(Days::new(6))
                .unwrap_or(start),
            BudgetPeriod::Monthly => next_window_minus_one(start, 1),
            BudgetPeriod::Quarterly => next_window_minus_one(start, 3),
            BudgetPeriod::Yearly => next_window_minus_one(start, 12),
        }
    }
}

fn next_window_minus_one(start: NaiveDate, months: u32) -> NaiveDate {
    start
        .checked_add_months(Months::new(months))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(start)
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Quarterly => "quarterly",
            BudgetPeriod::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub alert_threshold: u8,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn window_contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetDraft {
    pub category_id: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    /// Derived from the period when absent.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_threshold")]
    pub alert_threshold: u8,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_threshold() -> u8 {
    DEFAULT_ALERT_THRESHOLD
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<BudgetPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_threshold: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn validate_threshold(threshold: u8) -> Result<()> {
    if threshold > 100 {
        return Err(ValidationError::ThresholdOutOfRange(threshold).into());
    }
    Ok(())
}

impl Entity for Budget {
    type Draft = BudgetDraft;
    type Patch = BudgetPatch;
    type Mapper = super::budgets_transformer::BudgetMapper;

    const KIND: EntityKind = EntityKind::Budget;

    fn id(&self) -> &str {
        &self.id
    }

    fn materialize(draft: BudgetDraft, id: String, now: DateTime<Utc>) -> Self {
        let end_date = draft
            .end_date
            .unwrap_or_else(|| draft.period.end_of(draft.start_date));
        Budget {
            id,
            category_id: draft.category_id,
            amount: draft.amount,
            period: draft.period,
            start_date: draft.start_date,
            end_date,
            alert_threshold: draft.alert_threshold,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &BudgetPatch, now: DateTime<Utc>) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(period) = patch.period {
            self.period = period;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        match patch.end_date {
            Some(end_date) => self.end_date = end_date,
            // The window moved without an explicit end: re-derive it.
            None if patch.period.is_some() || patch.start_date.is_some() => {
                self.end_date = self.period.end_of(self.start_date);
            }
            None => {}
        }
        if let Some(threshold) = patch.alert_threshold {
            self.alert_threshold = threshold;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }

    fn validate_draft(draft: &BudgetDraft) -> Result<()> {
        if draft.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount.into());
        }
        validate_threshold(draft.alert_threshold)?;
        if let Some(end_date) = draft.end_date {
            if draft.start_date > end_date {
                return Err(ValidationError::InvalidDateRange(draft.start_date, end_date).into());
            }
        }
        Ok(())
    }

    fn validate_patch(patch: &BudgetPatch) -> Result<()> {
        if let Some(amount) = patch.amount {
            if amount <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveAmount.into());
            }
        }
        if let Some(threshold) = patch.alert_threshold {
            validate_threshold(threshold)?;
        }
        if let (Some(start), Some(end)) = (patch.start_date, patch.end_date) {
            if start > end {
                return Err(ValidationError::InvalidDateRange(start, end).into());
            }
        }
        Ok(())
    }
}

/// Spend against a budget's window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetUtilization {
    pub budget_id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub spent: Decimal,
    pub percent: Decimal,
    pub over_budget: bool,
}

/// Raised (at most once per budget per window) when spend crosses the
/// alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlert {
    pub budget_id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub spent: Decimal,
    pub percent: Decimal,
    pub threshold: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_ends_are_derived_per_period() {
        let start = date(2024, 1, 1);
        assert_eq!(BudgetPeriod::Weekly.end_of(start), date(2024, 1, 7));
        assert_eq!(BudgetPeriod::Monthly.end_of(start), date(2024, 1, 31));
        assert_eq!(BudgetPeriod::Quarterly.end_of(start), date(2024, 3, 31));
        assert_eq!(BudgetPeriod::Yearly.end_of(start), date(2024, 12, 31));

        // Mid-month starts clamp at short month ends.
        assert_eq!(
            BudgetPeriod::Monthly.end_of(date(2024, 1, 31)),
            date(2024, 2, 28)
        );
    }

    #[test]
    fn materialize_derives_the_end_date_when_absent() {
        let budget = Budget::materialize(
            BudgetDraft {
                category_id: "cat_1".to_string(),
                amount: dec!(500),
                period: BudgetPeriod::Monthly,
                start_date: date(2024, 1, 1),
                end_date: None,
                alert_threshold: 80,
                is_active: true,
            },
            "bud_1".to_string(),
            Utc::now(),
        );
        assert_eq!(budget.end_date, date(2024, 1, 31));
        assert!(budget.window_contains(date(2024, 1, 15)));
        assert!(!budget.window_contains(date(2024, 2, 1)));
    }

    #[test]
    fn moving_the_window_re_derives_the_end() {
        let mut budget = Budget::materialize(
            BudgetDraft {
                category_id: "cat_1".to_string(),
                amount: dec!(500),
                period: BudgetPeriod::Monthly,
                start_date: date(2024, 1, 1),
                end_date: None,
                alert_threshold: 80,
                is_active: true,
            },
            "bud_1".to_string(),
            Utc::now(),
        );
        budget.apply_patch(
            &BudgetPatch {
                start_date: Some(date(2024, 2, 1)),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(budget.end_date, date(2024, 2, 29));
    }

    #[test]
    fn threshold_is_bounded() {
        let mut draft = BudgetDraft {
            category_id: "cat_1".to_string(),
            amount: dec!(100),
            period: BudgetPeriod::Monthly,
            start_date: date(2024, 1, 1),
            end_date: None,
            alert_threshold: 101,
            is_active: true,
        };
        assert!(Budget::validate_draft(&draft).is_err());
        draft.alert_threshold = 100;
        assert!(Budget::validate_draft(&draft).is_ok());
    }
}
