//! Key/value settings and the typed interest configuration on top of them.
//!
//! Malformed values are rejected at write time; the accrual engine can
//! always trust what it reads.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

pub const INTEREST_RATE_KEY: &str = "interest_rate";
pub const INTEREST_PERIOD_KEY: &str = "interest_period";

pub const DEFAULT_INTEREST_RATE: f64 = 0.05;
pub const DEFAULT_INTEREST_PERIOD: InterestPeriod = InterestPeriod::Monthly;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestPeriod {
    Weekly,
    Biweekly,
    Monthly,
}

impl InterestPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }

    /// Fixed day count the period compounds over.
    pub fn days(self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Biweekly => 14,
            Self::Monthly => 30,
        }
    }
}

impl TryFrom<&str> for InterestPeriod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(EngineError::Validation(format!(
                "invalid interest period: {other}"
            ))),
        }
    }
}

/// Interest configuration in effect for an accrual run, read at call time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterestSettings {
    pub rate: f64,
    pub period: InterestPeriod,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_day_counts() {
        assert_eq!(InterestPeriod::Weekly.days(), 7);
        assert_eq!(InterestPeriod::Biweekly.days(), 14);
        assert_eq!(InterestPeriod::Monthly.days(), 30);
    }

    #[test]
    fn unknown_period_is_rejected() {
        assert!(InterestPeriod::try_from("quarterly").is_err());
    }
}
