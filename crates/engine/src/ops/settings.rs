use sea_orm::{ActiveValue, prelude::*};

use crate::{
    EngineError, InterestPeriod, InterestSettings, ResultEngine, settings,
    settings::{
        DEFAULT_INTEREST_PERIOD, DEFAULT_INTEREST_RATE, INTEREST_PERIOD_KEY, INTEREST_RATE_KEY,
    },
};

use super::Engine;

impl Engine {
    /// The interest configuration currently in effect. Missing keys fall
    /// back to the defaults; a rate change applies from the next accrual
    /// run onward and never rewrites recorded interest.
    pub async fn interest_settings(&self) -> ResultEngine<InterestSettings> {
        let rate = match self.setting(INTEREST_RATE_KEY).await? {
            Some(raw) => raw.parse::<f64>().map_err(|_| {
                EngineError::Validation(format!("stored interest rate is malformed: {raw}"))
            })?,
            None => DEFAULT_INTEREST_RATE,
        };
        let period = match self.setting(INTEREST_PERIOD_KEY).await? {
            Some(raw) => InterestPeriod::try_from(raw.as_str())?,
            None => DEFAULT_INTEREST_PERIOD,
        };
        Ok(InterestSettings { rate, period })
    }

    pub async fn set_interest_rate(&self, rate: f64) -> ResultEngine<InterestSettings> {
        if !(0.0..=1.0).contains(&rate) || !rate.is_finite() {
            return Err(EngineError::Validation(format!(
                "interest rate must be between 0 and 1, got {rate}"
            )));
        }
        self.put_setting(INTEREST_RATE_KEY, &rate.to_string())
            .await?;
        self.interest_settings().await
    }

    pub async fn set_interest_period(
        &self,
        period: InterestPeriod,
    ) -> ResultEngine<InterestSettings> {
        self.put_setting(INTEREST_PERIOD_KEY, period.as_str())
            .await?;
        self.interest_settings().await
    }

    async fn setting(&self, key: &str) -> ResultEngine<Option<String>> {
        let model = settings::Entity::find_by_id(key.to_string())
            .one(&self.database)
            .await?;
        Ok(model.map(|m| m.value))
    }

    async fn put_setting(&self, key: &str, value: &str) -> ResultEngine<()> {
        match settings::Entity::find_by_id(key.to_string())
            .one(&self.database)
            .await?
        {
            Some(model) => {
                let mut active: settings::ActiveModel = model.into();
                active.value = ActiveValue::Set(value.to_string());
                active.update(&self.database).await?;
            }
            None => {
                settings::ActiveModel {
                    key: ActiveValue::Set(key.to_string()),
                    value: ActiveValue::Set(value.to_string()),
                }
                .insert(&self.database)
                .await?;
            }
        }
        Ok(())
    }
}
