use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, User, users};

use super::{Engine, normalize_required_name};

impl Engine {
    /// Upsert a member from a successful identity-provider login.
    ///
    /// The display name is refreshed on every login; the stored ledger
    /// credential is overwritten only when a non-empty one is supplied. The
    /// configured treasury account becomes the admin on first login.
    pub async fn get_or_create_user(
        &self,
        account_id: i64,
        display_name: &str,
        credential: Option<&str>,
    ) -> ResultEngine<User> {
        let display_name = normalize_required_name(display_name, "display")?;
        let credential = credential.map(str::trim).filter(|c| !c.is_empty());

        let existing = users::Entity::find()
            .filter(users::Column::AccountId.eq(account_id))
            .one(&self.database)
            .await?;

        match existing {
            Some(model) => {
                let mut active = users::ActiveModel {
                    id: ActiveValue::Set(model.id.clone()),
                    display_name: ActiveValue::Set(display_name),
                    ..Default::default()
                };
                if let Some(credential) = credential {
                    active.credential = ActiveValue::Set(Some(credential.to_string()));
                }
                let updated = active.update(&self.database).await?;
                User::try_from(updated)
            }
            None => {
                let is_admin = self.treasury_account_id == Some(account_id);
                let user = User {
                    id: Uuid::new_v4(),
                    account_id,
                    display_name,
                    credential: credential.map(ToString::to_string),
                    is_admin,
                    created_at: Utc::now(),
                };
                users::ActiveModel::from(&user).insert(&self.database).await?;
                tracing::info!(
                    account_id,
                    is_admin,
                    "created user {}",
                    user.display_name
                );
                Ok(user)
            }
        }
    }

    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("user".to_string()))?;
        User::try_from(model)
    }

    pub async fn user_by_account(&self, account_id: i64) -> ResultEngine<Option<User>> {
        let model = users::Entity::find()
            .filter(users::Column::AccountId.eq(account_id))
            .one(&self.database)
            .await?;
        model.map(User::try_from).transpose()
    }

    pub async fn list_users(&self) -> ResultEngine<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::DisplayName)
            .all(&self.database)
            .await?;
        models.into_iter().map(User::try_from).collect()
    }

    /// The treasury user, when the treasury account has logged in at least
    /// once. Missing configuration is an error; a missing user is not.
    pub(crate) async fn treasury_user(&self) -> ResultEngine<Option<User>> {
        let account_id = self.treasury_account_id()?;
        self.user_by_account(account_id).await
    }
}
