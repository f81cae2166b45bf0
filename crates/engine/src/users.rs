//! Members of the treasury.
//!
//! A user is created on first successful login with the external identity
//! provider. `account_id` is the external identity key and is unique. The
//! stored `credential` is the long-lived token for external ledger access;
//! only the treasury account ever carries one.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub account_id: i64,
    pub display_name: String,
    pub credential: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: i64,
    pub display_name: String,
    pub credential: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::goals::Entity")]
    Goals,
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id.to_string()),
            account_id: ActiveValue::Set(user.account_id),
            display_name: ActiveValue::Set(user.display_name.clone()),
            credential: ActiveValue::Set(user.credential.clone()),
            is_admin: ActiveValue::Set(user.is_admin),
            created_at: ActiveValue::Set(user.created_at),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("user".to_string()))?,
            account_id: model.account_id,
            display_name: model.display_name,
            credential: model.credential,
            is_admin: model.is_admin,
            created_at: model.created_at,
        })
    }
}
