use sea_orm::{
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{Notification, ResultEngine, notifications};

use super::Engine;

impl Engine {
    /// A user's notifications, newest first.
    pub async fn notifications_for(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> ResultEngine<Vec<Notification>> {
        let models = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;
        models.into_iter().map(Notification::try_from).collect()
    }

    pub async fn unread_count(&self, user_id: Uuid) -> ResultEngine<u64> {
        let count = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.to_string()))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.database)
            .await?;
        Ok(count)
    }

    /// Mark all of a user's notifications read. Returns how many flipped.
    pub async fn mark_notifications_read(&self, user_id: Uuid) -> ResultEngine<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id.to_string()))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }
}
