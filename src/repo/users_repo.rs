use crate::domain::fulfillment::UserProfile;
use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>>;
}

#[derive(Clone)]
pub struct UsersRepo {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl UserDirectory for UsersRepo {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, full_name, email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| UserProfile {
            id: r.get("id"),
            full_name: r.get("full_name"),
            email: r.get("email"),
        }))
    }
}
