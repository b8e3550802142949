use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;
use crate::pagination::{Page, PageRequest};
use crate::store::{StoreError, UserStore};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_login_ignore_case(&self, login: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(login) = lower($1)")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email_ignore_case(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_activation_key(&self, key: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE activation_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_unactivated_created_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users
             WHERE NOT activated AND activation_key IS NOT NULL AND created_date < $1
             ORDER BY created_date",
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_activated_page(&self, page: &PageRequest) -> Result<Page<User>, StoreError> {
        let (limit, offset) = page.limit_offset();
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT * FROM users WHERE activated {} LIMIT $1 OFFSET $2",
            page.order_by()
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE activated")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(users, total.max(0) as u64, page))
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let saved = sqlx::query_as::<_, User>(
            "INSERT INTO users
                (id, login, email, first_name, last_name, activated, activation_key, reset_key, created_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                login = EXCLUDED.login,
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                activated = EXCLUDED.activated,
                activation_key = EXCLUDED.activation_key,
                reset_key = EXCLUDED.reset_key
             RETURNING *",
        )
        .bind(user.id)
        .bind(&user.login)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.activated)
        .bind(&user.activation_key)
        .bind(&user.reset_key)
        .bind(user.created_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
