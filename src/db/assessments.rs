use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Assessment;
use crate::pagination::{Page, PageRequest};
use crate::store::{AssessmentStore, StoreError};

pub struct PgAssessmentStore {
    pool: PgPool,
}

impl PgAssessmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssessmentStore for PgAssessmentStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Assessment>, StoreError> {
        let assessment = sqlx::query_as::<_, Assessment>("SELECT * FROM assessments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(assessment)
    }

    async fn find_first_by_type_ignore_case(
        &self,
        kind: &str,
    ) -> Result<Option<Assessment>, StoreError> {
        let assessment = sqlx::query_as::<_, Assessment>(
            "SELECT * FROM assessments WHERE lower(type) = lower($1)
             ORDER BY created_date, id LIMIT 1",
        )
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assessment)
    }

    async fn find_page(
        &self,
        kind: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Assessment>, StoreError> {
        let (limit, offset) = page.limit_offset();
        let order = page.order_by();

        let (assessments, total): (Vec<Assessment>, i64) = if let Some(kind) = kind {
            let rows = sqlx::query_as::<_, Assessment>(&format!(
                "SELECT * FROM assessments WHERE type = $3 {order} LIMIT $1 OFFSET $2"
            ))
            .bind(limit)
            .bind(offset)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assessments WHERE type = $1")
                .bind(kind)
                .fetch_one(&self.pool)
                .await?;
            (rows, total)
        } else {
            let rows = sqlx::query_as::<_, Assessment>(&format!(
                "SELECT * FROM assessments {order} LIMIT $1 OFFSET $2"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assessments")
                .fetch_one(&self.pool)
                .await?;
            (rows, total)
        };

        Ok(Page::new(assessments, total.max(0) as u64, page))
    }

    async fn save(&self, assessment: &Assessment) -> Result<Assessment, StoreError> {
        let saved = sqlx::query_as::<_, Assessment>(
            "INSERT INTO assessments (id, name, description, type, created_date)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                type = EXCLUDED.type
             RETURNING *",
        )
        .bind(assessment.id)
        .bind(&assessment.name)
        .bind(&assessment.description)
        .bind(&assessment.kind)
        .bind(assessment.created_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM assessments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
