use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Submission;
use crate::pagination::{Page, PageRequest};
use crate::store::{StoreError, SubmissionQuery, SubmissionStore};

pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `WHERE` clause and its binds. Placeholders start at `$1`.
fn filter_clause(query: &SubmissionQuery) -> (&'static str, Vec<Uuid>) {
    match *query {
        SubmissionQuery::All => ("", vec![]),
        SubmissionQuery::ByUser(user_id) => ("WHERE user_id = $1", vec![user_id]),
        SubmissionQuery::ByAssessment(assessment_id) => {
            ("WHERE assessment_id = $1", vec![assessment_id])
        }
        SubmissionQuery::ByUserAndAssessment {
            user_id,
            assessment_id,
        } => (
            "WHERE user_id = $1 AND assessment_id = $2",
            vec![user_id, assessment_id],
        ),
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        let submission = sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(submission)
    }

    async fn find_page(
        &self,
        query: &SubmissionQuery,
        page: &PageRequest,
    ) -> Result<Page<Submission>, StoreError> {
        let (clause, ids) = filter_clause(query);
        let (limit, offset) = page.limit_offset();
        let limit_at = ids.len() + 1;
        let offset_at = ids.len() + 2;

        let sql = format!(
            "SELECT * FROM submissions {clause} {} LIMIT ${limit_at} OFFSET ${offset_at}",
            page.order_by()
        );
        let mut rows = sqlx::query_as::<_, Submission>(&sql);
        for id in &ids {
            rows = rows.bind(*id);
        }
        let submissions = rows.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        let count_sql = format!("SELECT COUNT(*) FROM submissions {clause}");
        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        for id in &ids {
            count = count.bind(*id);
        }
        let total = count.fetch_one(&self.pool).await?;

        Ok(Page::new(submissions, total.max(0) as u64, page))
    }

    async fn save(&self, submission: &Submission) -> Result<Submission, StoreError> {
        let saved = sqlx::query_as::<_, Submission>(
            "INSERT INTO submissions (id, user_id, assessment_id, github_url, content, submitted_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                assessment_id = EXCLUDED.assessment_id,
                github_url = EXCLUDED.github_url,
                content = EXCLUDED.content
             RETURNING *",
        )
        .bind(submission.id)
        .bind(submission.user_id)
        .bind(submission.assessment_id)
        .bind(&submission.github_url)
        .bind(&submission.content)
        .bind(submission.submitted_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
