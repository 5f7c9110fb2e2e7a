use crate::core::models::{
    analytics::AnalyticsSnapshot,
    common::Pagination,
    response::{ResponseInsert, ResponseMetadata, SurveyResponse},
    survey::{Survey, SurveyInsert, SurveyQuery, SurveyStatus, SurveyUpdate},
};
use crate::core::ports::repository::{AnalyticsCommon, ResponseCommon, Store, SurveyCommon};
use crate::error::Error;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, query_scalar, FromRow, PgPool};
use uuid::Uuid;

/// Postgres adapter. Documents keep their JSON shape: questions, settings,
/// answers and snapshots live in JSONB columns (see migrations/0001_init.sql),
/// so question order round-trips exactly as stored.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SurveyRow {
    id: Uuid,
    title: String,
    description: String,
    questions: serde_json::Value,
    settings: serde_json::Value,
    user_id: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
    response_count: i64,
}

impl TryFrom<SurveyRow> for Survey {
    type Error = Error;
    fn try_from(row: SurveyRow) -> Result<Self, Self::Error> {
        Ok(Survey {
            id: row.id,
            title: row.title,
            description: row.description,
            questions: serde_json::from_value(row.questions)?,
            settings: serde_json::from_value(row.settings)?,
            user_id: row.user_id,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
            response_count: row.response_count,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResponseRow {
    id: Uuid,
    survey_id: Uuid,
    answers: serde_json::Value,
    metadata: serde_json::Value,
    submitted_at: DateTime<Utc>,
    user_id: Option<String>,
    anonymous_id: Option<String>,
}

impl TryFrom<ResponseRow> for SurveyResponse {
    type Error = Error;
    fn try_from(row: ResponseRow) -> Result<Self, Self::Error> {
        let metadata: ResponseMetadata = serde_json::from_value(row.metadata)?;
        Ok(SurveyResponse {
            id: row.id,
            survey_id: row.survey_id,
            answers: serde_json::from_value(row.answers)?,
            metadata,
            submitted_at: row.submitted_at,
            user_id: row.user_id,
            anonymous_id: row.anonymous_id,
        })
    }
}

impl SurveyCommon for PgStore {
    async fn insert(&mut self, data: SurveyInsert) -> Result<Uuid, Error> {
        let id = query_scalar(
            "
        INSERT INTO surveys (id, title, description, questions, settings, user_id, status, created_at, updated_at, response_count)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, 'draft', now(), now(), 0)
        RETURNING id",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(serde_json::to_value(&data.questions)?)
        .bind(serde_json::to_value(&data.settings)?)
        .bind(&data.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update(&mut self, id: Uuid, data: SurveyUpdate) -> Result<bool, Error> {
        let result = query(
            "
        UPDATE surveys
        SET title = $1, description = $2, questions = $3, settings = $4, updated_at = now()
        WHERE id = $5",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(serde_json::to_value(&data.questions)?)
        .bind(serde_json::to_value(&data.settings)?)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Survey>, Error> {
        let row: Option<SurveyRow> = query_as("SELECT * FROM surveys WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        row.map(Survey::try_from).transpose()
    }

    async fn query(&mut self, q: &SurveyQuery, pagination: Option<Pagination>) -> Result<Vec<Survey>, Error> {
        let rows: Vec<SurveyRow> = query_as(
            "
        SELECT *
        FROM surveys
        WHERE ($1 IS NULL OR user_id = $1)
            AND ($2 IS NULL OR status = $2)
        ORDER BY updated_at DESC
        LIMIT $3
        OFFSET $4",
        )
        .bind(&q.user_id_eq)
        .bind(q.status_eq.map(|s| s.as_str()))
        .bind(pagination.map(|p| p.size))
        .bind(pagination.map(|p| p.offset()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Survey::try_from).collect()
    }

    async fn count(&mut self, q: &SurveyQuery) -> Result<i64, Error> {
        let total = query_scalar(
            "
        SELECT COUNT(*)
        FROM surveys
        WHERE ($1 IS NULL OR user_id = $1)
            AND ($2 IS NULL OR status = $2)",
        )
        .bind(&q.user_id_eq)
        .bind(q.status_eq.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn set_status(&mut self, id: Uuid, status: SurveyStatus, published_at: Option<DateTime<Utc>>) -> Result<bool, Error> {
        let result = query(
            "
        UPDATE surveys
        SET status = $2, published_at = COALESCE($3, published_at), updated_at = now()
        WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(published_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_response_count(&mut self, id: Uuid) -> Result<(), Error> {
        query("UPDATE surveys SET response_count = response_count + 1, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl ResponseCommon for PgStore {
    async fn insert(&mut self, data: ResponseInsert) -> Result<Uuid, Error> {
        let id = query_scalar(
            "
        INSERT INTO responses (id, survey_id, answers, metadata, submitted_at, user_id, anonymous_id)
        VALUES (gen_random_uuid(), $1, $2, $3, now(), $4, $5)
        RETURNING id",
        )
        .bind(data.survey_id)
        .bind(serde_json::to_value(&data.answers)?)
        .bind(serde_json::to_value(&data.metadata)?)
        .bind(&data.user_id)
        .bind(&data.anonymous_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn query_by_survey(&mut self, survey_id: Uuid) -> Result<Vec<SurveyResponse>, Error> {
        let rows: Vec<ResponseRow> = query_as("SELECT * FROM responses WHERE survey_id = $1 ORDER BY submitted_at")
            .bind(survey_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(SurveyResponse::try_from).collect()
    }

    async fn count_by_survey(&mut self, survey_id: Uuid) -> Result<i64, Error> {
        let total = query_scalar("SELECT COUNT(*) FROM responses WHERE survey_id = $1")
            .bind(survey_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn mark_aggregated(&mut self, response_id: Uuid) -> Result<bool, Error> {
        // first insert wins; a redelivered trigger conflicts and reports false
        let result = query("INSERT INTO aggregated_responses (response_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(response_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl AnalyticsCommon for PgStore {
    async fn upsert_snapshot(&mut self, snapshot: &AnalyticsSnapshot) -> Result<(), Error> {
        query(
            "
        INSERT INTO analytics (survey_id, snapshot, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (survey_id) DO UPDATE SET snapshot = EXCLUDED.snapshot, updated_at = now()",
        )
        .bind(snapshot.survey_id)
        .bind(serde_json::to_value(snapshot)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_snapshot(&mut self, survey_id: Uuid) -> Result<Option<AnalyticsSnapshot>, Error> {
        let value: Option<serde_json::Value> = query_scalar("SELECT snapshot FROM analytics WHERE survey_id = $1")
            .bind(survey_id)
            .fetch_optional(&self.pool)
            .await?;
        value.map(|v| serde_json::from_value(v).map_err(Error::from)).transpose()
    }
}

impl Store for PgStore {}
