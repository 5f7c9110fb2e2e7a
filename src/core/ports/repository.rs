use crate::core::models::{
    analytics::AnalyticsSnapshot,
    common::Pagination,
    response::{ResponseInsert, SurveyResponse},
    survey::{Survey, SurveyInsert, SurveyQuery, SurveyStatus, SurveyUpdate},
};
use crate::error::Error;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub trait SurveyCommon {
    /// Creates the remote record, stamping timestamps, a zero response count
    /// and draft status; returns the server-assigned id.
    async fn insert(&mut self, data: SurveyInsert) -> Result<Uuid, Error>;
    /// Overwrites the mutable fields and refreshes the update timestamp.
    /// Last write wins; concurrent saves of the same id are not coordinated.
    async fn update(&mut self, id: Uuid, data: SurveyUpdate) -> Result<bool, Error>;
    async fn get(&mut self, id: Uuid) -> Result<Option<Survey>, Error>;
    async fn query(&mut self, query: &SurveyQuery, pagination: Option<Pagination>) -> Result<Vec<Survey>, Error>;
    async fn count(&mut self, query: &SurveyQuery) -> Result<i64, Error>;
    async fn set_status(&mut self, id: Uuid, status: SurveyStatus, published_at: Option<DateTime<Utc>>) -> Result<bool, Error>;
    /// Bumps the denormalized response counter. Committed independently of
    /// the analytics snapshot write and never rolled back.
    async fn increment_response_count(&mut self, id: Uuid) -> Result<(), Error>;
}

pub trait ResponseCommon {
    async fn insert(&mut self, data: ResponseInsert) -> Result<Uuid, Error>;
    async fn query_by_survey(&mut self, survey_id: Uuid) -> Result<Vec<SurveyResponse>, Error>;
    async fn count_by_survey(&mut self, survey_id: Uuid) -> Result<i64, Error>;
    /// Idempotency guard for at-least-once trigger delivery: returns true the
    /// first time a response id is seen, false on any redelivery.
    async fn mark_aggregated(&mut self, response_id: Uuid) -> Result<bool, Error>;
}

pub trait AnalyticsCommon {
    async fn upsert_snapshot(&mut self, snapshot: &AnalyticsSnapshot) -> Result<(), Error>;
    async fn get_snapshot(&mut self, survey_id: Uuid) -> Result<Option<AnalyticsSnapshot>, Error>;
}

pub trait Store: SurveyCommon + ResponseCommon + AnalyticsCommon {}
