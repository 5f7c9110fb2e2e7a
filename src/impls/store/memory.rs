use crate::core::models::{
    analytics::AnalyticsSnapshot,
    common::Pagination,
    response::{ResponseInsert, SurveyResponse},
    survey::{Survey, SurveyInsert, SurveyQuery, SurveyStatus, SurveyUpdate},
};
use crate::core::ports::repository::{AnalyticsCommon, ResponseCommon, Store, SurveyCommon};
use crate::error::Error;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Map-backed store used by the service tests. Tracks how many survey writes
/// it has seen so tests can assert that rejected operations never reached
/// storage.
#[derive(Default)]
pub struct MemoryStore {
    surveys: HashMap<Uuid, Survey>,
    responses: Vec<SurveyResponse>,
    snapshots: HashMap<Uuid, AnalyticsSnapshot>,
    aggregated: HashSet<Uuid>,
    survey_writes: usize,
    fail_snapshot_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn survey_writes(&self) -> usize {
        self.survey_writes
    }

    pub fn survey_count(&self) -> usize {
        self.surveys.len()
    }

    /// Makes every subsequent snapshot write fail, simulating an analytics
    /// storage outage.
    pub fn break_snapshot_writes(&mut self) {
        self.fail_snapshot_writes = true;
    }
}

impl SurveyCommon for MemoryStore {
    async fn insert(&mut self, data: SurveyInsert) -> Result<Uuid, Error> {
        self.survey_writes += 1;
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.surveys.insert(
            id,
            Survey {
                id,
                title: data.title,
                description: data.description,
                questions: data.questions,
                settings: data.settings,
                user_id: data.user_id,
                status: SurveyStatus::Draft,
                created_at: now,
                updated_at: now,
                published_at: None,
                response_count: 0,
            },
        );
        Ok(id)
    }

    async fn update(&mut self, id: Uuid, data: SurveyUpdate) -> Result<bool, Error> {
        self.survey_writes += 1;
        match self.surveys.get_mut(&id) {
            Some(survey) => {
                survey.title = data.title;
                survey.description = data.description;
                survey.questions = data.questions;
                survey.settings = data.settings;
                survey.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Survey>, Error> {
        Ok(self.surveys.get(&id).cloned())
    }

    async fn query(&mut self, query: &SurveyQuery, pagination: Option<Pagination>) -> Result<Vec<Survey>, Error> {
        let mut matched: Vec<Survey> = self
            .surveys
            .values()
            .filter(|s| query.user_id_eq.as_ref().map_or(true, |uid| &s.user_id == uid))
            .filter(|s| query.status_eq.map_or(true, |status| s.status == status))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if let Some(p) = pagination {
            matched = matched.into_iter().skip(p.offset() as usize).take(p.size as usize).collect();
        }
        Ok(matched)
    }

    async fn count(&mut self, query: &SurveyQuery) -> Result<i64, Error> {
        let total = self
            .surveys
            .values()
            .filter(|s| query.user_id_eq.as_ref().map_or(true, |uid| &s.user_id == uid))
            .filter(|s| query.status_eq.map_or(true, |status| s.status == status))
            .count();
        Ok(total as i64)
    }

    async fn set_status(&mut self, id: Uuid, status: SurveyStatus, published_at: Option<DateTime<Utc>>) -> Result<bool, Error> {
        self.survey_writes += 1;
        match self.surveys.get_mut(&id) {
            Some(survey) => {
                survey.status = status;
                if published_at.is_some() {
                    survey.published_at = published_at;
                }
                survey.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_response_count(&mut self, id: Uuid) -> Result<(), Error> {
        if let Some(survey) = self.surveys.get_mut(&id) {
            survey.response_count += 1;
            survey.updated_at = Utc::now();
        }
        Ok(())
    }
}

impl ResponseCommon for MemoryStore {
    async fn insert(&mut self, data: ResponseInsert) -> Result<Uuid, Error> {
        let id = Uuid::new_v4();
        self.responses.push(SurveyResponse {
            id,
            survey_id: data.survey_id,
            answers: data.answers,
            metadata: data.metadata,
            submitted_at: Utc::now(),
            user_id: data.user_id,
            anonymous_id: data.anonymous_id,
        });
        Ok(id)
    }

    async fn query_by_survey(&mut self, survey_id: Uuid) -> Result<Vec<SurveyResponse>, Error> {
        Ok(self.responses.iter().filter(|r| r.survey_id == survey_id).cloned().collect())
    }

    async fn count_by_survey(&mut self, survey_id: Uuid) -> Result<i64, Error> {
        Ok(self.responses.iter().filter(|r| r.survey_id == survey_id).count() as i64)
    }

    async fn mark_aggregated(&mut self, response_id: Uuid) -> Result<bool, Error> {
        Ok(self.aggregated.insert(response_id))
    }
}

impl AnalyticsCommon for MemoryStore {
    async fn upsert_snapshot(&mut self, snapshot: &AnalyticsSnapshot) -> Result<(), Error> {
        if self.fail_snapshot_writes {
            return Err(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "snapshot storage down")));
        }
        self.snapshots.insert(snapshot.survey_id, snapshot.clone());
        Ok(())
    }

    async fn get_snapshot(&mut self, survey_id: Uuid) -> Result<Option<AnalyticsSnapshot>, Error> {
        Ok(self.snapshots.get(&survey_id).cloned())
    }
}

impl Store for MemoryStore {}
