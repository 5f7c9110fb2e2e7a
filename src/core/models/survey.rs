use crate::core::draft::SurveySettings;
use crate::core::question::Question;
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Draft,
    Published,
    Closed,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStatus::Draft => "draft",
            SurveyStatus::Published => "published",
            SurveyStatus::Closed => "closed",
        }
    }
}

impl FromStr for SurveyStatus {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SurveyStatus::Draft),
            "published" => Ok(SurveyStatus::Published),
            "closed" => Ok(SurveyStatus::Closed),
            other => Err(Error::Validation(format!("unknown survey status {other}"))),
        }
    }
}

/// The stored survey record. `questions` keeps exactly the order the editor
/// saved; it must round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub settings: SurveySettings,
    pub user_id: String,
    pub status: SurveyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub response_count: i64,
}

#[derive(Debug, Clone)]
pub struct SurveyInsert {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub settings: SurveySettings,
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct SurveyUpdate {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub settings: SurveySettings,
}

#[derive(Debug, Clone, Default)]
pub struct SurveyQuery {
    pub user_id_eq: Option<String>,
    pub status_eq: Option<SurveyStatus>,
}
