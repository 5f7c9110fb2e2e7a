use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBreakdown {
    pub mobile: i64,
    pub tablet: i64,
    pub desktop: i64,
}

/// Aggregate for one question, shaped by the question's type the same way the
/// question payload itself is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionAggregate {
    /// multiple_choice and dropdown: chosen option value -> count.
    #[serde(rename_all = "camelCase")]
    Choice { total_answers: i64, counts: BTreeMap<String, i64> },
    /// scale and rating: running average plus the value distribution.
    #[serde(rename_all = "camelCase")]
    Scale {
        total_answers: i64,
        average: f64,
        counts: BTreeMap<i64, i64>,
    },
    #[serde(rename_all = "camelCase")]
    YesNo { total_answers: i64, yes: i64, no: i64 },
    /// free text: count plus a handful of sample answers.
    #[serde(rename_all = "camelCase")]
    Text { total_answers: i64, samples: Vec<String> },
    /// date and time: exact string value -> count.
    #[serde(rename_all = "camelCase")]
    Exact { total_answers: i64, counts: BTreeMap<String, i64> },
}

impl QuestionAggregate {
    pub fn total_answers(&self) -> i64 {
        match self {
            QuestionAggregate::Choice { total_answers, .. }
            | QuestionAggregate::Scale { total_answers, .. }
            | QuestionAggregate::YesNo { total_answers, .. }
            | QuestionAggregate::Text { total_answers, .. }
            | QuestionAggregate::Exact { total_answers, .. } => *total_answers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Cached derived aggregate for one survey. Always regenerated wholesale from
/// the full response set, never merged incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub survey_id: Uuid,
    pub total_responses: i64,
    /// Fraction (0..=1) of responses that answered every required question.
    pub completion_rate: f64,
    /// Mean response duration in seconds.
    pub average_duration: f64,
    pub device_breakdown: DeviceBreakdown,
    pub question_analytics: BTreeMap<String, QuestionAggregate>,
    pub time_series: Vec<DailyCount>,
    pub updated_at: DateTime<Utc>,
}
