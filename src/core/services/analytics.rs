use crate::core::models::{
    analytics::{AnalyticsSnapshot, DailyCount, DeviceBreakdown, QuestionAggregate},
    response::{DeviceType, SurveyResponse},
    survey::Survey,
};
use crate::core::ports::repository::{AnalyticsCommon, ResponseCommon, Store, SurveyCommon};
use crate::core::question::QuestionKind;
use crate::error::Error;
use chrono::{NaiveDate, Utc};
use itertools::Itertools;
use log::{error, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

const SNAPSHOT_WRITE_ATTEMPTS: u32 = 3;
const TEXT_SAMPLE_LIMIT: usize = 5;

/// Consumes one response-created event. Safe against at-least-once
/// redelivery: the response id doubles as the idempotency key, so a duplicate
/// delivery is ignored without touching the counter. The counter increment
/// commits independently of the snapshot write; only the snapshot write is
/// retried, and once the retries are exhausted the failure is logged, not
/// surfaced: the response is already persisted and counted, and the stale
/// snapshot lasts only until the next recomputation.
pub async fn aggregate_response<S>(store: &mut S, survey_id: Uuid, response_id: Uuid) -> Result<(), Error>
where
    S: Store,
{
    if !ResponseCommon::mark_aggregated(store, response_id).await? {
        info!("response {response_id} already aggregated, ignoring redelivery");
        return Ok(());
    }
    SurveyCommon::increment_response_count(store, survey_id).await?;

    let mut attempt = 1;
    let mut result = refresh_snapshot(store, survey_id).await;
    while let Err(e) = &result {
        if attempt >= SNAPSHOT_WRITE_ATTEMPTS {
            break;
        }
        warn!("snapshot recompute for survey {survey_id} failed on attempt {attempt}: {e}");
        attempt += 1;
        result = refresh_snapshot(store, survey_id).await;
    }
    if let Err(e) = result {
        error!("snapshot recompute for survey {survey_id} gave up after {attempt} attempts: {e}");
    }
    Ok(())
}

/// Recomputes the snapshot from the full response set and overwrites the
/// cached copy. Full recompute, never an incremental merge.
pub async fn refresh_snapshot<S>(store: &mut S, survey_id: Uuid) -> Result<AnalyticsSnapshot, Error>
where
    S: Store,
{
    let survey = SurveyCommon::get(store, survey_id).await?.ok_or_else(|| Error::NotFound(format!("survey {survey_id}")))?;
    let responses = ResponseCommon::query_by_survey(store, survey_id).await?;
    let snapshot = compute_snapshot(&survey, &responses);
    AnalyticsCommon::upsert_snapshot(store, &snapshot).await?;
    Ok(snapshot)
}

fn answered(value: Option<&Value>) -> bool {
    match value {
        None => false,
        Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

pub fn compute_snapshot(survey: &Survey, responses: &[SurveyResponse]) -> AnalyticsSnapshot {
    let total_responses = responses.len() as i64;

    let required: Vec<&str> = survey.questions.iter().filter(|q| q.required).map(|q| q.id.as_str()).collect();
    let complete = responses.iter().filter(|r| required.iter().all(|id| answered(r.answers.get(*id)))).count();
    let completion_rate = if responses.is_empty() { 0.0 } else { complete as f64 / responses.len() as f64 };

    let average_duration = if responses.is_empty() {
        0.0
    } else {
        responses.iter().map(|r| r.metadata.duration_seconds).sum::<f64>() / responses.len() as f64
    };

    let devices = responses.iter().counts_by(|r| r.metadata.device_type);
    let device_breakdown = DeviceBreakdown {
        mobile: devices.get(&DeviceType::Mobile).copied().unwrap_or(0) as i64,
        tablet: devices.get(&DeviceType::Tablet).copied().unwrap_or(0) as i64,
        desktop: devices.get(&DeviceType::Desktop).copied().unwrap_or(0) as i64,
    };

    let mut question_analytics = BTreeMap::new();
    for question in &survey.questions {
        let answers: Vec<&Value> = responses
            .iter()
            .filter(|r| answered(r.answers.get(&question.id)))
            .filter_map(|r| r.answers.get(&question.id))
            .collect();
        question_analytics.insert(question.id.clone(), aggregate_question(&question.kind, &answers));
    }

    let mut daily: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for r in responses {
        *daily.entry(r.submitted_at.date_naive()).or_insert(0) += 1;
    }
    let time_series = daily.into_iter().map(|(date, count)| DailyCount { date, count }).collect();

    AnalyticsSnapshot {
        survey_id: survey.id,
        total_responses,
        completion_rate,
        average_duration,
        device_breakdown,
        question_analytics,
        time_series,
        updated_at: Utc::now(),
    }
}

fn aggregate_question(kind: &QuestionKind, answers: &[&Value]) -> QuestionAggregate {
    let total_answers = answers.len() as i64;
    match kind {
        QuestionKind::MultipleChoice { .. } | QuestionKind::Dropdown { .. } => {
            let mut counts: BTreeMap<String, i64> = BTreeMap::new();
            for answer in answers {
                match answer {
                    Value::String(choice) => *counts.entry(choice.clone()).or_insert(0) += 1,
                    // multi-select answers arrive as an array of option values
                    Value::Array(choices) => {
                        for choice in choices.iter().filter_map(Value::as_str) {
                            *counts.entry(choice.to_string()).or_insert(0) += 1;
                        }
                    }
                    _ => {}
                }
            }
            QuestionAggregate::Choice { total_answers, counts }
        }
        QuestionKind::Scale { .. } | QuestionKind::Rating { .. } => {
            let values: Vec<f64> = answers.iter().filter_map(|v| v.as_f64()).collect();
            let average = if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 };
            let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
            for v in &values {
                *counts.entry(v.round() as i64).or_insert(0) += 1;
            }
            QuestionAggregate::Scale {
                total_answers: values.len() as i64,
                average,
                counts,
            }
        }
        QuestionKind::YesNo => {
            let mut yes = 0;
            let mut no = 0;
            for answer in answers {
                match answer {
                    Value::Bool(true) => yes += 1,
                    Value::Bool(false) => no += 1,
                    Value::String(s) if s == "yes" => yes += 1,
                    Value::String(s) if s == "no" => no += 1,
                    _ => {}
                }
            }
            QuestionAggregate::YesNo { total_answers: yes + no, yes, no }
        }
        QuestionKind::Text { .. } => {
            let texts: Vec<&str> = answers.iter().filter_map(|v| v.as_str()).filter(|s| !s.is_empty()).collect();
            QuestionAggregate::Text {
                total_answers: texts.len() as i64,
                samples: texts.iter().take(TEXT_SAMPLE_LIMIT).map(|s| s.to_string()).collect(),
            }
        }
        QuestionKind::Date | QuestionKind::Time => {
            let mut counts: BTreeMap<String, i64> = BTreeMap::new();
            for answer in answers.iter().filter_map(|v| v.as_str()) {
                *counts.entry(answer.to_string()).or_insert(0) += 1;
            }
            QuestionAggregate::Exact { total_answers, counts }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::UserInfo;
    use crate::core::draft::{DraftSnapshot, SurveySettings};
    use crate::core::models::response::{ResponseInsert, ResponseMetadata};
    use crate::core::question::{ChoiceOption, Question, ScaleConfig};
    use crate::core::services::draft::save_draft;
    use crate::impls::store::memory::MemoryStore;
    use chrono::{DateTime, TimeZone};
    use serde_json::json;

    fn question(id: &str, required: bool, kind: QuestionKind) -> Question {
        Question {
            id: id.into(),
            title: format!("question {id}"),
            description: None,
            required,
            kind,
        }
    }

    fn survey_with(questions: Vec<Question>) -> Survey {
        Survey {
            id: Uuid::new_v4(),
            title: "Course feedback".into(),
            description: String::new(),
            questions,
            settings: SurveySettings::default(),
            user_id: "user-1".into(),
            status: crate::core::models::survey::SurveyStatus::Published,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            published_at: Some(Utc::now()),
            response_count: 0,
        }
    }

    fn response_at(survey_id: Uuid, at: DateTime<Utc>, device: DeviceType, duration: f64, answers: serde_json::Value) -> SurveyResponse {
        let answers = match answers {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        SurveyResponse {
            id: Uuid::new_v4(),
            survey_id,
            answers,
            metadata: ResponseMetadata {
                user_agent: "test-agent".into(),
                ip_address: None,
                location: None,
                duration_seconds: duration,
                device_type: device,
            },
            submitted_at: at,
            user_id: None,
            anonymous_id: Some("anon-1".into()),
        }
    }

    #[test]
    fn empty_response_set_yields_zeroed_snapshot() {
        let survey = survey_with(vec![question("q1", true, QuestionKind::YesNo)]);
        let snapshot = compute_snapshot(&survey, &[]);
        assert_eq!(snapshot.total_responses, 0);
        assert_eq!(snapshot.completion_rate, 0.0);
        assert_eq!(snapshot.average_duration, 0.0);
        assert!(snapshot.time_series.is_empty());
        assert_eq!(snapshot.question_analytics["q1"].total_answers(), 0);
    }

    #[test]
    fn completion_rate_counts_required_questions_only() {
        let survey = survey_with(vec![
            question("q1", true, QuestionKind::YesNo),
            question("q2", false, QuestionKind::Text { placeholder: None, max_length: None, pattern: None, validation_message: None }),
        ]);
        let at = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        let responses = vec![
            response_at(survey.id, at, DeviceType::Mobile, 30.0, json!({"q1": true})),
            response_at(survey.id, at, DeviceType::Desktop, 60.0, json!({"q2": "skipped the required one"})),
        ];
        let snapshot = compute_snapshot(&survey, &responses);
        assert_eq!(snapshot.total_responses, 2);
        assert_eq!(snapshot.completion_rate, 0.5);
        assert_eq!(snapshot.average_duration, 45.0);
        assert_eq!(snapshot.device_breakdown.mobile, 1);
        assert_eq!(snapshot.device_breakdown.desktop, 1);
        assert_eq!(snapshot.device_breakdown.tablet, 0);
    }

    #[test]
    fn choice_counts_cover_single_and_multi_select() {
        let options = vec![
            ChoiceOption { id: "o1".into(), label: "Red".into(), value: "red".into(), image_url: None },
            ChoiceOption { id: "o2".into(), label: "Blue".into(), value: "blue".into(), image_url: None },
        ];
        let survey = survey_with(vec![question("q1", false, QuestionKind::MultipleChoice { options })]);
        let at = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        let responses = vec![
            response_at(survey.id, at, DeviceType::Mobile, 10.0, json!({"q1": "red"})),
            response_at(survey.id, at, DeviceType::Mobile, 10.0, json!({"q1": ["red", "blue"]})),
        ];
        let snapshot = compute_snapshot(&survey, &responses);
        match &snapshot.question_analytics["q1"] {
            QuestionAggregate::Choice { total_answers, counts } => {
                assert_eq!(*total_answers, 2);
                assert_eq!(counts["red"], 2);
                assert_eq!(counts["blue"], 1);
            }
            other => panic!("expected choice aggregate, got {other:?}"),
        }
    }

    #[test]
    fn scale_aggregate_averages_and_buckets() {
        let scale = ScaleConfig { min: 1, max: 5, step: None, labels: BTreeMap::new() };
        let survey = survey_with(vec![question("q1", false, QuestionKind::Scale { scale })]);
        let at = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        let responses = vec![
            response_at(survey.id, at, DeviceType::Mobile, 10.0, json!({"q1": 4})),
            response_at(survey.id, at, DeviceType::Mobile, 10.0, json!({"q1": 2})),
            response_at(survey.id, at, DeviceType::Mobile, 10.0, json!({"q1": "not a number"})),
        ];
        let snapshot = compute_snapshot(&survey, &responses);
        match &snapshot.question_analytics["q1"] {
            QuestionAggregate::Scale { total_answers, average, counts } => {
                assert_eq!(*total_answers, 2);
                assert!((average - 3.0).abs() < f64::EPSILON);
                assert_eq!(counts[&4], 1);
                assert_eq!(counts[&2], 1);
            }
            other => panic!("expected scale aggregate, got {other:?}"),
        }
    }

    #[test]
    fn yes_no_accepts_bools_and_strings() {
        let survey = survey_with(vec![question("q1", false, QuestionKind::YesNo)]);
        let at = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        let responses = vec![
            response_at(survey.id, at, DeviceType::Mobile, 10.0, json!({"q1": true})),
            response_at(survey.id, at, DeviceType::Mobile, 10.0, json!({"q1": "no"})),
            response_at(survey.id, at, DeviceType::Mobile, 10.0, json!({"q1": "yes"})),
        ];
        let snapshot = compute_snapshot(&survey, &responses);
        match &snapshot.question_analytics["q1"] {
            QuestionAggregate::YesNo { total_answers, yes, no } => {
                assert_eq!(*total_answers, 3);
                assert_eq!(*yes, 2);
                assert_eq!(*no, 1);
            }
            other => panic!("expected yes/no aggregate, got {other:?}"),
        }
    }

    #[test]
    fn time_series_buckets_by_day_in_order() {
        let survey = survey_with(vec![]);
        let day1 = Utc.with_ymd_and_hms(2026, 8, 19, 23, 59, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 8, 20, 0, 1, 0).unwrap();
        let responses = vec![
            response_at(survey.id, day2, DeviceType::Mobile, 10.0, json!({})),
            response_at(survey.id, day1, DeviceType::Mobile, 10.0, json!({})),
            response_at(survey.id, day2, DeviceType::Mobile, 10.0, json!({})),
        ];
        let snapshot = compute_snapshot(&survey, &responses);
        assert_eq!(snapshot.time_series.len(), 2);
        assert_eq!(snapshot.time_series[0].date, day1.date_naive());
        assert_eq!(snapshot.time_series[0].count, 1);
        assert_eq!(snapshot.time_series[1].count, 2);
    }

    #[tokio::test]
    async fn redelivered_event_does_not_double_increment() {
        let mut store = MemoryStore::new();
        let user = UserInfo { id: "user-1".into() };
        let draft = DraftSnapshot {
            title: "Course feedback".into(),
            questions: vec![question("q1", false, QuestionKind::YesNo)],
            ..DraftSnapshot::default()
        };
        let survey_id = save_draft(&mut store, Some(&user), &draft).await.unwrap();
        let response_id = ResponseCommon::insert(
            &mut store,
            ResponseInsert {
                survey_id,
                answers: [("q1".to_string(), json!(true))].into_iter().collect(),
                metadata: ResponseMetadata {
                    user_agent: "test-agent".into(),
                    ip_address: None,
                    location: None,
                    duration_seconds: 12.0,
                    device_type: DeviceType::Desktop,
                },
                user_id: None,
                anonymous_id: Some("anon-1".into()),
            },
        )
        .await
        .unwrap();

        aggregate_response(&mut store, survey_id, response_id).await.unwrap();
        aggregate_response(&mut store, survey_id, response_id).await.unwrap();

        let survey = SurveyCommon::get(&mut store, survey_id).await.unwrap().unwrap();
        assert_eq!(survey.response_count, 1);
        let snapshot = AnalyticsCommon::get_snapshot(&mut store, survey_id).await.unwrap().unwrap();
        assert_eq!(snapshot.total_responses, 1);
    }

    #[tokio::test]
    async fn snapshot_outage_does_not_fail_the_event() {
        let mut store = MemoryStore::new();
        let user = UserInfo { id: "user-1".into() };
        let draft = DraftSnapshot {
            title: "Course feedback".into(),
            questions: vec![question("q1", false, QuestionKind::YesNo)],
            ..DraftSnapshot::default()
        };
        let survey_id = save_draft(&mut store, Some(&user), &draft).await.unwrap();
        let response_id = ResponseCommon::insert(
            &mut store,
            ResponseInsert {
                survey_id,
                answers: [("q1".to_string(), json!(true))].into_iter().collect(),
                metadata: ResponseMetadata {
                    user_agent: "test-agent".into(),
                    ip_address: None,
                    location: None,
                    duration_seconds: 12.0,
                    device_type: DeviceType::Desktop,
                },
                user_id: None,
                anonymous_id: Some("anon-1".into()),
            },
        )
        .await
        .unwrap();

        store.break_snapshot_writes();
        aggregate_response(&mut store, survey_id, response_id).await.unwrap();

        // counted, but no snapshot until the next successful recomputation
        let survey = SurveyCommon::get(&mut store, survey_id).await.unwrap().unwrap();
        assert_eq!(survey.response_count, 1);
        assert!(AnalyticsCommon::get_snapshot(&mut store, survey_id).await.unwrap().is_none());
    }
}
