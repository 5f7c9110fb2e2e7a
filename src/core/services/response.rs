use crate::core::models::{
    response::ResponseInsert,
    survey::{Survey, SurveyStatus},
};
use crate::core::ports::repository::{ResponseCommon, Store, SurveyCommon};
use crate::core::services::analytics;
use crate::error::Error;
use chrono::Utc;
use uuid::Uuid;

/// Accepts one submission: validates the survey is published and open,
/// enforces the respondent-identity settings, persists the immutable response
/// record, then runs the aggregator for its create event.
pub async fn submit_response<S>(store: &mut S, data: ResponseInsert) -> Result<Uuid, Error>
where
    S: Store,
{
    let survey_id = data.survey_id;
    let survey = SurveyCommon::get(store, survey_id).await?.ok_or_else(|| Error::NotFound(format!("survey {survey_id}")))?;

    match survey.status {
        SurveyStatus::Draft => return Err(Error::Validation("survey is not published".into())),
        SurveyStatus::Closed => return Err(Error::Validation("survey is closed".into())),
        SurveyStatus::Published => {}
    }

    let now = Utc::now();
    if let Some(start) = survey.settings.start_date {
        if now < start {
            return Err(Error::Validation("survey is not open yet".into()));
        }
    }
    if let Some(end) = survey.settings.end_date {
        if now > end {
            close_survey(store, &survey).await?;
            return Err(Error::Validation("survey response window has ended".into()));
        }
    }
    if let Some(max) = survey.settings.max_responses {
        if survey.response_count >= max {
            close_survey(store, &survey).await?;
            return Err(Error::Validation("survey reached its maximum response count".into()));
        }
    }

    if (survey.settings.require_login || !survey.settings.allow_anonymous) && data.user_id.is_none() {
        return Err(Error::Unauthenticated);
    }
    if data.user_id.is_none() && data.anonymous_id.is_none() {
        return Err(Error::Validation("either a user id or an anonymous id is required".into()));
    }
    for question_id in data.answers.keys() {
        if !survey.questions.iter().any(|q| &q.id == question_id) {
            return Err(Error::Validation(format!("answer references unknown question {question_id}")));
        }
    }

    let response_id = ResponseCommon::insert(store, data).await?;
    analytics::aggregate_response(store, survey_id, response_id).await?;
    Ok(response_id)
}

async fn close_survey<S>(store: &mut S, survey: &Survey) -> Result<(), Error>
where
    S: Store,
{
    SurveyCommon::set_status(store, survey.id, SurveyStatus::Closed, None).await?;
    Ok(())
}
