use crate::context::UserInfo;
use crate::core::draft::{DraftSnapshot, QuestionList};
use crate::core::models::{
    common::Pagination,
    survey::{Survey, SurveyInsert, SurveyQuery, SurveyStatus, SurveyUpdate},
};
use crate::core::ports::repository::{Store, SurveyCommon};
use crate::error::Error;
use chrono::Utc;
use uuid::Uuid;

/// Upserts the draft into remote storage. Validation and the authentication
/// check both run before anything touches the store; a draft without a bound
/// id creates a new record, a draft carrying one overwrites that record's
/// mutable fields (last write wins).
pub async fn save_draft<S>(store: &mut S, user: Option<&UserInfo>, draft: &DraftSnapshot) -> Result<Uuid, Error>
where
    S: Store,
{
    if draft.title.trim().is_empty() {
        return Err(Error::Validation("survey title must not be empty".into()));
    }
    let user = user.ok_or(Error::Unauthenticated)?;
    let questions = QuestionList::from_questions(draft.questions.clone())?;
    match draft.current_survey_id {
        Some(id) => {
            let existing = SurveyCommon::get(store, id).await?.ok_or_else(|| Error::NotFound(format!("survey {id}")))?;
            if existing.user_id != user.id {
                return Err(Error::PermissionDenied);
            }
            SurveyCommon::update(
                store,
                id,
                SurveyUpdate {
                    title: draft.title.clone(),
                    description: draft.description.clone(),
                    questions: questions.to_vec(),
                    settings: draft.settings.clone(),
                },
            )
            .await?;
            Ok(id)
        }
        None => {
            SurveyCommon::insert(
                store,
                SurveyInsert {
                    title: draft.title.clone(),
                    description: draft.description.clone(),
                    questions: questions.to_vec(),
                    settings: draft.settings.clone(),
                    user_id: user.id.clone(),
                },
            )
            .await
        }
    }
}

pub async fn publish_survey<S>(store: &mut S, user: &UserInfo, id: Uuid) -> Result<(), Error>
where
    S: Store,
{
    let survey = SurveyCommon::get(store, id).await?.ok_or_else(|| Error::NotFound(format!("survey {id}")))?;
    if survey.user_id != user.id {
        return Err(Error::PermissionDenied);
    }
    let updated = SurveyCommon::set_status(store, id, SurveyStatus::Published, Some(Utc::now())).await?;
    if !updated {
        return Err(Error::NotFound(format!("survey {id}")));
    }
    Ok(())
}

pub async fn load_survey<S>(store: &mut S, id: Uuid) -> Result<Survey, Error>
where
    S: Store,
{
    SurveyCommon::get(store, id).await?.ok_or_else(|| Error::NotFound(format!("survey {id}")))
}

pub async fn list_surveys<S>(store: &mut S, user: &UserInfo, pagination: Pagination) -> Result<(Vec<Survey>, i64), Error>
where
    S: Store,
{
    let query = SurveyQuery {
        user_id_eq: Some(user.id.clone()),
        status_eq: None,
    };
    let total = SurveyCommon::count(store, &query).await?;
    let surveys = SurveyCommon::query(store, &query, Some(pagination)).await?;
    Ok((surveys, total))
}
