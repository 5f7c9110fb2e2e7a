use crate::core::models::response::{ResponseInsert, ResponseMetadata};
use crate::core::services;
use crate::error::Error;
use crate::impls::store::postgres::PgStore;
use crate::response::Created;
use actix_web::web::{Data, Json, Path};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub answers: BTreeMap<String, serde_json::Value>,
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub anonymous_id: Option<String>,
}

pub async fn submit(survey_id: Path<Uuid>, Json(submission): Json<Submission>, db: Data<PgPool>) -> Result<Json<Created>, Error> {
    let mut store = PgStore::new(db.get_ref().clone());
    let id = services::response::submit_response(
        &mut store,
        ResponseInsert {
            survey_id: survey_id.into_inner(),
            answers: submission.answers,
            metadata: submission.metadata,
            user_id: submission.user_id,
            anonymous_id: submission.anonymous_id,
        },
    )
    .await?;
    Ok(Json(Created { id }))
}
