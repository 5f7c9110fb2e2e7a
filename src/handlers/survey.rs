use crate::context::UserInfo;
use crate::core::draft::DraftSnapshot;
use crate::core::models::{common::Pagination, survey::Survey};
use crate::core::ports::cache::DraftCache;
use crate::core::services;
use crate::error::Error;
use crate::impls::cache::local_file::LocalFileCache;
use crate::impls::store::postgres::PgStore;
use crate::response::{Created, List};
use actix_web::web::{Data, Json, Path, Query};
use actix_web::HttpResponse;
use log::warn;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

async fn upsert(user: UserInfo, draft: DraftSnapshot, db: Data<PgPool>, cache: Data<LocalFileCache>) -> Result<Json<Created>, Error> {
    // keep a local copy first so a failed remote write can be retried
    if let Err(e) = cache.store(&draft) {
        warn!("failed to cache draft locally: {e}");
    }
    let mut store = PgStore::new(db.get_ref().clone());
    let id = services::draft::save_draft(&mut store, Some(&user), &draft).await?;
    if let Err(e) = cache.clear() {
        warn!("failed to clear draft cache: {e}");
    }
    Ok(Json(Created { id }))
}

pub async fn save(user: UserInfo, Json(draft): Json<DraftSnapshot>, db: Data<PgPool>, cache: Data<LocalFileCache>) -> Result<Json<Created>, Error> {
    upsert(user, draft, db, cache).await
}

/// Hands back the locally cached draft left behind by a failed save, or null
/// when there is nothing to pick up.
pub async fn recover_draft(_user: UserInfo, cache: Data<LocalFileCache>) -> Result<Json<Option<DraftSnapshot>>, Error> {
    Ok(Json(cache.load()?))
}

pub async fn save_existing(
    user: UserInfo,
    survey_id: Path<Uuid>,
    Json(mut draft): Json<DraftSnapshot>,
    db: Data<PgPool>,
    cache: Data<LocalFileCache>,
) -> Result<Json<Created>, Error> {
    draft.current_survey_id = Some(survey_id.into_inner());
    upsert(user, draft, db, cache).await
}

pub async fn publish(user: UserInfo, survey_id: Path<Uuid>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    let mut store = PgStore::new(db.get_ref().clone());
    services::draft::publish_survey(&mut store, &user, survey_id.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn detail(survey_id: Path<Uuid>, db: Data<PgPool>) -> Result<Json<Survey>, Error> {
    let mut store = PgStore::new(db.get_ref().clone());
    let survey = services::draft::load_survey(&mut store, survey_id.into_inner()).await?;
    Ok(Json(survey))
}

#[derive(Debug, Deserialize)]
pub struct ListParam {
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_size")]
    size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    20
}

pub async fn list(user: UserInfo, param: Query<ListParam>, db: Data<PgPool>) -> Result<Json<List<Survey>>, Error> {
    let mut store = PgStore::new(db.get_ref().clone());
    let (surveys, total) = services::draft::list_surveys(
        &mut store,
        &user,
        Pagination {
            page: param.page,
            size: param.size,
        },
    )
    .await?;
    Ok(Json(List::new(surveys, total)))
}
