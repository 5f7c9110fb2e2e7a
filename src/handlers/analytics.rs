use crate::core::models::analytics::AnalyticsSnapshot;
use crate::core::services;
use crate::error::Error;
use crate::impls::store::postgres::PgStore;
use actix_web::web::{Data, Json, Path};
use sqlx::PgPool;
use uuid::Uuid;

/// Recomputes the snapshot from the full response set, refreshes the cached
/// copy and returns it.
pub async fn generate(survey_id: Path<Uuid>, db: Data<PgPool>) -> Result<Json<AnalyticsSnapshot>, Error> {
    let mut store = PgStore::new(db.get_ref().clone());
    let snapshot = services::analytics::refresh_snapshot(&mut store, survey_id.into_inner()).await?;
    Ok(Json(snapshot))
}
