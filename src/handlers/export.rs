use crate::core::services;
use crate::error::Error;
use crate::impls::renderer::pdf::PdfRenderer;
use crate::impls::store::postgres::PgStore;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParam {
    #[serde(default = "default_include_charts")]
    pub include_charts: bool,
}

fn default_include_charts() -> bool {
    true
}

pub async fn pdf(survey_id: Path<Uuid>, body: Option<Json<ExportParam>>, db: Data<PgPool>, renderer: Data<PdfRenderer>) -> Result<HttpResponse, Error> {
    let survey_id = survey_id.into_inner();
    let include_charts = body.map(|b| b.include_charts).unwrap_or(true);
    let mut store = PgStore::new(db.get_ref().clone());
    let bytes = services::export::export_pdf(&mut store, renderer.get_ref(), survey_id, include_charts).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(("Content-Disposition", format!("attachment; filename=\"survey-{survey_id}.pdf\"")))
        .body(bytes))
}
