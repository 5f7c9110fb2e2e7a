use crate::core::ports::renderer::DocumentRenderer;
use crate::core::ports::repository::{AnalyticsCommon, Store, SurveyCommon};
use crate::error::Error;
use uuid::Uuid;

/// Fetches the survey's current state (and the cached analytics when charts
/// are requested) and delegates rendering to the configured library.
pub async fn export_pdf<S, R>(store: &mut S, renderer: &R, survey_id: Uuid, include_charts: bool) -> Result<Vec<u8>, Error>
where
    S: Store,
    R: DocumentRenderer,
{
    let survey = SurveyCommon::get(store, survey_id).await?.ok_or_else(|| Error::NotFound(format!("survey {survey_id}")))?;
    let analytics = if include_charts {
        AnalyticsCommon::get_snapshot(store, survey_id).await?
    } else {
        None
    };
    renderer.render(&survey, analytics.as_ref())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::UserInfo;
    use crate::core::draft::DraftSnapshot;
    use crate::core::models::{analytics::AnalyticsSnapshot, survey::Survey};
    use crate::core::services::draft::save_draft;
    use crate::impls::store::memory::MemoryStore;

    struct RecordingRenderer;

    impl DocumentRenderer for RecordingRenderer {
        fn render(&self, survey: &Survey, analytics: Option<&AnalyticsSnapshot>) -> Result<Vec<u8>, Error> {
            Ok(format!("{}:{}", survey.title, analytics.is_some()).into_bytes())
        }
    }

    #[tokio::test]
    async fn charts_are_skipped_when_not_requested() {
        let mut store = MemoryStore::new();
        let user = UserInfo { id: "user-1".into() };
        let draft = DraftSnapshot {
            title: "Course feedback".into(),
            ..DraftSnapshot::default()
        };
        let id = save_draft(&mut store, Some(&user), &draft).await.unwrap();

        let bytes = export_pdf(&mut store, &RecordingRenderer, id, false).await.unwrap();
        assert_eq!(bytes, b"Course feedback:false");
    }

    #[tokio::test]
    async fn absent_survey_is_not_found() {
        let mut store = MemoryStore::new();
        let result = export_pdf(&mut store, &RecordingRenderer, Uuid::new_v4(), true).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
