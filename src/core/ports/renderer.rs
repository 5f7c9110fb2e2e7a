use crate::core::models::{analytics::AnalyticsSnapshot, survey::Survey};
use crate::error::Error;

/// Renders a survey (optionally with its cached analytics) into a downloadable
/// document. The concrete library behind this is an external collaborator.
pub trait DocumentRenderer {
    fn render(&self, survey: &Survey, analytics: Option<&AnalyticsSnapshot>) -> Result<Vec<u8>, Error>;
}
