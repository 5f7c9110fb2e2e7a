use crate::core::models::{analytics::AnalyticsSnapshot, survey::Survey};
use crate::core::ports::renderer::DocumentRenderer;
use crate::core::question::QuestionKind;
use crate::error::Error;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 18.0;
const TOP: f32 = PAGE_HEIGHT - 20.0;
const BOTTOM: f32 = 20.0;
const LINE_HEIGHT: f32 = 6.0;

/// printpdf-backed renderer: survey structure as text, one question per
/// block, aggregate numbers per question when analytics are included.
pub struct PdfRenderer;

struct Cursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl Cursor {
    fn new(title: &str) -> Result<Self, Error> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| Error::Export(e.to_string()))?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(|e| Error::Export(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: TOP,
        })
    }

    fn advance(&mut self) {
        if self.y < BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
    }

    fn heading(&mut self, text: &str) {
        self.advance();
        self.layer.use_text(text, 14.0, Mm(MARGIN_LEFT), Mm(self.y), &self.bold);
        self.y -= LINE_HEIGHT * 1.5;
    }

    fn line(&mut self, text: &str) {
        self.advance();
        self.layer.use_text(text, 10.0, Mm(MARGIN_LEFT), Mm(self.y), &self.regular);
        self.y -= LINE_HEIGHT;
    }

    fn indented(&mut self, text: &str) {
        self.advance();
        self.layer.use_text(text, 10.0, Mm(MARGIN_LEFT + 6.0), Mm(self.y), &self.regular);
        self.y -= LINE_HEIGHT;
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }

    fn finish(self) -> Result<Vec<u8>, Error> {
        self.doc.save_to_bytes().map_err(|e| Error::Export(e.to_string()))
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, survey: &Survey, analytics: Option<&AnalyticsSnapshot>) -> Result<Vec<u8>, Error> {
        let mut cursor = Cursor::new(&survey.title)?;

        cursor.heading(&survey.title);
        if !survey.description.is_empty() {
            cursor.line(&survey.description);
        }
        cursor.line(&format!("Status: {} | Responses: {}", survey.status.as_str(), survey.response_count));
        cursor.gap();

        if let Some(snapshot) = analytics {
            cursor.heading("Summary");
            cursor.line(&format!("Total responses: {}", snapshot.total_responses));
            cursor.line(&format!("Completion rate: {:.0}%", snapshot.completion_rate * 100.0));
            cursor.line(&format!("Average duration: {:.1}s", snapshot.average_duration));
            cursor.line(&format!(
                "Devices: {} mobile / {} tablet / {} desktop",
                snapshot.device_breakdown.mobile, snapshot.device_breakdown.tablet, snapshot.device_breakdown.desktop
            ));
            cursor.gap();
        }

        for (idx, question) in survey.questions.iter().enumerate() {
            let required = if question.required { " *" } else { "" };
            cursor.line(&format!("{}. [{}] {}{}", idx + 1, question.kind.type_tag(), question.title, required));
            if let Some(description) = &question.description {
                cursor.indented(description);
            }
            match &question.kind {
                QuestionKind::MultipleChoice { options } | QuestionKind::Dropdown { options } => {
                    for option in options {
                        cursor.indented(&format!("- {}", option.label));
                    }
                }
                QuestionKind::Scale { scale } | QuestionKind::Rating { scale } => {
                    cursor.indented(&format!("{} to {}", scale.min, scale.max));
                }
                _ => {}
            }
            if let Some(aggregate) = analytics.and_then(|s| s.question_analytics.get(&question.id)) {
                cursor.indented(&format!("answers: {}", aggregate.total_answers()));
            }
            cursor.gap();
        }

        cursor.finish()
    }
}
