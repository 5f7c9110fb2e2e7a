use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One selectable option of a choice-like question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleConfig {
    pub min: i64,
    pub max: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<i64, String>,
}

/// Type tag plus the payload fields that are valid for that type. Making the
/// payload part of the variant keeps "which fields apply to which type" out of
/// runtime convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<ChoiceOption>,
    },
    Dropdown {
        options: Vec<ChoiceOption>,
    },
    Scale {
        scale: ScaleConfig,
    },
    Rating {
        scale: ScaleConfig,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validation_message: Option<String>,
    },
    YesNo,
    Date,
    Time,
}

impl QuestionKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
            QuestionKind::Dropdown { .. } => "dropdown",
            QuestionKind::Scale { .. } => "scale",
            QuestionKind::Rating { .. } => "rating",
            QuestionKind::Text { .. } => "text",
            QuestionKind::YesNo => "yes_no",
            QuestionKind::Date => "date",
            QuestionKind::Time => "time",
        }
    }
}

/// A single editable survey question. The id is an opaque client-generated
/// string, stable across reorders and edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// Field-level merge for `update`: only the fields present are overwritten,
/// everything else (including list position) stays as is.
#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
    pub kind: Option<QuestionKind>,
}

impl Question {
    pub fn apply(&mut self, patch: QuestionPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(required) = patch.required {
            self.required = required;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_round_trips_wire_tags() {
        let q = Question {
            id: "q1".into(),
            title: "How did you hear about us?".into(),
            description: None,
            required: true,
            kind: QuestionKind::Dropdown {
                options: vec![ChoiceOption {
                    id: "o1".into(),
                    label: "A friend".into(),
                    value: "friend".into(),
                    image_url: None,
                }],
            },
        };
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["type"], "dropdown");
        assert_eq!(value["options"][0]["value"], "friend");
        let back: Question = serde_json::from_value(value).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn text_payload_uses_camel_case_fields() {
        let q = Question {
            id: "q2".into(),
            title: "Anything else?".into(),
            description: None,
            required: false,
            kind: QuestionKind::Text {
                placeholder: Some("Type here".into()),
                max_length: Some(500),
                pattern: None,
                validation_message: None,
            },
        };
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["maxLength"], 500);
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut q = Question {
            id: "q3".into(),
            title: "old".into(),
            description: Some("desc".into()),
            required: false,
            kind: QuestionKind::YesNo,
        };
        q.apply(QuestionPatch {
            title: Some("new".into()),
            ..QuestionPatch::default()
        });
        assert_eq!(q.title, "new");
        assert_eq!(q.description.as_deref(), Some("desc"));
        assert!(!q.required);
        assert_eq!(q.kind, QuestionKind::YesNo);
    }
}
