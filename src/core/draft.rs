use crate::core::question::{Question, QuestionPatch};
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::survey::Survey;

/// Name of the single entry the draft snapshot is persisted under.
pub const STORAGE_KEY: &str = "survey-storage";

/// Ordered, uniquely-keyed sequence of questions. Order is the order shown to
/// responders; every mutation keeps ids unique and leaves no dangling
/// reference. Each operation is a total function from one consistent list to
/// another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionList {
    items: Vec<Question>,
}

impl QuestionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a list from stored questions, re-checking the uniqueness
    /// invariant rather than trusting the payload.
    pub fn from_questions(items: Vec<Question>) -> Result<Self, Error> {
        let mut list = Self::new();
        for q in items {
            list.append(q)?;
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Question] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<Question> {
        self.items.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.items.iter().find(|q| q.id == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|q| q.id == id)
    }

    /// Inserts at the end. Rejected without mutation when the id is already
    /// present.
    pub fn append(&mut self, question: Question) -> Result<(), Error> {
        if self.index_of(&question.id).is_some() {
            return Err(Error::Validation(format!("duplicate question id {}", question.id)));
        }
        self.items.push(question);
        Ok(())
    }

    /// Merges the patch into the matching question, position untouched.
    pub fn update(&mut self, id: &str, patch: QuestionPatch) -> Result<(), Error> {
        match self.items.iter_mut().find(|q| q.id == id) {
            Some(q) => {
                q.apply(patch);
                Ok(())
            }
            None => Err(Error::NotFound(format!("question {id}"))),
        }
    }

    /// Removes the matching question; later elements shift down one slot.
    /// Returns false (list untouched) when the id is absent.
    pub fn delete(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Relocates `from_id` to the slot `to_id` occupies once `from_id` has
    /// been taken out: remove at the source index, look the target index up
    /// again, insert there. The second lookup is what makes dragging an item
    /// past its neighbor land where the pointer dropped it.
    ///
    /// `[A,B,C,D]` + `move(A,C)` gives `[B,A,C,D]`, not `[B,C,A,D]`.
    ///
    /// Returns false (list untouched, byte for byte) when `from_id == to_id`
    /// or either id is absent.
    pub fn move_question(&mut self, from_id: &str, to_id: &str) -> bool {
        if from_id == to_id {
            return false;
        }
        let from_idx = match self.index_of(from_id) {
            Some(idx) => idx,
            None => return false,
        };
        if self.index_of(to_id).is_none() {
            return false;
        }
        let moved = self.items.remove(from_idx);
        match self.index_of(to_id) {
            Some(to_idx) => {
                self.items.insert(to_idx, moved);
                true
            }
            // unreachable given the check above, but restore rather than panic
            None => {
                self.items.insert(from_idx, moved);
                false
            }
        }
    }
}

/// Survey-level flags. Defaults mirror what a fresh draft starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurveySettings {
    pub allow_anonymous: bool,
    pub show_progress: bool,
    pub one_question_per_page: bool,
    pub require_login: bool,
    pub randomize_questions: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_responses: Option<i64>,
}

impl Default for SurveySettings {
    fn default() -> Self {
        Self {
            allow_anonymous: true,
            show_progress: true,
            one_question_per_page: true,
            require_login: false,
            randomize_questions: false,
            start_date: None,
            end_date: None,
            max_responses: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub allow_anonymous: Option<bool>,
    pub show_progress: Option<bool>,
    pub one_question_per_page: Option<bool>,
    pub require_login: Option<bool>,
    pub randomize_questions: Option<bool>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub max_responses: Option<Option<i64>>,
}

impl SurveySettings {
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.allow_anonymous {
            self.allow_anonymous = v;
        }
        if let Some(v) = patch.show_progress {
            self.show_progress = v;
        }
        if let Some(v) = patch.one_question_per_page {
            self.one_question_per_page = v;
        }
        if let Some(v) = patch.require_login {
            self.require_login = v;
        }
        if let Some(v) = patch.randomize_questions {
            self.randomize_questions = v;
        }
        if let Some(v) = patch.start_date {
            self.start_date = v;
        }
        if let Some(v) = patch.end_date {
            self.end_date = v;
        }
        if let Some(v) = patch.max_responses {
            self.max_responses = v;
        }
    }
}

/// The persisted shape of an in-progress draft: exactly the fields that
/// survive a reload, stored under [`STORAGE_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub settings: SurveySettings,
    #[serde(default)]
    pub current_survey_id: Option<Uuid>,
}

type Observer = Box<dyn FnMut(&[Question])>;

/// In-memory draft editor. Owns the in-progress survey exclusively; mutation
/// operations run synchronously in the caller's turn and perform no I/O.
/// Observers are invoked with the new question list before the mutating call
/// returns.
#[derive(Default)]
pub struct DraftStore {
    title: String,
    description: String,
    questions: QuestionList,
    settings: SurveySettings,
    current_survey_id: Option<Uuid>,
    observers: Vec<Observer>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn questions(&self) -> &QuestionList {
        &self.questions
    }

    pub fn settings(&self) -> &SurveySettings {
        &self.settings
    }

    pub fn current_survey_id(&self) -> Option<Uuid> {
        self.current_survey_id
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&[Question]) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self) {
        let Self { questions, observers, .. } = self;
        for obs in observers.iter_mut() {
            obs(questions.as_slice());
        }
    }

    pub fn add_question(&mut self, question: Question) -> Result<(), Error> {
        self.questions.append(question)?;
        self.notify();
        Ok(())
    }

    pub fn update_question(&mut self, id: &str, patch: QuestionPatch) -> Result<(), Error> {
        self.questions.update(id, patch)?;
        self.notify();
        Ok(())
    }

    pub fn delete_question(&mut self, id: &str) {
        if self.questions.delete(id) {
            self.notify();
        }
    }

    pub fn reorder_questions(&mut self, from_id: &str, to_id: &str) {
        if self.questions.move_question(from_id, to_id) {
            self.notify();
        }
    }

    pub fn merge_settings(&mut self, patch: SettingsPatch) {
        self.settings.apply(patch);
    }

    /// Replaces the whole editor state with a stored survey, order preserved
    /// exactly as persisted.
    pub fn load(&mut self, survey: Survey) -> Result<(), Error> {
        self.title = survey.title;
        self.description = survey.description;
        self.questions = QuestionList::from_questions(survey.questions)?;
        self.settings = survey.settings;
        self.current_survey_id = Some(survey.id);
        self.notify();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.title = String::new();
        self.description = String::new();
        self.questions = QuestionList::new();
        self.settings = SurveySettings::default();
        self.current_survey_id = None;
        self.notify();
    }

    pub fn bind_survey_id(&mut self, id: Uuid) {
        self.current_survey_id = Some(id);
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            title: self.title.clone(),
            description: self.description.clone(),
            questions: self.questions.to_vec(),
            settings: self.settings.clone(),
            current_survey_id: self.current_survey_id,
        }
    }

    pub fn restore(snapshot: DraftSnapshot) -> Result<Self, Error> {
        Ok(Self {
            title: snapshot.title,
            description: snapshot.description,
            questions: QuestionList::from_questions(snapshot.questions)?,
            settings: snapshot.settings,
            current_survey_id: snapshot.current_survey_id,
            observers: Vec::new(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::question::QuestionKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn q(id: &str) -> Question {
        Question {
            id: id.into(),
            title: format!("question {id}"),
            description: None,
            required: false,
            kind: QuestionKind::YesNo,
        }
    }

    fn list_of(ids: &[&str]) -> QuestionList {
        QuestionList::from_questions(ids.iter().map(|id| q(id)).collect()).unwrap()
    }

    fn ids(list: &QuestionList) -> Vec<&str> {
        list.as_slice().iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn append_rejects_duplicate_id_without_mutation() {
        let mut list = list_of(&["a", "b"]);
        let before = list.clone();
        assert!(list.append(q("a")).is_err());
        assert_eq!(list, before);
    }

    #[test]
    fn move_uses_target_index_after_removal() {
        // the pinned worked example: [A,B,C,D] + move(A,C) -> [B,A,C,D]
        let mut list = list_of(&["a", "b", "c", "d"]);
        assert!(list.move_question("a", "c"));
        assert_eq!(ids(&list), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn move_past_immediate_neighbor_in_both_directions() {
        // dragging up one slot lands before the neighbor
        let mut list = list_of(&["a", "b", "c"]);
        assert!(list.move_question("b", "a"));
        assert_eq!(ids(&list), vec!["b", "a", "c"]);

        // dragging down onto the immediate next slot is an identity under the
        // post-removal rule: once A is out, B already sits at A's old index
        let mut list = list_of(&["a", "b", "c"]);
        assert!(list.move_question("a", "b"));
        assert_eq!(ids(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn move_is_not_an_involution() {
        // move(a,c) then move(c,a) does not restore the original order
        let mut list = list_of(&["a", "b", "c", "d"]);
        list.move_question("a", "c");
        assert_eq!(ids(&list), vec!["b", "a", "c", "d"]);
        list.move_question("c", "a");
        assert_eq!(ids(&list), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn move_onto_itself_is_a_no_op() {
        let mut list = list_of(&["a", "b", "c"]);
        let before = list.clone();
        assert!(!list.move_question("b", "b"));
        assert_eq!(list, before);
    }

    #[test]
    fn move_with_absent_id_leaves_list_unchanged() {
        let mut list = list_of(&["a", "b", "c"]);
        let before = list.clone();
        assert!(!list.move_question("a", "zzz"));
        assert_eq!(list, before);
        assert!(!list.move_question("zzz", "a"));
        assert_eq!(list, before);
    }

    #[test]
    fn delete_removes_only_the_matching_id() {
        let mut list = list_of(&["a", "b", "c"]);
        assert!(list.delete("b"));
        assert_eq!(ids(&list), vec!["a", "c"]);
        assert!(!list.delete("b"));
    }

    #[test]
    fn append_then_delete_restores_the_prior_list() {
        let mut list = list_of(&["a", "b"]);
        let before = list.clone();
        list.append(q("c")).unwrap();
        assert!(list.delete("c"));
        assert_eq!(list, before);
    }

    #[test]
    fn update_preserves_position_and_untouched_fields() {
        let mut list = list_of(&["a", "b", "c"]);
        list.update(
            "b",
            QuestionPatch {
                title: Some("renamed".into()),
                ..QuestionPatch::default()
            },
        )
        .unwrap();
        assert_eq!(ids(&list), vec!["a", "b", "c"]);
        let b = list.get("b").unwrap();
        assert_eq!(b.title, "renamed");
        assert!(!b.required);
    }

    #[test]
    fn update_absent_id_signals_not_found() {
        let mut list = list_of(&["a"]);
        let before = list.clone();
        assert!(list.update("zzz", QuestionPatch::default()).is_err());
        assert_eq!(list, before);
    }

    #[test]
    fn from_questions_rechecks_uniqueness() {
        let result = QuestionList::from_questions(vec![q("a"), q("a")]);
        assert!(result.is_err());
    }

    #[test]
    fn observers_see_every_list_mutation_synchronously() {
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut store = DraftStore::new();
        store.subscribe(move |qs| {
            sink.borrow_mut().push(qs.iter().map(|q| q.id.clone()).collect());
        });

        store.add_question(q("a")).unwrap();
        store.add_question(q("b")).unwrap();
        store.reorder_questions("b", "a");
        store.delete_question("a");

        let seen = seen.borrow();
        assert_eq!(*seen, vec![vec!["a".to_string()], vec!["a".into(), "b".into()], vec!["b".into(), "a".into()], vec!["b".into()]]);
    }

    #[test]
    fn no_op_mutations_do_not_notify() {
        let count = Rc::new(RefCell::new(0usize));
        let sink = count.clone();
        let mut store = DraftStore::new();
        store.add_question(q("a")).unwrap();
        store.subscribe(move |_| *sink.borrow_mut() += 1);

        store.delete_question("zzz");
        store.reorder_questions("a", "a");
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn snapshot_restores_the_editor_state() {
        let mut store = DraftStore::new();
        store.set_title("Course feedback");
        store.add_question(q("a")).unwrap();
        store.add_question(q("b")).unwrap();
        store.merge_settings(SettingsPatch {
            max_responses: Some(Some(100)),
            ..SettingsPatch::default()
        });

        let snapshot = store.snapshot();
        let restored = DraftStore::restore(snapshot.clone()).unwrap();
        assert_eq!(restored.title(), "Course feedback");
        assert_eq!(restored.settings().max_responses, Some(100));
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn clear_resets_to_a_fresh_draft() {
        let mut store = DraftStore::new();
        store.set_title("something");
        store.add_question(q("a")).unwrap();
        store.bind_survey_id(Uuid::new_v4());
        store.clear();
        assert_eq!(store.title(), "");
        assert!(store.questions().is_empty());
        assert_eq!(store.current_survey_id(), None);
        assert_eq!(*store.settings(), SurveySettings::default());
    }
}
