//! Application list, cards and the add/edit form.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::datetime::{Clock, DeadlineState};
use crate::error::StateError;
use crate::filter::ApplicationFilter;
use crate::model::{
    Application, ApplicationKind, ApplicationStatus, ChecklistItem, Document, Priority, new_id,
};
use crate::state::AppState;
use crate::views::dashboard::URGENT_DAYS;

const REQUIREMENT_PREVIEW: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationCard {
    pub id: String,
    pub name: String,
    pub kind: ApplicationKind,
    pub status: ApplicationStatus,
    pub priority: Priority,
    pub deadline: NaiveDate,
    pub location: Option<String>,
    pub days_until: i64,
    pub deadline_state: DeadlineState,
    pub overdue: bool,
    pub urgent: bool,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub progress: f64,
    pub requirements_preview: Vec<String>,
    pub more_requirements: usize,
}

impl ApplicationCard {
    pub fn from_application(app: &Application, clock: &Clock) -> Self {
        let days_until = clock.days_until(app.deadline);
        Self {
            id: app.id.clone(),
            name: app.name.clone(),
            kind: app.kind,
            status: app.status,
            priority: app.priority,
            deadline: app.deadline,
            location: app.location.clone().filter(|loc| !loc.is_empty()),
            days_until,
            deadline_state: DeadlineState::from_days(days_until),
            overdue: days_until < 0,
            urgent: (0..=URGENT_DAYS).contains(&days_until),
            completed_tasks: app.completed_tasks(),
            total_tasks: app.checklist.len(),
            progress: app.progress_percent(),
            requirements_preview: app
                .requirements
                .iter()
                .take(REQUIREMENT_PREVIEW)
                .cloned()
                .collect(),
            more_requirements: app.requirements.len().saturating_sub(REQUIREMENT_PREVIEW),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplicationsModel {
    pub cards: Vec<ApplicationCard>,
    pub filter_active: bool,
}

impl ApplicationsModel {
    pub fn empty_message(&self) -> &'static str {
        if self.filter_active {
            "Try adjusting your filters to see more results."
        } else {
            "Get started by adding your first college or scholarship application."
        }
    }
}

pub struct ApplicationsView<'a> {
    state: &'a AppState,
    filter: ApplicationFilter,
}

impl<'a> ApplicationsView<'a> {
    pub fn new(state: &'a AppState, filter: ApplicationFilter) -> Self {
        Self { state, filter }
    }

    pub fn model(&self, clock: &Clock) -> ApplicationsModel {
        let cards = self
            .filter
            .apply(self.state.applications())
            .into_iter()
            .map(|app| ApplicationCard::from_application(app, clock))
            .collect();
        ApplicationsModel {
            cards,
            filter_active: self.filter.is_active(),
        }
    }
}

/// Form state for adding or editing one application.
///
/// Only name and deadline are required, and only here; nothing else is
/// validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationDraft {
    editing: Option<String>,
    pub name: String,
    pub kind: ApplicationKind,
    pub deadline: Option<NaiveDate>,
    pub status: ApplicationStatus,
    pub priority: Priority,
    pub location: String,
    pub category: String,
    pub notes: String,
    pub requirements: Vec<String>,
    pub checklist: Vec<ChecklistItem>,
    pub documents: Vec<Document>,
}

impl Default for ApplicationDraft {
    fn default() -> Self {
        Self {
            editing: None,
            name: String::new(),
            kind: ApplicationKind::College,
            deadline: None,
            status: ApplicationStatus::NotStarted,
            priority: Priority::Medium,
            location: String::new(),
            category: String::new(),
            notes: String::new(),
            requirements: vec![],
            checklist: vec![],
            documents: vec![],
        }
    }
}

impl ApplicationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(app: &Application) -> Self {
        Self {
            editing: Some(app.id.clone()),
            name: app.name.clone(),
            kind: app.kind,
            deadline: Some(app.deadline),
            status: app.status,
            priority: app.priority,
            location: app.location.clone().unwrap_or_default(),
            category: app.category.clone().unwrap_or_default(),
            notes: app.notes.clone(),
            requirements: app.requirements.clone(),
            checklist: app.checklist.clone(),
            documents: app.documents.clone(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Blank input is ignored.
    pub fn add_requirement(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.requirements.push(text.to_string());
        true
    }

    pub fn set_requirement(&mut self, index: usize, text: &str) -> bool {
        match self.requirements.get_mut(index) {
            Some(slot) => {
                *slot = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove_requirement(&mut self, index: usize) -> Option<String> {
        (index < self.requirements.len()).then(|| self.requirements.remove(index))
    }

    /// Returns the new item's id; blank input is ignored.
    pub fn add_checklist_item(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let item = ChecklistItem::new(text);
        let id = item.id.clone();
        self.checklist.push(item);
        Some(id)
    }

    pub fn remove_checklist_item(&mut self, id: &str) -> bool {
        let before = self.checklist.len();
        self.checklist.retain(|item| item.id != id);
        self.checklist.len() != before
    }

    pub fn toggle_checklist_item(&mut self, id: &str) -> bool {
        match self.checklist.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.completed = !item.completed;
                true
            }
            None => false,
        }
    }

    fn build(self) -> Result<Application, StateError> {
        if self.name.trim().is_empty() {
            return Err(StateError::MissingField("name"));
        }
        let deadline = self.deadline.ok_or(StateError::MissingField("deadline"))?;

        Ok(Application {
            id: self.editing.unwrap_or_else(new_id),
            name: self.name,
            kind: self.kind,
            deadline,
            status: self.status,
            requirements: self.requirements,
            documents: self.documents,
            notes: self.notes,
            checklist: self.checklist,
            priority: self.priority,
            location: Some(self.location).filter(|s| !s.is_empty()),
            category: Some(self.category).filter(|s| !s.is_empty()),
        })
    }

    /// Create a new application, or overwrite the one being edited.
    #[tracing::instrument(skip(self, state), fields(editing = self.editing.is_some()))]
    pub fn submit(self, state: &mut AppState) -> anyhow::Result<Application> {
        let editing = self.is_editing();
        let app = self.build()?;

        if editing {
            state.replace_application(app.clone())?;
            debug!(id = %app.id, "updated application");
        } else {
            state.add_application(app.clone())?;
            info!(id = %app.id, name = %app.name, "created application");
        }
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::Tz;

    use super::{ApplicationCard, ApplicationDraft, ApplicationsView};
    use crate::datetime::{Clock, DeadlineState};
    use crate::error::StateError;
    use crate::filter::ApplicationFilter;
    use crate::model::{ApplicationKind, ApplicationStatus};
    use crate::state::AppState;
    use crate::storage::MemoryStorage;

    fn clock() -> Clock {
        Clock::fixed(
            Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0)
                .single()
                .expect("valid now"),
            Tz::UTC,
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn draft_requires_name_and_deadline() {
        let mut state = AppState::open(Rc::new(MemoryStorage::new()));

        let draft = ApplicationDraft::new();
        let err = draft.submit(&mut state).expect_err("missing name");
        assert_eq!(
            err.downcast_ref::<StateError>(),
            Some(&StateError::MissingField("name"))
        );

        let draft = ApplicationDraft {
            name: "Stanford".to_string(),
            ..ApplicationDraft::new()
        };
        let err = draft.submit(&mut state).expect_err("missing deadline");
        assert_eq!(
            err.downcast_ref::<StateError>(),
            Some(&StateError::MissingField("deadline"))
        );
        assert!(state.applications().is_empty());
    }

    #[test]
    fn editing_keeps_id_and_checklist_changes() {
        let mut state = AppState::open(Rc::new(MemoryStorage::new()));
        let mut draft = ApplicationDraft {
            name: "Stanford".to_string(),
            deadline: Some(date(2026, 12, 1)),
            ..ApplicationDraft::new()
        };
        assert!(draft.add_requirement("  Essay  "));
        assert!(!draft.add_requirement("   "));
        let item = draft.add_checklist_item("Request transcript").expect("item id");
        let created = draft.submit(&mut state).expect("create");
        assert_eq!(created.requirements, vec!["Essay".to_string()]);
        assert_eq!(created.location, None);

        let mut edit = ApplicationDraft::edit(&created);
        assert!(edit.is_editing());
        assert!(edit.toggle_checklist_item(&item));
        edit.status = ApplicationStatus::InProgress;
        let updated = edit.submit(&mut state).expect("update");

        assert_eq!(updated.id, created.id);
        assert_eq!(state.applications().len(), 1);
        assert!(state.applications()[0].checklist[0].completed);
        assert_eq!(state.applications()[0].status, ApplicationStatus::InProgress);
        // Only creation is logged.
        assert_eq!(state.recent_activity().len(), 1);
    }

    #[test]
    fn card_flags_urgent_and_overdue() {
        let mut draft = ApplicationDraft {
            name: "MIT".to_string(),
            deadline: Some(date(2026, 10, 22)),
            ..ApplicationDraft::new()
        };
        for req in ["Essay", "Transcript", "Scores", "Fee"] {
            draft.add_requirement(req);
        }
        let mut state = AppState::open(Rc::new(MemoryStorage::new()));
        let app = draft.submit(&mut state).expect("create");

        let card = ApplicationCard::from_application(&app, &clock());
        assert_eq!(card.days_until, 3);
        assert!(card.urgent);
        assert!(!card.overdue);
        assert_eq!(card.requirements_preview.len(), 3);
        assert_eq!(card.more_requirements, 1);

        let mut past = app.clone();
        past.deadline = date(2026, 10, 18);
        let card = ApplicationCard::from_application(&past, &clock());
        assert!(card.overdue);
        assert!(!card.urgent);
        assert_eq!(card.deadline_state, DeadlineState::Overdue(1));
    }

    #[test]
    fn view_reports_filter_state_for_empty_lists() {
        let state = AppState::open(Rc::new(MemoryStorage::new()));
        let model = ApplicationsView::new(&state, ApplicationFilter::default()).model(&clock());
        assert!(model.cards.is_empty());
        assert!(model.empty_message().starts_with("Get started"));

        let filter = ApplicationFilter {
            kind: Some(ApplicationKind::Scholarship),
            ..Default::default()
        };
        let model = ApplicationsView::new(&state, filter).model(&clock());
        assert!(model.empty_message().starts_with("Try adjusting"));
    }
}
