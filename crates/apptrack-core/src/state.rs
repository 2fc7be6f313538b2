//! Process-wide state containers.
//!
//! [`AppState`] owns the four persisted collections plus the in-memory
//! activity log; [`ThemeState`] owns the dark-mode flag. Views never reach
//! for them implicitly: they are handed over through a [`ViewContext`],
//! which refuses to build while a container is missing.

use std::rc::Rc;

use tracing::{debug, info};

use crate::error::StateError;
use crate::model::{ActivityIcon, ActivityItem, Application, Document, Suggestion, UserProfile};
use crate::persisted::Persisted;
use crate::storage::LocalStorage;

pub const APPLICATIONS_KEY: &str = "applications";
pub const PROFILE_KEY: &str = "profile";
pub const SUGGESTIONS_KEY: &str = "suggestions";
pub const DOCUMENTS_KEY: &str = "documents";
pub const DARK_MODE_KEY: &str = "darkMode";

#[derive(Debug)]
pub struct AppState {
    applications: Persisted<Vec<Application>>,
    profile: Persisted<UserProfile>,
    suggestions: Persisted<Vec<Suggestion>>,
    documents: Persisted<Vec<Document>>,
    recent_activity: Rc<Vec<ActivityItem>>,
}

impl AppState {
    #[tracing::instrument(skip(storage))]
    pub fn open(storage: Rc<dyn LocalStorage>) -> Self {
        let state = Self {
            applications: Persisted::load_list(Rc::clone(&storage), APPLICATIONS_KEY),
            profile: Persisted::load(Rc::clone(&storage), PROFILE_KEY, UserProfile::default()),
            suggestions: Persisted::load_list(Rc::clone(&storage), SUGGESTIONS_KEY),
            documents: Persisted::load_list(storage, DOCUMENTS_KEY),
            recent_activity: Rc::new(vec![]),
        };

        info!(
            applications = state.applications().len(),
            documents = state.documents().len(),
            suggestions = state.suggestions().len(),
            "loaded application state"
        );
        state
    }

    pub fn applications(&self) -> &[Application] {
        self.applications.get()
    }

    pub fn applications_snapshot(&self) -> Rc<Vec<Application>> {
        self.applications.snapshot()
    }

    pub fn set_applications(&mut self, applications: Vec<Application>) -> anyhow::Result<()> {
        self.applications.set(applications)
    }

    pub fn update_applications<F>(&mut self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&Vec<Application>) -> Vec<Application>,
    {
        self.applications.update(f)
    }

    pub fn profile(&self) -> &UserProfile {
        self.profile.get()
    }

    pub fn set_profile(&mut self, profile: UserProfile) -> anyhow::Result<()> {
        self.profile.set(profile)
    }

    pub fn update_profile<F>(&mut self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&UserProfile) -> UserProfile,
    {
        self.profile.update(f)
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        self.suggestions.get()
    }

    pub fn set_suggestions(&mut self, suggestions: Vec<Suggestion>) -> anyhow::Result<()> {
        self.suggestions.set(suggestions)
    }

    pub fn update_suggestions<F>(&mut self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&Vec<Suggestion>) -> Vec<Suggestion>,
    {
        self.suggestions.update(f)
    }

    pub fn documents(&self) -> &[Document] {
        self.documents.get()
    }

    pub fn set_documents(&mut self, documents: Vec<Document>) -> anyhow::Result<()> {
        self.documents.set(documents)
    }

    pub fn update_documents<F>(&mut self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&Vec<Document>) -> Vec<Document>,
    {
        self.documents.update(f)
    }

    /// Newest first; never written to storage.
    pub fn recent_activity(&self) -> &[ActivityItem] {
        &self.recent_activity
    }

    pub fn set_recent_activity(&mut self, activity: Vec<ActivityItem>) {
        self.recent_activity = Rc::new(activity);
    }

    pub fn log_activity(&mut self, item: ActivityItem) {
        let mut next = Vec::with_capacity(self.recent_activity.len() + 1);
        next.push(item);
        next.extend(self.recent_activity.iter().cloned());
        self.recent_activity = Rc::new(next);
    }

    pub fn find_application(&self, id: &str) -> Option<&Application> {
        self.applications().iter().find(|app| app.id == id)
    }

    #[tracing::instrument(skip(self, application), fields(id = %application.id))]
    pub fn add_application(&mut self, application: Application) -> anyhow::Result<()> {
        let target = application.name.clone();
        self.update_applications(|prev| {
            let mut next = prev.clone();
            next.push(application);
            next
        })?;
        self.log_activity(ActivityItem::just_now(
            "Created new application",
            &target,
            ActivityIcon::Created,
            "blue",
        ));
        Ok(())
    }

    /// Swap in `application` for the entry with the same id.
    #[tracing::instrument(skip(self, application), fields(id = %application.id))]
    pub fn replace_application(&mut self, application: Application) -> anyhow::Result<()> {
        if self.find_application(&application.id).is_none() {
            return Err(StateError::NotFound {
                kind: "application",
                id: application.id,
            }
            .into());
        }

        self.update_applications(|prev| {
            prev.iter()
                .map(|app| {
                    if app.id == application.id {
                        application.clone()
                    } else {
                        app.clone()
                    }
                })
                .collect()
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_application(&mut self, id: &str) -> anyhow::Result<Application> {
        let removed = self
            .find_application(id)
            .cloned()
            .ok_or_else(|| StateError::NotFound {
                kind: "application",
                id: id.to_string(),
            })?;

        self.update_applications(|prev| prev.iter().filter(|app| app.id != id).cloned().collect())?;
        debug!(remaining = self.applications().len(), "deleted application");
        Ok(removed)
    }

    /// Copy a suggestion into the application list. The suggestion stays.
    #[tracing::instrument(skip(self))]
    pub fn adopt_suggestion(&mut self, suggestion_id: &str) -> anyhow::Result<Application> {
        let suggestion = self
            .suggestions()
            .iter()
            .find(|s| s.id == suggestion_id)
            .ok_or_else(|| StateError::NotFound {
                kind: "suggestion",
                id: suggestion_id.to_string(),
            })?;
        let application = suggestion.to_application();

        let added = application.clone();
        self.update_applications(|prev| {
            let mut next = prev.clone();
            next.push(added);
            next
        })?;
        self.log_activity(ActivityItem::just_now(
            "Added from suggestions",
            &application.name,
            ActivityIcon::Adopted,
            "purple",
        ));
        Ok(application)
    }

    pub fn find_document(&self, id: &str) -> Option<&Document> {
        self.documents().iter().find(|doc| doc.id == id)
    }

    #[tracing::instrument(skip(self, document), fields(id = %document.id))]
    pub fn add_document(&mut self, document: Document) -> anyhow::Result<()> {
        let target = document.name.clone();
        self.update_documents(|prev| {
            let mut next = prev.clone();
            next.push(document);
            next
        })?;
        self.log_activity(ActivityItem::just_now(
            "Uploaded document",
            &target,
            ActivityIcon::Uploaded,
            "green",
        ));
        Ok(())
    }

    #[tracing::instrument(skip(self, document), fields(id = %document.id))]
    pub fn replace_document(&mut self, document: Document) -> anyhow::Result<()> {
        if self.find_document(&document.id).is_none() {
            return Err(StateError::NotFound {
                kind: "document",
                id: document.id,
            }
            .into());
        }

        self.update_documents(|prev| {
            prev.iter()
                .map(|doc| {
                    if doc.id == document.id {
                        document.clone()
                    } else {
                        doc.clone()
                    }
                })
                .collect()
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_document(&mut self, id: &str) -> anyhow::Result<Document> {
        let removed = self
            .find_document(id)
            .cloned()
            .ok_or_else(|| StateError::NotFound {
                kind: "document",
                id: id.to_string(),
            })?;

        self.update_documents(|prev| prev.iter().filter(|doc| doc.id != id).cloned().collect())?;
        Ok(removed)
    }
}

#[derive(Debug)]
pub struct ThemeState {
    dark: Persisted<bool>,
}

impl ThemeState {
    #[tracing::instrument(skip(storage))]
    pub fn open(storage: Rc<dyn LocalStorage>) -> Self {
        Self {
            dark: Persisted::load(storage, DARK_MODE_KEY, true),
        }
    }

    pub fn is_dark(&self) -> bool {
        *self.dark.get()
    }

    pub fn set_dark(&mut self, dark: bool) -> anyhow::Result<()> {
        self.dark.set(dark)
    }

    /// Flip the flag and persist it. Returns the new value.
    #[tracing::instrument(skip(self))]
    pub fn toggle(&mut self) -> anyhow::Result<bool> {
        self.dark.update(|dark| !dark)?;
        debug!(dark = self.is_dark(), "toggled theme");
        Ok(self.is_dark())
    }
}

/// Both containers, handed to the router and every view.
#[derive(Debug)]
pub struct ViewContext {
    pub app: AppState,
    pub theme: ThemeState,
}

impl ViewContext {
    pub fn builder() -> ViewContextBuilder {
        ViewContextBuilder::default()
    }

    /// Both containers over one storage backend.
    pub fn open(storage: Rc<dyn LocalStorage>) -> Self {
        Self {
            app: AppState::open(Rc::clone(&storage)),
            theme: ThemeState::open(storage),
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewContextBuilder {
    app: Option<AppState>,
    theme: Option<ThemeState>,
}

impl ViewContextBuilder {
    pub fn app(mut self, app: AppState) -> Self {
        self.app = Some(app);
        self
    }

    pub fn theme(mut self, theme: ThemeState) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn build(self) -> Result<ViewContext, StateError> {
        let theme = self.theme.ok_or(StateError::MissingProvider {
            container: "ThemeState",
        })?;
        let app = self.app.ok_or(StateError::MissingProvider {
            container: "AppState",
        })?;
        Ok(ViewContext { app, theme })
    }
}
