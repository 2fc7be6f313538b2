pub mod applications;
pub mod calendar;
pub mod dashboard;
pub mod documents;
pub mod profile;
pub mod suggestions;

use std::fmt;

use tracing::debug;

use crate::datetime::Clock;
use crate::state::ViewContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Applications,
    Documents,
    Calendar,
    Suggestions,
    Profile,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Dashboard,
        View::Applications,
        View::Documents,
        View::Calendar,
        View::Suggestions,
        View::Profile,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Applications => "applications",
            Self::Documents => "documents",
            Self::Calendar => "calendar",
            Self::Suggestions => "suggestions",
            Self::Profile => "profile",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Applications => "Applications",
            Self::Documents => "Documents",
            Self::Calendar => "Calendar",
            Self::Suggestions => "AI Suggestions",
            Self::Profile => "Profile",
        }
    }

    /// Unknown names land on the dashboard.
    pub fn from_name(name: &str) -> Self {
        let wanted = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|view| view.id() == wanted)
            .unwrap_or(View::Dashboard)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub view: View,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub enum Screen {
    Dashboard(dashboard::DashboardModel),
    Applications(applications::ApplicationsModel),
    Documents(documents::DocumentsModel),
    Calendar(calendar::CalendarMonth),
    Suggestions(suggestions::SuggestionsModel),
    Profile(profile::ProfileModel),
}

/// Everything needed to draw one screen.
#[derive(Debug, Clone)]
pub struct Frame {
    pub nav: Vec<NavEntry>,
    pub dark: bool,
    pub screen: Screen,
}

/// In-memory active-view selector. Nothing here is persisted.
#[derive(Debug, Clone)]
pub struct Router {
    active: View,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(View::Dashboard)
    }
}

impl Router {
    pub fn new(initial: View) -> Self {
        Self { active: initial }
    }

    pub fn active(&self) -> View {
        self.active
    }

    pub fn navigate(&mut self, view: View) {
        debug!(from = %self.active, to = %view, "navigating");
        self.active = view;
    }

    pub fn navigation(&self) -> Vec<NavEntry> {
        View::ALL
            .into_iter()
            .map(|view| NavEntry {
                view,
                label: view.label(),
                active: view == self.active,
            })
            .collect()
    }

    /// The active view with no search text or filters applied.
    #[tracing::instrument(skip(self, ctx, clock), fields(view = %self.active))]
    pub fn render(&self, ctx: &ViewContext, clock: &Clock) -> Frame {
        let state = &ctx.app;
        let screen = match self.active {
            View::Dashboard => Screen::Dashboard(dashboard::DashboardView::new(state).model(clock)),
            View::Applications => Screen::Applications(
                applications::ApplicationsView::new(state, Default::default()).model(clock),
            ),
            View::Documents => Screen::Documents(
                documents::DocumentsView::new(state, Default::default()).model(),
            ),
            View::Calendar => Screen::Calendar(
                calendar::CalendarView::new(state, clock.today()).model(clock),
            ),
            View::Suggestions => Screen::Suggestions(
                suggestions::SuggestionsView::new(state, Default::default()).model(clock),
            ),
            View::Profile => Screen::Profile(profile::ProfileView::new(state).model()),
        };

        Frame {
            nav: self.navigation(),
            dark: ctx.theme.is_dark(),
            screen,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;

    use super::{Router, Screen, View};
    use crate::datetime::Clock;
    use crate::state::ViewContext;
    use crate::storage::MemoryStorage;

    #[test]
    fn unknown_names_fall_back_to_dashboard() {
        assert_eq!(View::from_name("Calendar"), View::Calendar);
        assert_eq!(View::from_name("settings"), View::Dashboard);
        assert_eq!(View::Suggestions.label(), "AI Suggestions");
    }

    #[test]
    fn navigation_marks_exactly_one_active_entry() {
        let mut router = Router::default();
        router.navigate(View::Documents);

        let nav = router.navigation();
        assert_eq!(nav.len(), 6);
        let active: Vec<View> = nav.iter().filter(|e| e.active).map(|e| e.view).collect();
        assert_eq!(active, vec![View::Documents]);
    }

    #[test]
    fn render_switches_on_active_view() {
        let ctx = ViewContext::open(Rc::new(MemoryStorage::new()));
        let clock = Clock::fixed(
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
                .single()
                .expect("valid now"),
            Tz::UTC,
        );

        let mut router = Router::new(View::Calendar);
        let frame = router.render(&ctx, &clock);
        assert!(frame.dark);
        assert!(matches!(frame.screen, Screen::Calendar(_)));

        router.navigate(View::Profile);
        let frame = router.render(&ctx, &clock);
        assert!(matches!(frame.screen, Screen::Profile(_)));
    }
}
