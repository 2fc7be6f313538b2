use chrono::NaiveDate;

use crate::datetime::{Clock, DeadlineState, start_of_day};
use crate::filter::sort_by_deadline;
use crate::model::{ActivityItem, Application, ApplicationKind, ApplicationStatus, Priority};
use crate::state::AppState;

const UPCOMING_LIMIT: usize = 5;
pub const URGENT_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub in_progress: usize,
    pub submitted: usize,
    pub due_this_week: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingDeadline {
    pub id: String,
    pub name: String,
    pub kind: ApplicationKind,
    pub priority: Priority,
    pub deadline: NaiveDate,
    pub days_until: i64,
    pub label: String,
    pub urgent: bool,
}

#[derive(Debug, Clone)]
pub struct DashboardModel {
    pub stats: DashboardStats,
    pub upcoming: Vec<UpcomingDeadline>,
    pub activity: Vec<ActivityItem>,
}

pub struct DashboardView<'a> {
    state: &'a AppState,
}

impl<'a> DashboardView<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub fn model(&self, clock: &Clock) -> DashboardModel {
        let apps = self.state.applications();
        DashboardModel {
            stats: stats(apps, clock),
            upcoming: upcoming_deadlines(apps, clock),
            activity: self.state.recent_activity().to_vec(),
        }
    }
}

pub fn stats(apps: &[Application], clock: &Clock) -> DashboardStats {
    let count = |status: ApplicationStatus| apps.iter().filter(|app| app.status == status).count();

    DashboardStats {
        total: apps.len(),
        in_progress: count(ApplicationStatus::InProgress),
        submitted: count(ApplicationStatus::Submitted),
        due_this_week: apps
            .iter()
            .filter(|app| {
                let days = clock.days_until(app.deadline);
                days > 0 && days <= 7
            })
            .count(),
    }
}

/// The next few deadlines that have not started yet, soonest first.
pub fn upcoming_deadlines(apps: &[Application], clock: &Clock) -> Vec<UpcomingDeadline> {
    let mut upcoming: Vec<&Application> = apps
        .iter()
        .filter(|app| start_of_day(app.deadline, &clock.tz) > clock.now)
        .collect();
    sort_by_deadline(&mut upcoming);

    upcoming
        .into_iter()
        .take(UPCOMING_LIMIT)
        .map(|app| {
            let days_until = clock.days_until(app.deadline);
            UpcomingDeadline {
                id: app.id.clone(),
                name: app.name.clone(),
                kind: app.kind,
                priority: app.priority,
                deadline: app.deadline,
                days_until,
                label: DeadlineState::from_days(days_until).label(),
                urgent: days_until <= URGENT_DAYS,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::Tz;

    use super::{stats, upcoming_deadlines};
    use crate::datetime::Clock;
    use crate::model::{Application, ApplicationKind, ApplicationStatus};

    fn clock() -> Clock {
        Clock::fixed(
            Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0)
                .single()
                .expect("valid now"),
            Tz::UTC,
        )
    }

    fn app(name: &str, status: ApplicationStatus, deadline: (i32, u32, u32)) -> Application {
        let mut app = Application::new(
            name.to_string(),
            ApplicationKind::College,
            NaiveDate::from_ymd_opt(deadline.0, deadline.1, deadline.2).expect("valid date"),
        );
        app.status = status;
        app
    }

    #[test]
    fn stats_count_statuses_and_this_week() {
        let apps = vec![
            app("today", ApplicationStatus::InProgress, (2026, 10, 19)),
            app("tomorrow", ApplicationStatus::InProgress, (2026, 10, 20)),
            app("a week out", ApplicationStatus::Submitted, (2026, 10, 26)),
            app("eight days", ApplicationStatus::NotStarted, (2026, 10, 27)),
            app("past", ApplicationStatus::Rejected, (2026, 10, 1)),
        ];

        let stats = stats(&apps, &clock());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.in_progress, 2);
        assert_eq!(stats.submitted, 1);
        // Due today counts as zero days, which is not "this week".
        assert_eq!(stats.due_this_week, 2);
    }

    #[test]
    fn upcoming_skips_started_days_and_caps_at_five() {
        let apps = vec![
            app("f", ApplicationStatus::NotStarted, (2026, 12, 20)),
            app("today", ApplicationStatus::NotStarted, (2026, 10, 19)),
            app("b", ApplicationStatus::NotStarted, (2026, 10, 21)),
            app("a", ApplicationStatus::NotStarted, (2026, 10, 20)),
            app("c", ApplicationStatus::NotStarted, (2026, 11, 1)),
            app("d", ApplicationStatus::NotStarted, (2026, 11, 2)),
            app("e", ApplicationStatus::NotStarted, (2026, 11, 3)),
        ];

        let upcoming = upcoming_deadlines(&apps, &clock());
        let names: Vec<&str> = upcoming.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(upcoming[0].days_until, 1);
        assert!(upcoming[0].urgent);
        assert_eq!(upcoming[0].label, "1 days left");
        assert!(!upcoming[2].urgent);
    }
}
