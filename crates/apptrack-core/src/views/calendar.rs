use chrono::{Datelike, NaiveDate};

use crate::datetime::{Clock, days_in_month, first_of_month, shift_months};
use crate::model::{Application, ApplicationKind, ApplicationStatus};
use crate::state::AppState;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const ENTRIES_PER_DAY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub id: String,
    pub name: String,
    pub kind: ApplicationKind,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub day: u32,
    pub date: NaiveDate,
    pub today: bool,
    /// The day is behind us and something due on it was never sent off.
    pub past_deadline: bool,
    pub entries: Vec<CalendarEntry>,
    /// Applications due that day beyond the ones in `entries`.
    pub more: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub title: String,
    pub weekdays: [&'static str; 7],
    /// Sunday-first; `None` pads the days before the 1st.
    pub cells: Vec<Option<CalendarCell>>,
}

impl CalendarMonth {
    pub fn days(&self) -> impl Iterator<Item = &CalendarCell> {
        self.cells.iter().flatten()
    }

    pub fn day(&self, day: u32) -> Option<&CalendarCell> {
        self.days().find(|cell| cell.day == day)
    }
}

pub fn applications_for_day(apps: &[Application], date: NaiveDate) -> Vec<&Application> {
    apps.iter().filter(|app| app.deadline == date).collect()
}

/// A month cursor over the application deadlines.
pub struct CalendarView<'a> {
    state: &'a AppState,
    cursor: NaiveDate,
}

impl<'a> CalendarView<'a> {
    pub fn new(state: &'a AppState, date: NaiveDate) -> Self {
        Self {
            state,
            cursor: first_of_month(date),
        }
    }

    pub fn cursor(&self) -> NaiveDate {
        self.cursor
    }

    pub fn prev(&mut self) {
        self.cursor = shift_months(self.cursor, -1);
    }

    pub fn next(&mut self) {
        self.cursor = shift_months(self.cursor, 1);
    }

    pub fn go_today(&mut self, clock: &Clock) {
        self.cursor = first_of_month(clock.today());
    }

    pub fn model(&self, clock: &Clock) -> CalendarMonth {
        let today = clock.today();
        let apps = self.state.applications();
        let first = self.cursor;
        let leading = first.weekday().num_days_from_sunday() as usize;

        let mut cells: Vec<Option<CalendarCell>> = vec![None; leading];
        for date in first.iter_days().take(days_in_month(first) as usize) {
            let due = applications_for_day(apps, date);
            let past_deadline = date < today && due.iter().any(|app| !app.status.is_settled());

            cells.push(Some(CalendarCell {
                day: date.day(),
                date,
                today: date == today,
                past_deadline,
                entries: due
                    .iter()
                    .take(ENTRIES_PER_DAY)
                    .map(|app| CalendarEntry {
                        id: app.id.clone(),
                        name: app.name.clone(),
                        kind: app.kind,
                        status: app.status,
                    })
                    .collect(),
                more: due.len().saturating_sub(ENTRIES_PER_DAY),
            }));
        }

        let month = first.month();
        CalendarMonth {
            year: first.year(),
            month,
            title: format!("{} {}", MONTH_NAMES[month as usize - 1], first.year()),
            weekdays: WEEKDAYS,
            cells,
        }
    }
}
