use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::{Clock, DeadlineState};
use crate::model::{Application, ApplicationStatus, DocumentStatus, Priority};
use crate::views::applications::ApplicationsModel;
use crate::views::calendar::CalendarMonth;
use crate::views::dashboard::DashboardModel;
use crate::views::documents::DocumentsModel;
use crate::views::profile::{ProfileList, ProfileModel};
use crate::views::suggestions::SuggestionsModel;
use crate::views::{Frame, NavEntry, Screen};

/// ANSI codes for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    accent: &'static str,
    ok: &'static str,
    warn: &'static str,
    danger: &'static str,
    muted: &'static str,
    heading: &'static str,
}

const DARK: Palette = Palette {
    accent: "94",
    ok: "92",
    warn: "93",
    danger: "91",
    muted: "90",
    heading: "1;97",
};

const LIGHT: Palette = Palette {
    accent: "34",
    ok: "32",
    warn: "33",
    danger: "31",
    muted: "2",
    heading: "1;30",
};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    palette: Palette,
}

impl Renderer {
    /// Colour only when the config allows it and stdout is a terminal.
    pub fn new(cfg: &Config, dark: bool) -> Self {
        Self {
            color: cfg.color && io::stdout().is_terminal(),
            palette: if dark { DARK } else { LIGHT },
        }
    }

    /// No escape codes at all.
    pub fn plain() -> Self {
        Self {
            color: false,
            palette: DARK,
        }
    }

    pub fn set_dark(&mut self, dark: bool) {
        self.palette = if dark { DARK } else { LIGHT };
    }

    #[tracing::instrument(skip(self, frame))]
    pub fn print_frame(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_frame(&mut out, frame)
    }

    pub fn write_frame<W: Write>(&self, out: &mut W, frame: &Frame) -> anyhow::Result<()> {
        self.write_nav(out, &frame.nav)?;
        writeln!(out)?;
        match &frame.screen {
            Screen::Dashboard(model) => self.write_dashboard(out, model),
            Screen::Applications(model) => self.write_applications(out, model),
            Screen::Documents(model) => self.write_documents(out, model),
            Screen::Calendar(model) => self.write_calendar(out, model),
            Screen::Suggestions(model) => self.write_suggestions(out, model),
            Screen::Profile(model) => self.write_profile(out, model),
        }
    }

    fn write_nav<W: Write>(&self, out: &mut W, nav: &[NavEntry]) -> anyhow::Result<()> {
        let items: Vec<String> = nav
            .iter()
            .map(|entry| {
                if entry.active {
                    self.paint(&format!("[{}]", entry.label), self.palette.accent)
                } else {
                    entry.label.to_string()
                }
            })
            .collect();
        writeln!(out, "{}", items.join("  "))?;
        Ok(())
    }

    fn heading<W: Write>(&self, out: &mut W, title: &str) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(title, self.palette.heading))?;
        Ok(())
    }

    fn write_dashboard<W: Write>(&self, out: &mut W, model: &DashboardModel) -> anyhow::Result<()> {
        self.heading(out, "Dashboard")?;
        let stats = &model.stats;
        writeln!(
            out,
            "Total {}   In Progress {}   Submitted {}   Due This Week {}",
            stats.total, stats.in_progress, stats.submitted, stats.due_this_week
        )?;
        writeln!(out)?;

        self.heading(out, "Upcoming Deadlines")?;
        if model.upcoming.is_empty() {
            writeln!(out, "{}", self.paint("No upcoming deadlines", self.palette.muted))?;
        } else {
            let rows = model
                .upcoming
                .iter()
                .map(|item| {
                    let label = if item.urgent {
                        self.paint(&item.label, self.palette.danger)
                    } else {
                        item.label.clone()
                    };
                    vec![
                        short_id(&item.id),
                        item.name.clone(),
                        item.kind.to_string(),
                        format_date(item.deadline),
                        label,
                        self.priority(item.priority),
                    ]
                })
                .collect();
            write_table(out, &["ID", "Name", "Type", "Deadline", "Due", "Priority"], rows)?;
        }
        writeln!(out)?;

        self.heading(out, "Recent Activity")?;
        if model.activity.is_empty() {
            writeln!(out, "{}", self.paint("No recent activity", self.palette.muted))?;
        }
        for item in &model.activity {
            writeln!(
                out,
                "{} {}  {}",
                item.action,
                item.target,
                self.paint(&item.time, self.palette.muted)
            )?;
        }
        Ok(())
    }

    fn write_applications<W: Write>(
        &self,
        out: &mut W,
        model: &ApplicationsModel,
    ) -> anyhow::Result<()> {
        self.heading(out, "Applications")?;
        if model.cards.is_empty() {
            writeln!(out, "No applications found. {}", model.empty_message())?;
            return Ok(());
        }

        let rows = model
            .cards
            .iter()
            .map(|card| {
                let mut requirements = card.requirements_preview.join(", ");
                if card.more_requirements > 0 {
                    requirements.push_str(&format!(" +{} more", card.more_requirements));
                }
                vec![
                    short_id(&card.id),
                    card.name.clone(),
                    card.kind.to_string(),
                    self.status(card.status),
                    self.priority(card.priority),
                    format_date(card.deadline),
                    self.deadline(card.deadline_state, card.urgent),
                    format!("{}/{} ({:.0}%)", card.completed_tasks, card.total_tasks, card.progress),
                    card.location.clone().unwrap_or_default(),
                    requirements,
                ]
            })
            .collect();
        write_table(
            out,
            &[
                "ID",
                "Name",
                "Type",
                "Status",
                "Priority",
                "Deadline",
                "Due",
                "Progress",
                "Location",
                "Requirements",
            ],
            rows,
        )
    }

    fn write_documents<W: Write>(&self, out: &mut W, model: &DocumentsModel) -> anyhow::Result<()> {
        self.heading(out, "Documents")?;
        if model.rows.is_empty() {
            let hint = if model.filter_active {
                "Try adjusting your search or filters."
            } else {
                "Upload your first document to get started."
            };
            writeln!(out, "No documents found. {hint}")?;
            return Ok(());
        }

        let rows = model
            .rows
            .iter()
            .map(|row| {
                let status = match row.status {
                    DocumentStatus::Completed => self.paint("completed", self.palette.ok),
                    DocumentStatus::Pending => self.paint("pending", self.palette.warn),
                };
                vec![
                    short_id(&row.id),
                    row.name.clone(),
                    row.doc_type.clone(),
                    row.size.clone(),
                    format_date(row.upload_date),
                    status,
                ]
            })
            .collect();
        write_table(out, &["ID", "Name", "Type", "Size", "Uploaded", "Status"], rows)?;
        writeln!(out)?;
        writeln!(out, "Types: {}", model.types.join(", "))?;
        Ok(())
    }

    fn write_calendar<W: Write>(&self, out: &mut W, month: &CalendarMonth) -> anyhow::Result<()> {
        self.heading(out, &month.title)?;
        let header: Vec<String> = month.weekdays.iter().map(|d| format!("{d:>4}")).collect();
        writeln!(out, "{}", header.join(""))?;

        for week in month.cells.chunks(7) {
            let mut line = String::new();
            for cell in week {
                let Some(cell) = cell else {
                    line.push_str("    ");
                    continue;
                };
                let marker = if cell.past_deadline {
                    "!"
                } else if cell.entries.is_empty() {
                    " "
                } else {
                    "*"
                };
                let text = format!("{:>3}{marker}", cell.day);
                if cell.today {
                    line.push_str(&self.paint(&text, "7"));
                } else if cell.past_deadline {
                    line.push_str(&self.paint(&text, self.palette.danger));
                } else {
                    line.push_str(&text);
                }
            }
            writeln!(out, "{}", line.trim_end())?;
        }

        let due: Vec<_> = month.days().filter(|cell| !cell.entries.is_empty()).collect();
        if !due.is_empty() {
            writeln!(out)?;
        }
        for cell in due {
            let mut names: Vec<String> = cell.entries.iter().map(|e| e.name.clone()).collect();
            if cell.more > 0 {
                names.push(format!("+{} more", cell.more));
            }
            writeln!(out, "{:>2}  {}", cell.day, names.join(", "))?;
        }
        Ok(())
    }

    fn write_suggestions<W: Write>(
        &self,
        out: &mut W,
        model: &SuggestionsModel,
    ) -> anyhow::Result<()> {
        self.heading(out, "AI Suggestions")?;
        if model.profile_incomplete {
            writeln!(
                out,
                "{}",
                self.paint(
                    "Complete your profile (name, location, interests) for better suggestions.",
                    self.palette.warn
                )
            )?;
        }
        writeln!(out, "{} suggestion(s)", model.count())?;
        if model.cards.is_empty() {
            return Ok(());
        }

        let rows = model
            .cards
            .iter()
            .map(|card| {
                vec![
                    short_id(&card.id),
                    card.name.clone(),
                    card.kind.to_string(),
                    format!("{}%", card.match_score),
                    format_date(card.deadline),
                    self.deadline(card.deadline_state, card.urgent),
                    card.category.clone(),
                ]
            })
            .collect();
        write_table(
            out,
            &["ID", "Name", "Type", "Match", "Deadline", "Due", "Category"],
            rows,
        )
    }

    fn write_profile<W: Write>(&self, out: &mut W, model: &ProfileModel) -> anyhow::Result<()> {
        self.heading(out, "Profile")?;
        let profile = &model.profile;
        writeln!(out, "name      {}", profile.name)?;
        writeln!(out, "email     {}", profile.email)?;
        writeln!(out, "location  {}", profile.location)?;
        writeln!(out, "gpa       {}", profile.gpa)?;
        for list in ProfileList::ALL {
            writeln!(out, "{}: {}", list.label(), model.list(list).join(", "))?;
        }
        if model.incomplete {
            writeln!(out)?;
            writeln!(
                out,
                "{}",
                self.paint("Profile incomplete: add your name, location and interests.", self.palette.warn)
            )?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, app, clock), fields(id = %app.id))]
    pub fn print_application(&mut self, app: &Application, clock: &Clock) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_application(&mut out, app, clock)
    }

    pub fn write_application<W: Write>(
        &self,
        out: &mut W,
        app: &Application,
        clock: &Clock,
    ) -> anyhow::Result<()> {
        let state = DeadlineState::from_days(clock.days_until(app.deadline));
        writeln!(out, "id        {}", app.id)?;
        writeln!(out, "name      {}", app.name)?;
        writeln!(out, "type      {}", app.kind)?;
        writeln!(out, "status    {}", self.status(app.status))?;
        writeln!(out, "priority  {}", self.priority(app.priority))?;
        writeln!(
            out,
            "deadline  {} ({})",
            format_date(app.deadline),
            self.deadline(state, matches!(state, DeadlineState::Upcoming(d) if d <= 3))
        )?;
        if let Some(location) = &app.location {
            writeln!(out, "location  {location}")?;
        }
        if let Some(category) = &app.category {
            writeln!(out, "category  {category}")?;
        }
        writeln!(
            out,
            "progress  {}/{} ({:.0}%)",
            app.completed_tasks(),
            app.checklist.len(),
            app.progress_percent()
        )?;

        if !app.requirements.is_empty() {
            writeln!(out, "requirements")?;
            for (idx, req) in app.requirements.iter().enumerate() {
                writeln!(out, "  {}. {req}", idx + 1)?;
            }
        }
        if !app.checklist.is_empty() {
            writeln!(out, "checklist")?;
            for item in &app.checklist {
                let mark = if item.completed { "x" } else { " " };
                writeln!(out, "  [{mark}] {} {}", short_id(&item.id), item.text)?;
            }
        }
        if !app.notes.is_empty() {
            writeln!(out, "notes")?;
            for line in app.notes.lines() {
                writeln!(out, "  {line}")?;
            }
        }
        Ok(())
    }

    fn status(&self, status: ApplicationStatus) -> String {
        let code = match status {
            ApplicationStatus::NotStarted => self.palette.muted,
            ApplicationStatus::InProgress => self.palette.warn,
            ApplicationStatus::Submitted => self.palette.accent,
            ApplicationStatus::Accepted => self.palette.ok,
            ApplicationStatus::Rejected => self.palette.danger,
        };
        self.paint(status.label(), code)
    }

    fn priority(&self, priority: Priority) -> String {
        let code = match priority {
            Priority::High => self.palette.danger,
            Priority::Medium => self.palette.warn,
            Priority::Low => self.palette.ok,
        };
        self.paint(priority.as_str(), code)
    }

    fn deadline(&self, state: DeadlineState, urgent: bool) -> String {
        let label = state.label();
        match state {
            DeadlineState::Overdue(_) | DeadlineState::DueToday => {
                self.paint(&label, self.palette.danger)
            }
            DeadlineState::Upcoming(_) if urgent => self.paint(&label, self.palette.warn),
            DeadlineState::Upcoming(_) => label,
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Ids are uuids; the first block is enough to type back in.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(*h)).collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, &width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for &width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            write!(writer, "{cell}{} ", " ".repeat(width.saturating_sub(visible)))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            escaped = ch != 'm';
            continue;
        }
        if ch == '\x1b' {
            escaped = true;
            continue;
        }
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::Tz;

    use super::{Renderer, strip_ansi, write_table};
    use crate::datetime::Clock;
    use crate::model::{Application, ApplicationKind};
    use crate::state::ViewContext;
    use crate::storage::MemoryStorage;
    use crate::views::{Router, View};

    fn clock() -> Clock {
        Clock::fixed(
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
                .single()
                .expect("valid now"),
            Tz::UTC,
        )
    }

    fn render(ctx: &ViewContext, view: View) -> String {
        let frame = Router::new(view).render(ctx, &clock());
        let mut out = Vec::new();
        Renderer::plain()
            .write_frame(&mut out, &frame)
            .expect("render");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn table_pads_by_visible_width() {
        let mut out = Vec::new();
        write_table(
            &mut out,
            &["A", "B"],
            vec![vec!["\x1b[31mred\x1b[0m".to_string(), "x".to_string()]],
        )
        .expect("table");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "A   B ");
        assert_eq!(strip_ansi(lines[2]), "red x ");
    }

    #[test]
    fn frames_show_nav_and_empty_states() {
        let ctx = ViewContext::open(Rc::new(MemoryStorage::new()));

        let text = render(&ctx, View::Applications);
        assert!(text.starts_with("Dashboard  [Applications]  Documents"));
        assert!(text.contains("Get started by adding"));

        let text = render(&ctx, View::Suggestions);
        assert!(text.contains("Complete your profile"));
        assert!(text.contains("0 suggestion(s)"));

        let text = render(&ctx, View::Calendar);
        assert!(text.contains("October 2026"));
    }

    #[test]
    fn dashboard_lists_upcoming_deadline() {
        let mut ctx = ViewContext::open(Rc::new(MemoryStorage::new()));
        let app = Application::new(
            "Stanford".to_string(),
            ApplicationKind::College,
            NaiveDate::from_ymd_opt(2026, 10, 21).expect("valid date"),
        );
        ctx.app.add_application(app).expect("add");

        let text = render(&ctx, View::Dashboard);
        assert!(text.contains("Total 1"));
        assert!(text.contains("Stanford"));
        assert!(text.contains("2 days left"));
        assert!(text.contains("Created new application Stanford"));
    }
}
