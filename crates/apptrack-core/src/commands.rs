use std::fs;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cli::{
    AppCommand, AppFields, Command, DocCommand, ProfileCommand, SortKey, SuggestCommand,
    ThemeCommand,
};
use crate::config::Config;
use crate::datetime::{Clock, first_of_month, parse_date_expr};
use crate::error::StateError;
use crate::filter::{ApplicationFilter, DocumentFilter, SuggestionQuery, SuggestionSort};
use crate::model::{Application, Document, DocumentStatus, FileHandle, Suggestion, UserProfile};
use crate::render::{Renderer, short_id};
use crate::state::ViewContext;
use crate::views::applications::{ApplicationDraft, ApplicationsView};
use crate::views::calendar::CalendarView;
use crate::views::documents::{DocumentsView, set_document_status, upload_documents};
use crate::views::profile::{ProfileDraft, ProfileView};
use crate::views::suggestions::{SuggestionsView, import_catalog};
use crate::views::{Frame, Router, Screen, View};

/// Exact id, or a prefix that matches exactly one id.
pub fn resolve_id<'a, I>(kind: &'static str, ids: I, token: &str) -> anyhow::Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let token = token.trim();
    let ids: Vec<&str> = ids.into_iter().collect();
    if ids.contains(&token) {
        return Ok(token.to_string());
    }

    let mut matches = ids.iter().filter(|id| !token.is_empty() && id.starts_with(token));
    let first = matches.next().ok_or_else(|| StateError::NotFound {
        kind,
        id: token.to_string(),
    })?;
    if matches.next().is_some() {
        return Err(anyhow!("{kind} id prefix is ambiguous: {token}"));
    }
    Ok((*first).to_string())
}

#[instrument(skip(ctx, cfg, renderer, clock, command))]
pub fn dispatch(
    ctx: &mut ViewContext,
    cfg: &Config,
    renderer: &mut Renderer,
    clock: &Clock,
    command: Option<Command>,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    let Some(command) = command else {
        debug!(view = %cfg.default_view, "no explicit command, using default view");
        return cmd_view(ctx, renderer, clock, cfg.default_view);
    };

    match command {
        Command::Dashboard => cmd_view(ctx, renderer, clock, View::Dashboard),
        Command::View { name } => cmd_view(ctx, renderer, clock, View::from_name(&name)),
        Command::App { command } => cmd_app(ctx, renderer, clock, command),
        Command::Doc { command } => cmd_doc(ctx, renderer, clock, command),
        Command::Calendar { month } => cmd_calendar(ctx, renderer, clock, month.as_deref()),
        Command::Suggest { command } => cmd_suggest(ctx, renderer, clock, command),
        Command::Profile { command } => cmd_profile(ctx, renderer, command),
        Command::Theme { command } => cmd_theme(ctx, renderer, command),
        Command::Export => cmd_export(ctx),
    }
}

fn print_screen(
    ctx: &ViewContext,
    renderer: &mut Renderer,
    view: View,
    screen: Screen,
) -> anyhow::Result<()> {
    let frame = Frame {
        nav: Router::new(view).navigation(),
        dark: ctx.theme.is_dark(),
        screen,
    };
    renderer.print_frame(&frame)
}

#[instrument(skip(ctx, renderer, clock))]
fn cmd_view(
    ctx: &ViewContext,
    renderer: &mut Renderer,
    clock: &Clock,
    view: View,
) -> anyhow::Result<()> {
    info!("command view");
    let frame = Router::new(view).render(ctx, clock);
    renderer.print_frame(&frame)
}

fn cmd_app(
    ctx: &mut ViewContext,
    renderer: &mut Renderer,
    clock: &Clock,
    command: AppCommand,
) -> anyhow::Result<()> {
    match command {
        AppCommand::Add {
            name,
            fields,
            requirements,
            tasks,
        } => cmd_app_add(ctx, clock, name, fields, &requirements, &tasks),
        AppCommand::List {
            search,
            status,
            kind,
        } => {
            info!("command app list");
            let filter = ApplicationFilter {
                search,
                status,
                kind,
            };
            let model = ApplicationsView::new(&ctx.app, filter).model(clock);
            print_screen(ctx, renderer, View::Applications, Screen::Applications(model))
        }
        AppCommand::Show { id } => {
            let app = find_application(ctx, &id)?;
            renderer.print_application(app, clock)
        }
        AppCommand::Edit { id, name, fields } => cmd_app_edit(ctx, clock, &id, name, fields),
        AppCommand::Delete { id } => {
            info!("command app delete");
            let id = application_id(ctx, &id)?;
            let removed = ctx.app.delete_application(&id)?;
            println!("Deleted application {} ({}).", short_id(&removed.id), removed.name);
            Ok(())
        }
        AppCommand::Check {
            id,
            add,
            toggle,
            remove,
        } => cmd_app_check(ctx, &id, &add, &toggle, &remove),
        AppCommand::Require { id, add, remove } => cmd_app_require(ctx, &id, &add, remove),
    }
}

fn application_id(ctx: &ViewContext, token: &str) -> anyhow::Result<String> {
    resolve_id(
        "application",
        ctx.app.applications().iter().map(|app| app.id.as_str()),
        token,
    )
}

fn find_application<'a>(ctx: &'a ViewContext, token: &str) -> anyhow::Result<&'a Application> {
    let id = application_id(ctx, token)?;
    ctx.app
        .find_application(&id)
        .ok_or_else(|| StateError::NotFound { kind: "application", id }.into())
}

fn parse_deadline(raw: Option<&str>, clock: &Clock) -> anyhow::Result<Option<NaiveDate>> {
    raw.map(|expr| parse_date_expr(expr, clock.today()))
        .transpose()
        .context("invalid --deadline")
}

fn apply_fields(draft: &mut ApplicationDraft, fields: AppFields, clock: &Clock) -> anyhow::Result<()> {
    if let Some(deadline) = parse_deadline(fields.deadline.as_deref(), clock)? {
        draft.deadline = Some(deadline);
    }
    if let Some(kind) = fields.kind {
        draft.kind = kind;
    }
    if let Some(status) = fields.status {
        draft.status = status;
    }
    if let Some(priority) = fields.priority {
        draft.priority = priority;
    }
    if let Some(location) = fields.location {
        draft.location = location;
    }
    if let Some(category) = fields.category {
        draft.category = category;
    }
    if let Some(notes) = fields.notes {
        draft.notes = notes;
    }
    Ok(())
}

#[instrument(skip(ctx, clock, fields, requirements, tasks))]
fn cmd_app_add(
    ctx: &mut ViewContext,
    clock: &Clock,
    name: String,
    fields: AppFields,
    requirements: &[String],
    tasks: &[String],
) -> anyhow::Result<()> {
    info!("command app add");

    let mut draft = ApplicationDraft::new();
    draft.name = name;
    apply_fields(&mut draft, fields, clock)?;
    for req in requirements {
        draft.add_requirement(req);
    }
    for task in tasks {
        draft.add_checklist_item(task);
    }

    let app = draft.submit(&mut ctx.app)?;
    println!("Created application {} ({}).", short_id(&app.id), app.name);
    Ok(())
}

#[instrument(skip(ctx, clock, fields))]
fn cmd_app_edit(
    ctx: &mut ViewContext,
    clock: &Clock,
    token: &str,
    name: Option<String>,
    fields: AppFields,
) -> anyhow::Result<()> {
    info!("command app edit");

    let mut draft = ApplicationDraft::edit(find_application(ctx, token)?);
    if let Some(name) = name {
        draft.name = name;
    }
    apply_fields(&mut draft, fields, clock)?;

    let app = draft.submit(&mut ctx.app)?;
    println!("Updated application {} ({}).", short_id(&app.id), app.name);
    Ok(())
}

#[instrument(skip(ctx, add, toggle, remove))]
fn cmd_app_check(
    ctx: &mut ViewContext,
    token: &str,
    add: &[String],
    toggle: &[String],
    remove: &[String],
) -> anyhow::Result<()> {
    info!("command app check");

    let mut draft = ApplicationDraft::edit(find_application(ctx, token)?);
    let item_id = |draft: &ApplicationDraft, token: &str| {
        resolve_id(
            "checklist item",
            draft.checklist.iter().map(|item| item.id.as_str()),
            token,
        )
    };

    for token in toggle {
        let id = item_id(&draft, token)?;
        draft.toggle_checklist_item(&id);
    }
    for token in remove {
        let id = item_id(&draft, token)?;
        draft.remove_checklist_item(&id);
    }
    for text in add {
        draft.add_checklist_item(text);
    }

    let app = draft.submit(&mut ctx.app)?;
    println!(
        "Checklist for {}: {}/{} done.",
        app.name,
        app.completed_tasks(),
        app.checklist.len()
    );
    Ok(())
}

#[instrument(skip(ctx, add, remove))]
fn cmd_app_require(
    ctx: &mut ViewContext,
    token: &str,
    add: &[String],
    mut remove: Vec<usize>,
) -> anyhow::Result<()> {
    info!("command app require");

    let mut draft = ApplicationDraft::edit(find_application(ctx, token)?);

    remove.sort_unstable();
    remove.dedup();
    for position in remove.into_iter().rev() {
        position
            .checked_sub(1)
            .and_then(|idx| draft.remove_requirement(idx))
            .ok_or_else(|| anyhow!("no requirement at position {position}"))?;
    }
    for text in add {
        draft.add_requirement(text);
    }

    let app = draft.submit(&mut ctx.app)?;
    println!("{} now has {} requirement(s).", app.name, app.requirements.len());
    Ok(())
}

fn cmd_doc(
    ctx: &mut ViewContext,
    renderer: &mut Renderer,
    clock: &Clock,
    command: DocCommand,
) -> anyhow::Result<()> {
    match command {
        DocCommand::Upload { paths } => cmd_doc_upload(ctx, clock, &paths),
        DocCommand::List {
            search,
            doc_type,
            status,
        } => {
            info!("command doc list");
            let filter = DocumentFilter {
                search,
                doc_type,
                status,
            };
            let model = DocumentsView::new(&ctx.app, filter).model();
            print_screen(ctx, renderer, View::Documents, Screen::Documents(model))
        }
        DocCommand::Delete { id } => {
            info!("command doc delete");
            let id = document_id(ctx, &id)?;
            let removed = ctx.app.delete_document(&id)?;
            println!("Deleted document {} ({}).", short_id(&removed.id), removed.name);
            Ok(())
        }
        DocCommand::Complete { id, undo } => {
            info!("command doc complete");
            let id = document_id(ctx, &id)?;
            let status = if undo {
                DocumentStatus::Pending
            } else {
                DocumentStatus::Completed
            };
            let doc = set_document_status(&mut ctx.app, &id, status)?;
            println!("Marked {} as {}.", doc.name, doc.status);
            Ok(())
        }
    }
}

fn document_id(ctx: &ViewContext, token: &str) -> anyhow::Result<String> {
    resolve_id(
        "document",
        ctx.app.documents().iter().map(|doc| doc.id.as_str()),
        token,
    )
}

#[instrument(skip(ctx, clock, paths))]
fn cmd_doc_upload(ctx: &mut ViewContext, clock: &Clock, paths: &[PathBuf]) -> anyhow::Result<()> {
    info!(files = paths.len(), "command doc upload");

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("not a file path: {}", path.display()))?;
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        files.push(FileHandle { name, bytes });
    }

    for doc in upload_documents(&mut ctx.app, files, clock.today())? {
        println!(
            "Uploaded {} as {} ({}) [{}].",
            doc.name,
            doc.doc_type,
            doc.size,
            short_id(&doc.id)
        );
    }
    Ok(())
}

/// `YYYY-MM`, or any date expression; either way the month containing it.
fn parse_month(raw: &str, clock: &Clock) -> anyhow::Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Ok(date);
    }
    let date = parse_date_expr(raw, clock.today())
        .with_context(|| format!("invalid --month: {raw} (expected YYYY-MM)"))?;
    Ok(first_of_month(date))
}

#[instrument(skip(ctx, renderer, clock))]
fn cmd_calendar(
    ctx: &ViewContext,
    renderer: &mut Renderer,
    clock: &Clock,
    month: Option<&str>,
) -> anyhow::Result<()> {
    info!("command calendar");

    let cursor = match month {
        Some(raw) => parse_month(raw, clock)?,
        None => clock.today(),
    };
    let model = CalendarView::new(&ctx.app, cursor).model(clock);
    print_screen(ctx, renderer, View::Calendar, Screen::Calendar(model))
}

fn cmd_suggest(
    ctx: &mut ViewContext,
    renderer: &mut Renderer,
    clock: &Clock,
    command: SuggestCommand,
) -> anyhow::Result<()> {
    match command {
        SuggestCommand::List { kind, sort } => {
            info!("command suggest list");
            let query = SuggestionQuery {
                kind,
                sort: match sort {
                    SortKey::Match => SuggestionSort::Match,
                    SortKey::Deadline => SuggestionSort::Deadline,
                },
            };
            let model = SuggestionsView::new(&ctx.app, query).model(clock);
            print_screen(ctx, renderer, View::Suggestions, Screen::Suggestions(model))
        }
        SuggestCommand::Adopt { id } => {
            info!("command suggest adopt");
            let id = resolve_id(
                "suggestion",
                ctx.app.suggestions().iter().map(|s| s.id.as_str()),
                &id,
            )?;
            let app = ctx.app.adopt_suggestion(&id)?;
            println!(
                "Added {} to applications [{}] with {} priority.",
                app.name,
                short_id(&app.id),
                app.priority
            );
            Ok(())
        }
        SuggestCommand::Import { path } => {
            info!("command suggest import");
            let count = import_catalog(&mut ctx.app, &path)?;
            println!(
                "Imported {count} suggestion(s); {} total.",
                ctx.app.suggestions().len()
            );
            Ok(())
        }
    }
}

fn cmd_profile(
    ctx: &mut ViewContext,
    renderer: &mut Renderer,
    command: ProfileCommand,
) -> anyhow::Result<()> {
    if let ProfileCommand::Show = command {
        info!("command profile show");
        let model = ProfileView::new(&ctx.app).model();
        return print_screen(ctx, renderer, View::Profile, Screen::Profile(model));
    }

    info!("command profile edit");
    let mut draft = ProfileDraft::from_state(&ctx.app);
    match command {
        ProfileCommand::Show => {}
        ProfileCommand::Set { field, value } => draft.set(field, &value),
        ProfileCommand::Add { list, value } => {
            if !draft.add(list, &value) {
                println!("Nothing to add: {list} already has {value:?} or it is blank.");
                return Ok(());
            }
        }
        ProfileCommand::Remove { list, value } => {
            if !draft.remove(list, &value) {
                return Err(anyhow!("{list} does not contain {value:?}"));
            }
        }
    }
    draft.save(&mut ctx.app)?;
    println!("Profile saved.");
    Ok(())
}

fn cmd_theme(
    ctx: &mut ViewContext,
    renderer: &mut Renderer,
    command: ThemeCommand,
) -> anyhow::Result<()> {
    if let ThemeCommand::Toggle = command {
        info!("command theme toggle");
        let dark = ctx.theme.toggle()?;
        renderer.set_dark(dark);
    }
    println!("{}", if ctx.theme.is_dark() { "dark" } else { "light" });
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDump<'a> {
    applications: &'a [Application],
    profile: &'a UserProfile,
    suggestions: &'a [Suggestion],
    documents: &'a [Document],
    dark_mode: bool,
}

fn cmd_export(ctx: &ViewContext) -> anyhow::Result<()> {
    info!("command export");

    let dump = ExportDump {
        applications: ctx.app.applications(),
        profile: ctx.app.profile(),
        suggestions: ctx.app.suggestions(),
        documents: ctx.app.documents(),
        dark_mode: ctx.theme.is_dark(),
    };
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}
