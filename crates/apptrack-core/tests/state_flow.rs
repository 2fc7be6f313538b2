use std::fs;
use std::rc::Rc;

use apptrack_core::model::{
    ApplicationKind, ApplicationStatus, Document, DocumentStatus, FileHandle, Priority,
    Suggestion, UserProfile,
};
use apptrack_core::state::{AppState, ThemeState, ViewContext};
use apptrack_core::storage::{FileStorage, LocalStorage};
use apptrack_core::views::applications::ApplicationDraft;
use apptrack_core::views::documents::upload_document;
use chrono::NaiveDate;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn file_storage(dir: &std::path::Path) -> Rc<dyn LocalStorage> {
    Rc::new(FileStorage::open(dir).expect("open storage"))
}

fn draft(name: &str, deadline: NaiveDate) -> ApplicationDraft {
    let mut draft = ApplicationDraft::new();
    draft.name = name.to_string();
    draft.deadline = Some(deadline);
    draft
}

#[test]
fn collections_round_trip_through_files() {
    let temp = tempdir().expect("tempdir");
    let mut state = AppState::open(file_storage(temp.path()));

    let mut stanford = draft("Stanford", date(2026, 12, 1));
    stanford.add_requirement("Personal essay");
    stanford.add_checklist_item("Request transcript");
    stanford.location = "Palo Alto, CA".to_string();
    stanford.submit(&mut state).expect("add");

    let mut gates = draft("Gates Scholarship", date(2026, 11, 10));
    gates.kind = ApplicationKind::Scholarship;
    gates.status = ApplicationStatus::Submitted;
    gates.submit(&mut state).expect("add");

    state
        .set_profile(UserProfile {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            location: "Boston".to_string(),
            gpa: 3.75,
            interests: vec!["Math".to_string()],
            ..UserProfile::default()
        })
        .expect("profile");

    let reopened = AppState::open(file_storage(temp.path()));
    assert_eq!(reopened.applications(), state.applications());
    assert_eq!(reopened.profile(), state.profile());
    assert!(temp.path().join("applications.json").exists());
}

#[test]
fn suggestions_and_documents_round_trip_through_files() {
    let temp = tempdir().expect("tempdir");
    let mut state = AppState::open(file_storage(temp.path()));

    let suggestions = vec![
        Suggestion {
            id: "gates".to_string(),
            name: "Gates Scholarship".to_string(),
            kind: ApplicationKind::Scholarship,
            match_score: 88,
            deadline: date(2026, 11, 10),
            description: "Full cost of attendance.".to_string(),
            category: "Need-based".to_string(),
        },
        Suggestion {
            id: "mit".to_string(),
            name: "MIT".to_string(),
            kind: ApplicationKind::College,
            match_score: 95,
            deadline: date(2027, 1, 1),
            description: String::new(),
            category: "Research University".to_string(),
        },
    ];
    let documents = vec![
        Document {
            id: "essay".to_string(),
            name: "personal-statement.docx".to_string(),
            doc_type: "Personal Statement".to_string(),
            upload_date: date(2026, 10, 1),
            status: DocumentStatus::Completed,
            size: "18.5 KB".to_string(),
            file: None,
        },
        Document {
            id: "cv".to_string(),
            name: "resume.pdf".to_string(),
            doc_type: "Resume".to_string(),
            upload_date: date(2026, 10, 19),
            status: DocumentStatus::Pending,
            size: "0 Bytes".to_string(),
            file: None,
        },
    ];
    state.set_suggestions(suggestions.clone()).expect("suggestions");
    state.set_documents(documents.clone()).expect("documents");

    let reopened = AppState::open(file_storage(temp.path()));
    assert_eq!(reopened.suggestions(), suggestions.as_slice());
    assert_eq!(reopened.documents(), documents.as_slice());
}

#[test]
fn one_unknown_status_keeps_the_other_applications() {
    let temp = tempdir().expect("tempdir");
    let stored = r#"[
        {"id":"a1","name":"Stanford","type":"college","deadline":"2026-12-01",
         "status":"not-started","priority":"high"},
        {"id":"a2","name":"Yale","type":"college","deadline":"2026-12-15",
         "status":"waitlisted","priority":"low"},
        {"id":"a3","name":"Gates","type":"scholarship","deadline":"2026-11-10",
         "status":"submitted"}
    ]"#;
    fs::write(temp.path().join("applications.json"), stored).expect("write");

    let mut state = AppState::open(file_storage(temp.path()));
    let names: Vec<&str> = state.applications().iter().map(|app| app.name.as_str()).collect();
    assert_eq!(names, vec!["Stanford", "Gates"]);
    assert_eq!(state.applications()[1].priority, Priority::Medium);

    draft("Brown", date(2026, 12, 20))
        .submit(&mut state)
        .expect("add");
    let reopened = AppState::open(file_storage(temp.path()));
    assert_eq!(reopened.applications().len(), 3);
    assert_eq!(reopened.applications(), state.applications());
}

#[test]
fn corrupt_slot_falls_back_to_default() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("applications.json"), "{not json").expect("write");
    fs::write(temp.path().join("darkMode.json"), "\"maybe\"").expect("write");

    let state = AppState::open(file_storage(temp.path()));
    let theme = ThemeState::open(file_storage(temp.path()));
    assert!(state.applications().is_empty());
    assert!(theme.is_dark());
}

#[test]
fn setting_the_same_value_twice_is_idempotent() {
    let temp = tempdir().expect("tempdir");
    let storage = file_storage(temp.path());
    let mut state = AppState::open(Rc::clone(&storage));
    let profile = UserProfile {
        name: "Ada".to_string(),
        ..UserProfile::default()
    };

    state.set_profile(profile.clone()).expect("first");
    let first = storage.get_item("profile").expect("read");
    state.set_profile(profile).expect("second");
    let second = storage.get_item("profile").expect("read");

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn adopting_a_high_match_suggestion() {
    let temp = tempdir().expect("tempdir");
    let mut state = AppState::open(file_storage(temp.path()));
    let suggestion = Suggestion {
        id: "mit".to_string(),
        name: "MIT".to_string(),
        kind: ApplicationKind::College,
        match_score: 95,
        deadline: date(2027, 1, 1),
        description: "Strong STEM fit.".to_string(),
        category: "Research University".to_string(),
    };
    state.set_suggestions(vec![suggestion.clone()]).expect("seed");

    let app = state.adopt_suggestion("mit").expect("adopt");
    assert_eq!(app.priority, Priority::High);
    assert_eq!(app.status, ApplicationStatus::NotStarted);
    assert_ne!(app.id, suggestion.id);
    assert!(app.notes.starts_with("Added from AI suggestions. Match score: 95%"));
    assert_eq!(state.suggestions(), &[suggestion]);

    let reopened = AppState::open(file_storage(temp.path()));
    assert_eq!(reopened.applications().len(), 1);
}

#[test]
fn deleting_one_application_leaves_the_rest() {
    let temp = tempdir().expect("tempdir");
    let mut state = AppState::open(file_storage(temp.path()));

    let mut keep = draft("Yale", date(2026, 12, 15));
    let item = keep.add_checklist_item("Interview").expect("item");
    keep.toggle_checklist_item(&item);
    let keep = keep.submit(&mut state).expect("add");
    let doomed = draft("Brown", date(2026, 12, 20))
        .submit(&mut state)
        .expect("add");

    let removed = state.delete_application(&doomed.id).expect("delete");
    assert_eq!(removed.name, "Brown");
    assert_eq!(state.applications(), &[keep.clone()]);
    assert!(state.delete_application(&doomed.id).is_err());

    let reopened = AppState::open(file_storage(temp.path()));
    assert_eq!(reopened.applications(), &[keep]);
    assert!(reopened.applications()[0].checklist[0].completed);
}

#[test]
fn toggling_theme_twice_restores_stored_value() {
    let temp = tempdir().expect("tempdir");
    let storage = file_storage(temp.path());
    let mut theme = ThemeState::open(Rc::clone(&storage));
    assert!(theme.is_dark());

    assert!(!theme.toggle().expect("toggle"));
    assert_eq!(
        storage.get_item("darkMode").expect("read").as_deref(),
        Some("false")
    );
    assert!(theme.toggle().expect("toggle"));
    assert_eq!(
        storage.get_item("darkMode").expect("read").as_deref(),
        Some("true")
    );
    assert!(ThemeState::open(storage).is_dark());
}

#[test]
fn uploaded_bytes_do_not_survive_reload() {
    let temp = tempdir().expect("tempdir");
    let storage = file_storage(temp.path());
    let mut state = AppState::open(Rc::clone(&storage));

    let doc = upload_document(
        &mut state,
        FileHandle {
            name: "transcript.pdf".to_string(),
            bytes: vec![7; 2048],
        },
        date(2026, 10, 19),
    )
    .expect("upload");
    assert!(doc.file.is_some());

    let ctx = ViewContext::builder()
        .app(AppState::open(Rc::clone(&storage)))
        .theme(ThemeState::open(storage))
        .build()
        .expect("context");
    let reloaded = &ctx.app.documents()[0];
    assert_eq!(reloaded.id, doc.id);
    assert_eq!(reloaded.size, "2 KB");
    assert_eq!(reloaded.doc_type, "Transcript");
    assert!(reloaded.file.is_none());
}
