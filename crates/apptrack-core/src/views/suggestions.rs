//! Suggested colleges and scholarships, and the catalog they come from.

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::datetime::{Clock, DeadlineState};
use crate::filter::SuggestionQuery;
use crate::model::{ApplicationKind, MatchBand, Suggestion, new_id};
use crate::state::AppState;

/// Suggestions closing within this many days are flagged.
pub const URGENT_SUGGESTION_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionCard {
    pub id: String,
    pub name: String,
    pub kind: ApplicationKind,
    pub match_score: u8,
    pub band: MatchBand,
    pub deadline: NaiveDate,
    pub days_until: i64,
    pub deadline_state: DeadlineState,
    pub urgent: bool,
    pub description: String,
    pub category: String,
}

impl SuggestionCard {
    pub fn from_suggestion(suggestion: &Suggestion, clock: &Clock) -> Self {
        let days_until = clock.days_until(suggestion.deadline);
        Self {
            id: suggestion.id.clone(),
            name: suggestion.name.clone(),
            kind: suggestion.kind,
            match_score: suggestion.match_score,
            band: suggestion.band(),
            deadline: suggestion.deadline,
            days_until,
            deadline_state: DeadlineState::from_days(days_until),
            urgent: days_until <= URGENT_SUGGESTION_DAYS,
            description: suggestion.description.clone(),
            category: suggestion.category.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuggestionsModel {
    pub cards: Vec<SuggestionCard>,
    /// Nudge the user toward the profile page for better matches.
    pub profile_incomplete: bool,
}

impl SuggestionsModel {
    pub fn count(&self) -> usize {
        self.cards.len()
    }
}

pub struct SuggestionsView<'a> {
    state: &'a AppState,
    query: SuggestionQuery,
}

impl<'a> SuggestionsView<'a> {
    pub fn new(state: &'a AppState, query: SuggestionQuery) -> Self {
        Self { state, query }
    }

    pub fn model(&self, clock: &Clock) -> SuggestionsModel {
        SuggestionsModel {
            cards: self
                .query
                .apply(self.state.suggestions())
                .into_iter()
                .map(|s| SuggestionCard::from_suggestion(s, clock))
                .collect(),
            profile_incomplete: self.state.profile().is_incomplete(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(rename = "type")]
    kind: ApplicationKind,
    #[serde(rename = "match")]
    match_score: u8,
    deadline: NaiveDate,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
}

impl From<CatalogEntry> for Suggestion {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id),
            name: entry.name,
            kind: entry.kind,
            match_score: entry.match_score,
            deadline: entry.deadline,
            description: entry.description,
            category: entry.category,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    suggestions: Vec<CatalogEntry>,
}

/// Parse a catalog: TOML with `[[suggestions]]` tables when `path` ends in
/// `.toml`, otherwise a JSON array.
pub fn parse_catalog(text: &str, path: &Path) -> anyhow::Result<Vec<Suggestion>> {
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let entries = if is_toml {
        toml::from_str::<TomlCatalog>(text)
            .with_context(|| format!("failed to parse TOML catalog {}", path.display()))?
            .suggestions
    } else {
        serde_json::from_str::<Vec<CatalogEntry>>(text)
            .with_context(|| format!("failed to parse JSON catalog {}", path.display()))?
    };

    for entry in &entries {
        if entry.match_score > 100 {
            warn!(name = %entry.name, score = entry.match_score, "match score above 100");
        }
    }
    Ok(entries.into_iter().map(Suggestion::from).collect())
}

/// Merge a catalog file into the stored suggestions. Entries whose id is
/// already stored replace it in place; the rest are appended.
#[tracing::instrument(skip(state), fields(path = %path.display()))]
pub fn import_catalog(state: &mut AppState, path: &Path) -> anyhow::Result<usize> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    let incoming = parse_catalog(&text, path)?;
    let count = incoming.len();

    state.update_suggestions(|prev| merge_by_id(prev, incoming))?;
    info!(imported = count, total = state.suggestions().len(), "imported suggestions");
    Ok(count)
}

fn merge_by_id(existing: &[Suggestion], incoming: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut out = existing.to_vec();
    for suggestion in incoming {
        match out.iter_mut().find(|s| s.id == suggestion.id) {
            Some(slot) => *slot = suggestion,
            None => out.push(suggestion),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;

    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::Tz;

    use super::{SuggestionsView, import_catalog, parse_catalog};
    use crate::datetime::Clock;
    use crate::filter::{SuggestionQuery, SuggestionSort};
    use crate::model::{ApplicationKind, MatchBand, Priority};
    use crate::state::AppState;
    use crate::storage::MemoryStorage;

    const CATALOG: &str = r#"
[[suggestions]]
id = "gates"
name = "Gates Scholarship"
type = "scholarship"
match = 95
deadline = "2026-11-10"
description = "Full cost of attendance."
category = "Merit"

[[suggestions]]
name = "UC Berkeley"
type = "college"
match = 72
deadline = "2027-01-15"
"#;

    fn clock() -> Clock {
        Clock::fixed(
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
                .single()
                .expect("valid now"),
            Tz::UTC,
        )
    }

    #[test]
    fn toml_catalog_fills_missing_ids() {
        let parsed = parse_catalog(CATALOG, Path::new("catalog.toml")).expect("parse");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, "gates");
        assert!(!parsed[1].id.is_empty());
        assert_eq!(parsed[1].kind, ApplicationKind::College);
        assert_eq!(parsed[1].description, "");
    }

    #[test]
    fn json_catalog_is_an_array() {
        let json = r#"[{"id":"mit","name":"MIT","type":"college","match":88,"deadline":"2027-01-01"}]"#;
        let parsed = parse_catalog(json, Path::new("catalog.json")).expect("parse");
        assert_eq!(parsed[0].match_score, 88);
        assert!(parse_catalog("{}", Path::new("catalog.json")).is_err());
    }

    #[test]
    fn import_merges_by_id_and_model_flags_urgency() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.toml");
        fs::write(&path, CATALOG).expect("write catalog");

        let mut state = AppState::open(Rc::new(MemoryStorage::new()));
        assert_eq!(import_catalog(&mut state, &path).expect("import"), 2);
        assert_eq!(import_catalog(&mut state, &path).expect("import"), 2);
        // "gates" is replaced, the id-less entry gets a fresh id each time.
        assert_eq!(state.suggestions().len(), 3);

        let model = SuggestionsView::new(&state, SuggestionQuery::default()).model(&clock());
        assert!(model.profile_incomplete);
        assert_eq!(model.count(), 3);
        let top = &model.cards[0];
        assert_eq!(top.id, "gates");
        assert_eq!(top.band, MatchBand::Excellent);
        assert_eq!(top.days_until, 22);
        assert!(top.urgent);
        assert!(!model.cards[1].urgent);

        let query = SuggestionQuery {
            kind: Some(ApplicationKind::College),
            sort: SuggestionSort::Deadline,
        };
        let model = SuggestionsView::new(&state, query).model(&clock());
        assert_eq!(model.count(), 2);
    }

    #[test]
    fn adopting_copies_into_applications() {
        let mut state = AppState::open(Rc::new(MemoryStorage::new()));
        let suggestions = parse_catalog(CATALOG, Path::new("catalog.toml")).expect("parse");
        state.set_suggestions(suggestions).expect("seed");

        let app = state.adopt_suggestion("gates").expect("adopt");
        assert_eq!(app.priority, Priority::High);
        assert_eq!(
            app.deadline,
            NaiveDate::from_ymd_opt(2026, 11, 10).expect("valid date")
        );
        assert_eq!(state.suggestions().len(), 2);
        assert_eq!(state.applications().len(), 1);
    }
}
