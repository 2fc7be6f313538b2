use std::cmp::Ordering;

use tracing::trace;

use crate::model::{
  Application,
  ApplicationKind,
  ApplicationStatus,
  Document,
  DocumentStatus,
  Suggestion
};

fn name_matches(
  name: &str,
  search: &str
) -> bool {
  name
    .to_lowercase()
    .contains(&search.to_lowercase())
}

/// Search text plus optional exact
/// status/type selectors; `None`
/// means "all". Every criterion must
/// hold.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
  pub search: String,
  pub status: Option<ApplicationStatus>,
  pub kind:   Option<ApplicationKind>
}

impl ApplicationFilter {
  pub fn matches(
    &self,
    app: &Application
  ) -> bool {
    let matches_search =
      name_matches(&app.name, &self.search);
    let matches_status = self
      .status
      .is_none_or(|s| app.status == s);
    let matches_kind = self
      .kind
      .is_none_or(|k| app.kind == k);
    matches_search
      && matches_status
      && matches_kind
  }

  pub fn is_active(&self) -> bool {
    !self.search.is_empty()
      || self.status.is_some()
      || self.kind.is_some()
  }

  #[tracing::instrument(skip(
    self, apps
  ))]
  pub fn apply<'a>(
    &self,
    apps: &'a [Application]
  ) -> Vec<&'a Application> {
    let out: Vec<&Application> = apps
      .iter()
      .filter(|app| self.matches(app))
      .collect();
    trace!(
      total = apps.len(),
      kept = out.len(),
      "filtered applications"
    );
    out
  }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
  pub search:   String,
  pub doc_type: Option<String>,
  pub status:   Option<DocumentStatus>
}

impl DocumentFilter {
  pub fn matches(
    &self,
    doc: &Document
  ) -> bool {
    let matches_search =
      name_matches(&doc.name, &self.search);
    let matches_type = self
      .doc_type
      .as_deref()
      .is_none_or(|t| doc.doc_type == t);
    let matches_status = self
      .status
      .is_none_or(|s| doc.status == s);
    matches_search
      && matches_type
      && matches_status
  }

  pub fn is_active(&self) -> bool {
    !self.search.is_empty()
      || self.doc_type.is_some()
      || self.status.is_some()
  }

  pub fn apply<'a>(
    &self,
    docs: &'a [Document]
  ) -> Vec<&'a Document> {
    docs
      .iter()
      .filter(|doc| self.matches(doc))
      .collect()
  }
}

/// Distinct document types in first-
/// seen order.
pub fn document_types(
  docs: &[Document]
) -> Vec<String> {
  let mut out: Vec<String> = vec![];
  for doc in docs {
    if !out.contains(&doc.doc_type) {
      out.push(doc.doc_type.clone());
    }
  }
  out
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum SuggestionSort {
  #[default]
  Match,
  Deadline
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionQuery {
  pub kind: Option<ApplicationKind>,
  pub sort: SuggestionSort
}

impl SuggestionQuery {
  pub fn apply<'a>(
    &self,
    suggestions: &'a [Suggestion]
  ) -> Vec<&'a Suggestion> {
    let mut out: Vec<&Suggestion> =
      suggestions
        .iter()
        .filter(|s| {
          self
            .kind
            .is_none_or(|k| s.kind == k)
        })
        .collect();
    match self.sort {
      | SuggestionSort::Match => {
        out.sort_by(|a, b| {
          b.match_score
            .cmp(&a.match_score)
        });
      }
      | SuggestionSort::Deadline => {
        out.sort_by(|a, b| {
          a.deadline.cmp(&b.deadline)
        });
      }
    }
    out
  }
}

/// Ascending by deadline; ties keep
/// their stored order.
pub fn sort_by_deadline(
  apps: &mut [&Application]
) {
  apps.sort_by(|a, b| {
    compare_deadlines(a, b)
  });
}

fn compare_deadlines(
  a: &Application,
  b: &Application
) -> Ordering {
  a.deadline.cmp(&b.deadline)
}
