use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StateError;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = StateError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                $name::ALL
                    .iter()
                    .find(|value| value.as_str() == wanted)
                    .cloned()
                    .ok_or_else(|| StateError::InvalidValue {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationKind {
    College,
    Scholarship,
}

string_enum!(ApplicationKind, "application type", {
    College => "college",
    Scholarship => "scholarship",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    NotStarted,
    InProgress,
    Submitted,
    Accepted,
    Rejected,
}

string_enum!(ApplicationStatus, "status", {
    NotStarted => "not-started",
    InProgress => "in-progress",
    Submitted => "submitted",
    Accepted => "accepted",
    Rejected => "rejected",
});

impl ApplicationStatus {
    /// Title-cased label, e.g. "Not Started".
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Submitted => "Submitted",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }

    /// Submitted and accepted applications no longer count against a deadline.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Submitted | Self::Accepted)
    }
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

string_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl Priority {
    pub fn from_match_score(score: u8) -> Self {
        if score >= 90 {
            Self::High
        } else if score >= 70 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Completed,
}

string_enum!(DocumentStatus, "document status", {
    Pending => "pending",
    Completed => "completed",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(text: &str) -> Self {
        Self {
            id: new_id(),
            text: text.to_string(),
            completed: false,
        }
    }
}

/// Uploaded bytes. Lives only as long as the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub upload_date: NaiveDate,
    pub status: DocumentStatus,
    pub size: String,
    #[serde(skip)]
    pub file: Option<Rc<FileHandle>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ApplicationKind,
    pub deadline: NaiveDate,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Application {
    pub fn new(name: String, kind: ApplicationKind, deadline: NaiveDate) -> Self {
        Self {
            id: new_id(),
            name,
            kind,
            deadline,
            status: ApplicationStatus::NotStarted,
            requirements: vec![],
            documents: vec![],
            notes: String::new(),
            checklist: vec![],
            priority: Priority::Medium,
            location: None,
            category: None,
        }
    }

    pub fn completed_tasks(&self) -> usize {
        self.checklist.iter().filter(|item| item.completed).count()
    }

    pub fn progress_percent(&self) -> f64 {
        if self.checklist.is_empty() {
            return 0.0;
        }
        self.completed_tasks() as f64 / self.checklist.len() as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub college_types: Vec<String>,
    #[serde(default)]
    pub scholarship_types: Vec<String>,
    #[serde(default)]
    pub location: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub location: String,
    pub gpa: f64,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl UserProfile {
    /// Suggestions nag until these are filled in.
    pub fn is_incomplete(&self) -> bool {
        self.name.is_empty() || self.location.is_empty() || self.interests.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBand {
    Excellent,
    Strong,
    Fair,
    Weak,
}

impl MatchBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Excellent,
            70..=89 => Self::Strong,
            50..=69 => Self::Fair,
            _ => Self::Weak,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ApplicationKind,
    #[serde(rename = "match")]
    pub match_score: u8,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
}

impl Suggestion {
    pub fn band(&self) -> MatchBand {
        MatchBand::from_score(self.match_score)
    }

    /// One-way copy into a fresh application.
    pub fn to_application(&self) -> Application {
        Application {
            id: new_id(),
            name: self.name.clone(),
            kind: self.kind,
            deadline: self.deadline,
            status: ApplicationStatus::NotStarted,
            requirements: vec![],
            documents: vec![],
            notes: format!(
                "Added from AI suggestions. Match score: {}%\n\n{}",
                self.match_score, self.description
            ),
            checklist: vec![],
            priority: Priority::from_match_score(self.match_score),
            location: None,
            category: Some(self.category.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityIcon {
    Created,
    Updated,
    Deleted,
    Uploaded,
    Adopted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityItem {
    pub id: String,
    pub action: String,
    pub target: String,
    pub time: String,
    pub icon: ActivityIcon,
    pub color: String,
}

impl ActivityItem {
    pub fn just_now(action: &str, target: &str, icon: ActivityIcon, color: &str) -> Self {
        Self {
            id: new_id(),
            action: action.to_string(),
            target: target.to_string(),
            time: "just now".to_string(),
            icon,
            color: color.to_string(),
        }
    }
}
