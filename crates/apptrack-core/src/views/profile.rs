use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::error::StateError;
use crate::model::UserProfile;
use crate::state::AppState;

/// Scalar profile fields settable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Email,
    Location,
    Gpa,
}

impl FromStr for ProfileField {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "location" => Ok(Self::Location),
            "gpa" => Ok(Self::Gpa),
            _ => Err(StateError::InvalidValue {
                kind: "profile field",
                value: s.to_string(),
            }),
        }
    }
}

/// The tag-style lists on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileList {
    Interests,
    CollegeTypes,
    ScholarshipTypes,
    Locations,
}

impl ProfileList {
    pub const ALL: [ProfileList; 4] = [
        ProfileList::Interests,
        ProfileList::CollegeTypes,
        ProfileList::ScholarshipTypes,
        ProfileList::Locations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interests => "interests",
            Self::CollegeTypes => "college-types",
            Self::ScholarshipTypes => "scholarship-types",
            Self::Locations => "locations",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Interests => "Interests",
            Self::CollegeTypes => "College Types",
            Self::ScholarshipTypes => "Scholarship Types",
            Self::Locations => "Preferred Locations",
        }
    }

    fn items<'p>(&self, profile: &'p UserProfile) -> &'p Vec<String> {
        match self {
            Self::Interests => &profile.interests,
            Self::CollegeTypes => &profile.preferences.college_types,
            Self::ScholarshipTypes => &profile.preferences.scholarship_types,
            Self::Locations => &profile.preferences.location,
        }
    }

    fn items_mut<'p>(&self, profile: &'p mut UserProfile) -> &'p mut Vec<String> {
        match self {
            Self::Interests => &mut profile.interests,
            Self::CollegeTypes => &mut profile.preferences.college_types,
            Self::ScholarshipTypes => &mut profile.preferences.scholarship_types,
            Self::Locations => &mut profile.preferences.location,
        }
    }
}

impl fmt::Display for ProfileList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileList {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        let wanted = match wanted.as_str() {
            "interest" => "interests",
            "college-type" => "college-types",
            "scholarship-type" => "scholarship-types",
            "location" => "locations",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|list| list.as_str() == wanted)
            .ok_or_else(|| StateError::InvalidValue {
                kind: "profile list",
                value: s.to_string(),
            })
    }
}

/// An editable copy of the profile. Dropping it discards the edits.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDraft {
    profile: UserProfile,
}

impl ProfileDraft {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            profile: state.profile().clone(),
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn set_name(&mut self, name: &str) {
        self.profile.name = name.to_string();
    }

    pub fn set_email(&mut self, email: &str) {
        self.profile.email = email.to_string();
    }

    pub fn set_location(&mut self, location: &str) {
        self.profile.location = location.to_string();
    }

    /// JSON has no NaN or infinity, so those are stored as 0.
    pub fn set_gpa(&mut self, gpa: f64) {
        self.profile.gpa = if gpa.is_finite() { gpa } else { 0.0 };
    }

    /// Text input for any scalar field. A GPA that does not parse to a
    /// finite number becomes 0.
    pub fn set(&mut self, field: ProfileField, value: &str) {
        match field {
            ProfileField::Name => self.set_name(value),
            ProfileField::Email => self.set_email(value),
            ProfileField::Location => self.set_location(value),
            ProfileField::Gpa => self.set_gpa(parse_gpa(value)),
        }
    }

    /// Returns false for blank or already-present values.
    pub fn add(&mut self, list: ProfileList, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || list.items(&self.profile).iter().any(|v| v == value) {
            return false;
        }
        list.items_mut(&mut self.profile).push(value.to_string());
        true
    }

    pub fn remove(&mut self, list: ProfileList, value: &str) -> bool {
        let items = list.items_mut(&mut self.profile);
        let before = items.len();
        items.retain(|v| v != value);
        items.len() != before
    }

    #[tracing::instrument(skip(self, state))]
    pub fn save(self, state: &mut AppState) -> anyhow::Result<()> {
        state.set_profile(self.profile)?;
        info!("saved profile");
        Ok(())
    }
}

fn parse_gpa(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|gpa| gpa.is_finite())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone)]
pub struct ProfileModel {
    pub profile: UserProfile,
    pub incomplete: bool,
}

impl ProfileModel {
    pub fn list(&self, list: ProfileList) -> &[String] {
        list.items(&self.profile)
    }
}

pub struct ProfileView<'a> {
    state: &'a AppState,
}

impl<'a> ProfileView<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub fn model(&self) -> ProfileModel {
        let profile = self.state.profile().clone();
        ProfileModel {
            incomplete: profile.is_incomplete(),
            profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{ProfileDraft, ProfileField, ProfileList, ProfileView};
    use crate::state::AppState;
    use crate::storage::{LocalStorage, MemoryStorage};

    #[test]
    fn lists_trim_and_skip_duplicates() {
        let state = AppState::open(Rc::new(MemoryStorage::new()));
        let mut draft = ProfileDraft::from_state(&state);

        assert!(draft.add(ProfileList::Interests, " Robotics "));
        assert!(!draft.add(ProfileList::Interests, "Robotics"));
        assert!(!draft.add(ProfileList::Interests, "   "));
        assert!(draft.add(ProfileList::CollegeTypes, "Liberal Arts"));
        assert_eq!(draft.profile().interests, vec!["Robotics"]);

        assert!(draft.remove(ProfileList::CollegeTypes, "Liberal Arts"));
        assert!(!draft.remove(ProfileList::CollegeTypes, "Liberal Arts"));
    }

    #[test]
    fn saving_persists_and_dropping_discards() {
        let backend: Rc<dyn LocalStorage> = Rc::new(MemoryStorage::new());
        let mut state = AppState::open(Rc::clone(&backend));

        let mut draft = ProfileDraft::from_state(&state);
        draft.set_name("Ada");
        drop(draft);
        assert_eq!(state.profile().name, "");

        let mut draft = ProfileDraft::from_state(&state);
        draft.set(ProfileField::Name, "Ada");
        draft.set(ProfileField::Location, "Boston");
        draft.set(ProfileField::Gpa, "3.5");
        draft.add(ProfileList::Interests, "Math");
        draft.save(&mut state).expect("save");

        let reopened = AppState::open(backend);
        assert_eq!(reopened.profile().name, "Ada");
        assert_eq!(reopened.profile().gpa, 3.5);
        assert!(!ProfileView::new(&reopened).model().incomplete);
    }

    #[test]
    fn non_finite_gpa_is_stored_as_zero() {
        let backend: Rc<dyn LocalStorage> = Rc::new(MemoryStorage::new());
        let mut state = AppState::open(Rc::clone(&backend));

        for raw in ["NaN", "inf", "-infinity"] {
            let mut draft = ProfileDraft::from_state(&state);
            draft.set(ProfileField::Name, "Ada");
            draft.set(ProfileField::Location, "Boston");
            draft.add(ProfileList::Interests, "Math");
            draft.set(ProfileField::Gpa, raw);
            assert_eq!(draft.profile().gpa, 0.0);
            draft.save(&mut state).expect("save");

            let reopened = AppState::open(Rc::clone(&backend));
            assert_eq!(reopened.profile(), state.profile());
            assert_eq!(reopened.profile().name, "Ada");
            assert_eq!(reopened.profile().interests, vec!["Math"]);
        }

        let mut draft = ProfileDraft::from_state(&state);
        draft.set_gpa(f64::NAN);
        assert_eq!(draft.profile().gpa, 0.0);
    }

    #[test]
    fn names_parse_loosely() {
        assert_eq!("college_type".parse::<ProfileList>(), Ok(ProfileList::CollegeTypes));
        assert_eq!("Locations".parse::<ProfileList>(), Ok(ProfileList::Locations));
        assert!("hobbies".parse::<ProfileList>().is_err());
        assert_eq!("GPA".parse::<ProfileField>(), Ok(ProfileField::Gpa));

        let state = AppState::open(Rc::new(MemoryStorage::new()));
        let mut draft = ProfileDraft::from_state(&state);
        draft.set(ProfileField::Gpa, "n/a");
        assert_eq!(draft.profile().gpa, 0.0);
    }
}
