use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Badge classification shown on a mugshot.
///
/// Assigned externally (community votes, admin curation); the access
/// decision never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Default,
    CommunityPick,
    StartupSaviour,
}

impl Badge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::Default => "default",
            Badge::CommunityPick => "community_pick",
            Badge::StartupSaviour => "startup_saviour",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Badge::Default),
            "community_pick" => Some(Badge::CommunityPick),
            "startup_saviour" => Some(Badge::StartupSaviour),
            _ => None,
        }
    }
}

/// Mugshot model - SQL persistence layer
///
/// One-to-one optional extension of a user. At most one row per user
/// (unique constraint on user_id).
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Mugshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Free-text tagline ("crime" the maker is wanted for).
    pub crime: String,
    pub note: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub social_handle: Option<String>,
    pub badge: String,
    pub created_at: DateTime<Utc>,
}

impl Mugshot {
    pub fn badge(&self) -> Badge {
        Badge::parse(&self.badge).unwrap_or(Badge::Default)
    }
}

/// Validation failure for inbound profile payloads.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),
}

const MAX_NAME_LEN: usize = 120;
const MAX_CRIME_LEN: usize = 200;
const MAX_NOTE_LEN: usize = 1000;

fn require_bounded(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong(field, max));
    }
    Ok(())
}

/// Profile-creation payload, validated at the boundary before it reaches
/// the store layer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMugshot {
    pub name: String,
    pub crime: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub social_handle: Option<String>,
}

impl CreateMugshot {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_bounded("name", &self.name, MAX_NAME_LEN)?;
        require_bounded("crime", &self.crime, MAX_CRIME_LEN)?;
        if let Some(note) = &self.note {
            if note.chars().count() > MAX_NOTE_LEN {
                return Err(ValidationError::TooLong("note", MAX_NOTE_LEN));
            }
        }
        Ok(())
    }
}

/// Owner-initiated profile update. Only present fields are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMugshot {
    pub name: Option<String>,
    pub crime: Option<String>,
    pub note: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub social_handle: Option<String>,
}

impl UpdateMugshot {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_bounded("name", name, MAX_NAME_LEN)?;
        }
        if let Some(crime) = &self.crime {
            require_bounded("crime", crime, MAX_CRIME_LEN)?;
        }
        if let Some(note) = &self.note {
            if note.chars().count() > MAX_NOTE_LEN {
                return Err(ValidationError::TooLong("note", MAX_NOTE_LEN));
            }
        }
        Ok(())
    }
}
