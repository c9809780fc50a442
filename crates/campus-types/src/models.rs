use std::fmt;

use serde::{Deserialize, Serialize};

/// Only students holding an address under this domain may sign up, log in or send messages.
pub const STUDENT_EMAIL_SUFFIX: &str = "@student.ufv.ca";

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_TITLE_LEN: usize = 3;
pub const MAX_LISTING_IMAGES: usize = 6;
pub const MAX_MESSAGE_LEN: usize = 1000;
pub const MAX_REPORT_REASON_LEN: usize = 500;

/// Case-insensitive check against [`STUDENT_EMAIL_SUFFIX`].
pub fn is_student_email(email: &str) -> bool {
    email.to_lowercase().ends_with(STUDENT_EMAIL_SUFFIX)
}

/// Trim and cap free text at `max` characters (not bytes).
pub fn clamp_text(text: &str, max: usize) -> String {
    text.trim().chars().take(max).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Campus {
    Abbotsford,
    Chilliwack,
}

impl Campus {
    pub fn as_str(self) -> &'static str {
        match self {
            Campus::Abbotsford => "abbotsford",
            Campus::Chilliwack => "chilliwack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "abbotsford" => Some(Campus::Abbotsford),
            "chilliwack" => Some(Campus::Chilliwack),
            _ => None,
        }
    }
}

/// Lifecycle of a listing. New listings always start out `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Sold,
    Removed,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ListingStatus::Active),
            "sold" => Some(ListingStatus::Sold),
            "removed" => Some(ListingStatus::Removed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    LikeNew,
    #[default]
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::LikeNew => "like_new",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Poor => "poor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Condition::New),
            "like_new" => Some(Condition::LikeNew),
            "good" => Some(Condition::Good),
            "fair" => Some(Condition::Fair),
            "poor" => Some(Condition::Poor),
            _ => None,
        }
    }
}

impl fmt::Display for Campus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
