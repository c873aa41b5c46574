//! Friend-code records as observed on the listing page and as persisted.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_LEVEL: &str = "?";
pub const NO_CODE: &str = "NoCode";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

static FRIEND_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4} [0-9]{4} [0-9]{4}$").expect("valid friend code regex")
});

// `\s` is Unicode-aware, so NBSP between groups is accepted too.
static FRIEND_CODE_IN_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{4})\s+([0-9]{4})\s+([0-9]{4})\b")
        .expect("valid friend code search regex")
});

/// In-game faction shown on a trainer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Valor,
    Mystic,
    Instinct,
    Unknown,
}

impl Team {
    pub const ALL: [Team; 4] = [Team::Valor, Team::Mystic, Team::Instinct, Team::Unknown];

    /// Classifies a container from its class tokens.
    ///
    /// Tokens are scanned in order and each is matched case-insensitively
    /// against the three team keywords; the first token containing one wins.
    /// A token such as `bubble-MYSTIC-dark` therefore classifies as
    /// [`Team::Mystic`]. No match yields [`Team::Unknown`].
    pub fn from_class_tokens<'a, I>(tokens: I) -> Team
    where
        I: IntoIterator<Item = &'a str>,
    {
        for token in tokens {
            let lowered = token.to_ascii_lowercase();
            for (keyword, team) in [
                ("valor", Team::Valor),
                ("mystic", Team::Mystic),
                ("instinct", Team::Instinct),
            ] {
                if lowered.contains(keyword) {
                    return team;
                }
            }
        }
        Team::Unknown
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Team::Valor => "Valor",
            Team::Mystic => "Mystic",
            Team::Instinct => "Instinct",
            Team::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One trainer entry extracted from the listing page.
///
/// `code` is the identity. Two records with the same code are the same
/// trainer even if name, level or location differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRecord {
    pub name: String,
    pub level: String,
    pub code: String,
    pub location: String,
    pub team: Team,
}

impl Default for FriendRecord {
    fn default() -> Self {
        Self {
            name: UNKNOWN_NAME.to_owned(),
            level: UNKNOWN_LEVEL.to_owned(),
            code: NO_CODE.to_owned(),
            location: UNKNOWN_LOCATION.to_owned(),
            team: Team::Unknown,
        }
    }
}

impl FriendRecord {
    /// Whether the record carries a well-formed friend code and may be persisted.
    #[must_use]
    pub fn has_valid_code(&self) -> bool {
        is_valid_friend_code(&self.code)
    }

    /// Promotes the candidate to a persisted row dated `date_added`.
    #[must_use]
    pub fn stamp(self, date_added: NaiveDate) -> StampedFriend {
        StampedFriend {
            record: self,
            date_added,
        }
    }
}

/// A record as it lives in the store: immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedFriend {
    pub record: FriendRecord,
    pub date_added: NaiveDate,
}

/// Returns `true` only for the exact `dddd dddd dddd` shape.
#[must_use]
pub fn is_valid_friend_code(code: &str) -> bool {
    FRIEND_CODE_RE.is_match(code)
}

/// Finds the first 4-4-4 digit group in `text` and renders it with single
/// ASCII spaces, e.g. `"Code:\u{a0}1234  5678 9012"` → `"1234 5678 9012"`.
#[must_use]
pub fn normalize_friend_code(text: &str) -> Option<String> {
    FRIEND_CODE_IN_TEXT_RE
        .captures(text)
        .map(|caps| format!("{} {} {}", &caps[1], &caps[2], &caps[3]))
}

#[cfg(test)]
#[path = "records_test.rs"]
mod tests;
