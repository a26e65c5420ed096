//! Moderation records mutated by command handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatus {
    Active,
    Watched,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Watched => "WATCHED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "WATCHED" => Some(Self::Watched),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Warning,
    Kick,
    TempBan,
    PermBan,
    Note,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Kick => "KICK",
            Self::TempBan => "TEMP_BAN",
            Self::PermBan => "PERM_BAN",
            Self::Note => "NOTE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WARNING" => Some(Self::Warning),
            "KICK" => Some(Self::Kick),
            "TEMP_BAN" => Some(Self::TempBan),
            "PERM_BAN" => Some(Self::PermBan),
            "NOTE" => Some(Self::Note),
            _ => None,
        }
    }

    pub fn is_ban(&self) -> bool {
        matches!(self, Self::TempBan | Self::PermBan)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Open,
    InReview,
    Closed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InReview => "IN_REVIEW",
            Self::Closed => "CLOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "IN_REVIEW" => Some(Self::InReview),
            "CLOSED" => Some(Self::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Open,
    InReview,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InReview => "IN_REVIEW",
            Self::Resolved => "RESOLVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "IN_REVIEW" => Some(Self::InReview),
            "RESOLVED" => Some(Self::Resolved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub status: PlayerStatus,
}

/// A moderation action recorded against a player (warning, kick, ban, note).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationAction {
    pub id: String,
    pub tenant_id: String,
    pub action_type: ActionType,
    pub player_id: String,
    pub moderator_id: String,
    pub reason: String,
    pub duration_minutes: Option<i64>,
    pub evidence_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<String>,
    pub revoked_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: String,
    pub tenant_id: String,
    pub title: String,
    pub description: String,
    pub status: CaseStatus,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub tenant_id: String,
    pub summary: String,
    pub reporter_name: Option<String>,
    pub reporter_contact: Option<String>,
    pub accused_player_id: Option<String>,
    pub status: ReportStatus,
    pub case_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
