use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Someone registered for an event, possibly without a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventParticipant {
    pub id: String,
    pub event_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
}

/// A person a certificate is issued to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub participant: Option<EventParticipant>,
    #[serde(default)]
    pub rank: Option<u32>,
}

pub const UNKNOWN_RECIPIENT: &str = "(unknown)";

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Recipient {
    pub fn from_user(user: User) -> Self {
        Recipient {
            id: user.id.clone(),
            user: Some(user),
            participant: None,
            rank: None,
        }
    }

    pub fn from_participant(participant: EventParticipant) -> Self {
        Recipient {
            id: participant.user_id.clone().unwrap_or_else(|| participant.id.clone()),
            user: None,
            participant: Some(participant),
            rank: None,
        }
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    /// Falls back from the user record to the participant record.
    pub fn display_name(&self) -> String {
        let user = self.user.as_ref();
        let participant = self.participant.as_ref();
        user.and_then(|u| non_blank(&u.full_name))
            .or_else(|| user.and_then(|u| non_blank(&u.username)))
            .or_else(|| participant.and_then(|p| non_blank(&p.full_name)))
            .or_else(|| participant.and_then(|p| non_blank(&p.name)))
            .unwrap_or(UNKNOWN_RECIPIENT)
            .to_string()
    }

    pub fn class_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| non_blank(&u.class_name))
            .or_else(|| self.participant.as_ref().and_then(|p| non_blank(&p.class_name)))
    }

    pub fn points(&self) -> Option<i64> {
        self.user.as_ref().and_then(|u| u.points)
    }
}
