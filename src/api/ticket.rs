use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::backend;

pub use crate::backend::ticket::{
    Area, Attachment, Id, Kind, Message, Status,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Id,
    pub code: String,
    pub creator_id: super::user::Id,
    pub creator_name: String,
    pub title: String,
    pub kind: Kind,
    pub area: Area,
    pub status: Status,
    pub description: String,
    pub priority: u8,
    pub attachments: Vec<Attachment>,
    pub messages: Vec<Message>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<backend::Ticket> for Ticket {
    fn from(t: backend::Ticket) -> Self {
        Self {
            id: t.id,
            code: t.code,
            creator_id: t.creator_id,
            creator_name: t.creator_name,
            title: t.title,
            kind: t.kind,
            area: t.area,
            status: t.status,
            description: t.description,
            priority: t.priority,
            attachments: t.attachments,
            messages: t.messages,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub tickets: Vec<Ticket>,
    pub total_count: usize,
}

/// Kanban board: one column per workflow status, in workflow order.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub columns: Vec<Column>,
    /// Whether the caller may drag cards between columns.
    pub can_move: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub status: Status,
    pub tickets: Vec<Ticket>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total: usize,
    /// Everything not yet resolved.
    pub pending: usize,
    pub resolved: usize,
    /// Error-kind tickets.
    pub critical: usize,
    pub recent: Vec<Ticket>,
}
