use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{user, Client, Error};

/// Row of the `tickets` table, with the `attachments` relation joined in
/// on reads. Attachments live in their own table and are written
/// separately; messages are stored on the row itself.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ticket {
    pub id: Id,
    pub code: String,
    pub creator_id: user::Id,
    pub creator_name: String,
    pub title: String,
    pub kind: Kind,
    pub area: Area,
    pub status: Status,
    pub description: String,
    pub priority: u8,
    #[serde(default, skip_serializing)]
    pub attachments: Vec<Attachment>,
    pub messages: Vec<Message>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }

    /// Short display code shown on cards and in search, e.g. `T-4821`.
    pub fn display_code(&self) -> String {
        let bytes = self.0.as_bytes();
        let n = u16::from_be_bytes([bytes[0], bytes[1]]) % 9000;
        format!("T-{}", 1000 + n)
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
pub enum Kind {
    #[display("Ayuda")]
    #[serde(rename = "Ayuda")]
    Help,

    #[display("Consulta")]
    #[serde(rename = "Consulta")]
    Query,

    #[display("Error")]
    Error,

    #[display("Solicitud")]
    #[serde(rename = "Solicitud")]
    Request,

    #[display("Mejora")]
    #[serde(rename = "Mejora")]
    Improvement,
}

impl Kind {
    pub const ALL: [Kind; 5] = [
        Kind::Help,
        Kind::Query,
        Kind::Error,
        Kind::Request,
        Kind::Improvement,
    ];
}

/// Organizational department a ticket is attributed to.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
pub enum Area {
    #[display("Comercial")]
    #[serde(rename = "Comercial")]
    Commercial,

    #[display("Marketing")]
    Marketing,

    #[display("Operativa")]
    #[serde(rename = "Operativa")]
    Operations,

    #[display("Soporte")]
    #[serde(rename = "Soporte")]
    Support,

    #[display("Crediticia")]
    #[serde(rename = "Crediticia")]
    Credit,
}

impl Area {
    pub const ALL: [Area; 5] = [
        Area::Commercial,
        Area::Marketing,
        Area::Operations,
        Area::Support,
        Area::Credit,
    ];
}

/// Fixed five-stage workflow. The order here is the kanban column order.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
pub enum Status {
    #[display("Enviado")]
    #[serde(rename = "Enviado")]
    Sent,

    #[display("Revisión")]
    #[serde(rename = "Revisión")]
    Review,

    #[display("Aprobado")]
    #[serde(rename = "Aprobado")]
    Approved,

    #[display("En proceso")]
    #[serde(rename = "En proceso")]
    InProgress,

    #[display("Resuelto")]
    #[serde(rename = "Resuelto")]
    Resolved,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Sent,
        Status::Review,
        Status::Approved,
        Status::InProgress,
        Status::Resolved,
    ];
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub url: String,
    /// Human-readable size, e.g. `256KB`.
    pub size: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Message {
    pub id: String,
    pub author: String,
    pub role: user::Role,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Partial update applied to a ticket row.
#[derive(Debug, Serialize)]
pub struct Changes<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<&'a [Message]>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Client {
    pub async fn get_tickets(&self, token: &str) -> Result<Vec<Ticket>, Error> {
        let req = self
            .http
            .get(format!("{}/rest/v1/tickets", self.url))
            .query(&[("select", "*,attachments(*)")]);
        Ok(self.send(req, token).await?.json().await?)
    }

    pub async fn get_ticket_by_id(
        &self,
        token: &str,
        id: Id,
    ) -> Result<Option<Ticket>, Error> {
        let req = self
            .http
            .get(format!("{}/rest/v1/tickets", self.url))
            .query(&[
                ("select", "*,attachments(*)".to_string()),
                ("id", format!("eq.{id}")),
            ]);
        let rows: Vec<Ticket> = self.send(req, token).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    pub async fn insert_ticket(
        &self,
        token: &str,
        ticket: &Ticket,
    ) -> Result<(), Error> {
        let req = self
            .http
            .post(format!("{}/rest/v1/tickets", self.url))
            .json(ticket);
        self.send(req, token).await?;

        if ticket.attachments.is_empty() {
            return Ok(());
        }

        let rows = ticket
            .attachments
            .iter()
            .map(|a| {
                json!({
                    "id": a.id,
                    "ticket_id": ticket.id,
                    "name": a.name,
                    "mime_type": a.mime_type,
                    "url": a.url,
                    "size": a.size,
                })
            })
            .collect::<Vec<_>>();
        let req = self
            .http
            .post(format!("{}/rest/v1/attachments", self.url))
            .json(&rows);
        self.send(req, token).await.map(drop)
    }

    pub async fn update_ticket(
        &self,
        token: &str,
        id: Id,
        changes: &Changes<'_>,
    ) -> Result<(), Error> {
        let req = self
            .http
            .patch(format!("{}/rest/v1/tickets", self.url))
            .query(&[("id", format!("eq.{id}"))])
            .json(changes);
        self.send(req, token).await.map(drop)
    }
}
