use serde::{Deserialize, Serialize};

use crate::backend;

pub use crate::backend::user::{Id, Role};

use super::ticket::Area;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub area: Option<Area>,
    pub avatar_url: String,
}

impl From<backend::Profile> for User {
    fn from(p: backend::Profile) -> Self {
        Self {
            id: p.id,
            name: p.name,
            email: p.email,
            role: p.role,
            area: p.area,
            avatar_url: p.avatar_url,
        }
    }
}

/// Application screens. Which ones a caller may open is resolved from the
/// role, never decided client-side.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    Dashboard,
    Kanban,
    Create,
    Analytics,
    UserAccess,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
    pub views: Vec<View>,
}
