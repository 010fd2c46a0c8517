use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ticket::Area, Client, Error};

/// Row of the `profiles` table. Auth identities live in the backend's own
/// user store; a profile row carries everything the application needs.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Profile {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Required for executives, absent for admins.
    pub area: Option<Area>,
    pub avatar_url: String,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
pub enum Role {
    #[display("Ejecutivo")]
    #[serde(rename = "Ejecutivo")]
    Executive,

    #[display("Administrador")]
    #[serde(rename = "Administrador")]
    Admin,
}

/// Successful password-grant response.
#[derive(Debug, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Deserialize)]
pub struct AuthUser {
    pub id: Id,
}

impl Client {
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, Error> {
        let req = self
            .http
            .post(format!("{}/auth/v1/token", self.url))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        Ok(self.send(req, &self.anon_key).await?.json().await?)
    }

    /// Registers an auth identity. `metadata` is stored on the identity for
    /// later profile provisioning, which happens backend-side.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<(), Error> {
        let req = self
            .http
            .post(format!("{}/auth/v1/signup", self.url))
            .json(&json!({
                "email": email,
                "password": password,
                "data": metadata,
            }));
        self.send(req, &self.anon_key).await.map(drop)
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), Error> {
        let req = self.http.post(format!("{}/auth/v1/logout", self.url));
        self.send(req, token).await.map(drop)
    }

    pub async fn get_profile_by_id(
        &self,
        token: &str,
        id: Id,
    ) -> Result<Option<Profile>, Error> {
        let req = self
            .http
            .get(format!("{}/rest/v1/profiles", self.url))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]);
        let rows: Vec<Profile> = self.send(req, token).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    pub async fn get_profiles(&self, token: &str) -> Result<Vec<Profile>, Error> {
        let req = self
            .http
            .get(format!("{}/rest/v1/profiles", self.url))
            .query(&[("select", "*")]);
        Ok(self.send(req, token).await?.json().await?)
    }

    pub async fn insert_profile(
        &self,
        token: &str,
        profile: &Profile,
    ) -> Result<(), Error> {
        let req = self
            .http
            .post(format!("{}/rest/v1/profiles", self.url))
            .json(profile);
        self.send(req, token).await.map(drop)
    }

    pub async fn delete_profile(&self, token: &str, id: Id) -> Result<(), Error> {
        let req = self
            .http
            .delete(format!("{}/rest/v1/profiles", self.url))
            .query(&[("id", format!("eq.{id}"))]);
        self.send(req, token).await.map(drop)
    }
}
