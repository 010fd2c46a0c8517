use std::{net, time};

use serde::Deserialize;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub backend: Backend,
    pub http: Http,
    pub auth: Auth,
    pub ai: Ai,
}

/// Hosted backend providing auth, the `profiles`/`tickets` tables and the
/// attachments bucket.
#[derive(Clone, Deserialize)]
pub struct Backend {
    pub url: String,
    pub anon_key: String,
    pub bucket: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: time::Duration,
}

#[derive(Clone, Deserialize)]
pub struct Http {
    pub server: Server,
    pub cors: Cors,
}

#[derive(Clone, Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Clone, Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Deserialize)]
pub struct Auth {
    /// HS256 secret shared with the backend project, used to verify the
    /// access tokens it issues.
    pub jwt_secret: String,
}

#[derive(Clone, Deserialize)]
pub struct Ai {
    pub url: String,
    pub api_key: String,
    pub model: String,
}
