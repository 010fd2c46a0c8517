pub mod storage;
pub mod ticket;
pub mod user;

use derive_more::{Display, From};
use reqwest::{header::HeaderValue, RequestBuilder, Response, StatusCode};

use crate::config;

pub use self::{ticket::Ticket, user::Profile};

/// Client for the hosted backend providing auth, the `profiles`/`tickets`
/// tables and the attachments bucket.
///
/// All row access happens with the caller's own access token, so the
/// backend's row-level rules stay in effect.
pub struct Client {
    http: reqwest::Client,
    url: String,
    anon_key: String,
    bucket: String,
}

pub fn connect(config: config::Backend) -> Result<Client, Error> {
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    Ok(Client {
        http,
        url: config.url,
        anon_key: config.anon_key,
        bucket: config.bucket,
    })
}

#[derive(Debug, Display, From)]
pub enum Error {
    #[from]
    Http(reqwest::Error),
    #[display("unexpected status code: {_0}")]
    UnexpectedStatus(StatusCode),
}

impl std::error::Error for Error {}

impl Error {
    /// Whether the backend rejected the request itself, as opposed to
    /// failing to serve it.
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Http(_) => false,
            Self::UnexpectedStatus(status) => status.is_client_error(),
        }
    }
}

impl Client {
    fn request(&self, req: RequestBuilder, token: &str) -> RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(token)
            .header("Accept", HeaderValue::from_static("application/json"))
    }

    async fn send(
        &self,
        req: RequestBuilder,
        token: &str,
    ) -> Result<Response, Error> {
        let resp = self.request(req, token).send().await?;
        if !resp.status().is_success() {
            return Err(Error::UnexpectedStatus(resp.status()));
        }
        Ok(resp)
    }
}
