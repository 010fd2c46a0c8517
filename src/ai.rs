use derive_more::From;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config;

/// Client for the generative-AI completion endpoint. Two single-shot
/// calls, no streaming.
pub struct Client {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

pub fn connect(config: config::Ai) -> Client {
    Client {
        http: reqwest::Client::new(),
        url: config.url,
        api_key: config.api_key,
        model: config.model,
    }
}

#[derive(Debug, From)]
pub enum Error {
    #[from]
    Http(reqwest::Error),
    UnexpectedStatus(StatusCode),
    MalformedResponse,
}

/// Structured ticket analysis: one-sentence summary, suggested category
/// and a priority label (Baja, Media, Alta, Crítica).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: String,
    pub suggested_category: String,
    pub priority: String,
}

impl Client {
    async fn generate(
        &self,
        body: serde_json::Value,
    ) -> Result<String, Error> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.url, self.model,
        );
        let resp = self
            .http
            .post(url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::UnexpectedStatus(resp.status()));
        }

        let resp: Response = resp.json().await?;
        text_of(resp).ok_or(Error::MalformedResponse)
    }

    /// Asks for a structured JSON analysis of a ticket description.
    pub async fn analyze(&self, description: &str) -> Result<Analysis, Error> {
        let prompt = format!(
            "Analiza este problema técnico/solicitud y genera un resumen \
             conciso de una frase y una sugerencia de categoría (Ayuda, \
             Consulta, Error, Solicitud, Mejora).\n\n\
             Descripción: \"{description}\"",
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "summary": { "type": "STRING" },
                        "suggestedCategory": { "type": "STRING" },
                        "priority": {
                            "type": "STRING",
                            "description": "Baja, Media, Alta, Crítica",
                        },
                    },
                    "required": ["summary", "suggestedCategory", "priority"],
                },
            },
        });

        parse_analysis(&self.generate(body).await?)
            .ok_or(Error::MalformedResponse)
    }

    /// Drafts a reply an admin can send for the given ticket and query.
    pub async fn suggest_response(
        &self,
        description: &str,
        query: &str,
    ) -> Result<String, Error> {
        let prompt = format!(
            "Eres un asistente técnico de Capital Inteligente.\n\
             Ticket Original: \"{description}\"\n\
             Consulta del usuario: \"{query}\"\n\
             Genera una respuesta profesional, empática y técnica para \
             ayudar al administrador a responder.",
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "systemInstruction": {
                "parts": [{
                    "text": "Se profesional y directo. Usa el tono \
                             corporativo de Capital Inteligente.",
                }],
            },
        });

        self.generate(body).await
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

fn text_of(resp: Response) -> Option<String> {
    resp.candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .next()
        .map(|p| p.text)
}

/// Models occasionally wrap the JSON in a markdown fence even when asked
/// for `application/json`.
fn parse_analysis(text: &str) -> Option<Analysis> {
    let trimmed = text.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);
    serde_json::from_str(json).ok()
}
