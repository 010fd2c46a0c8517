//! Spawns the application against an in-process stub of the hosted
//! backend, plus a reqwest client for driving the API.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use capitalnet_helpdesk::{ai, api, backend, config, server};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tokio::net::TcpListener;
use uuid::Uuid;

const JWT_SECRET: &str = "test-secret";

pub const ALICE: &str = "alice@gmail.com";
pub const BOB: &str = "bob@capitalinteligente.cl";
pub const PASSWORD: &str = "password";

pub fn alice_id() -> api::user::Id {
    api::user::Id::from(1)
}

/// Boots the stub backend and the application on ephemeral ports and
/// returns a client pointed at the application.
pub async fn spawn_app() -> Client {
    let stub_addr = spawn_stub().await;

    let backend = backend::connect(config::Backend {
        url: format!("http://{stub_addr}"),
        anon_key: "anon-key".to_string(),
        bucket: "ticket-attachments".to_string(),
        request_timeout: Duration::from_secs(5),
    })
    .expect("failed to build a backend client");
    let ai = ai::connect(config::Ai {
        url: format!("http://{stub_addr}"),
        api_key: "api-key".to_string(),
        model: "test-model".to_string(),
    });

    let app = server::router(server::AppState::new(backend, ai, JWT_SECRET));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind the app");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("app server failed");
    });

    Client::new(format!("http://{addr}"))
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Me {
    pub user: api::User,
    pub views: Vec<api::user::View>,
}

pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    pub auth_token: Option<String>,
}

impl Client {
    pub fn new(base_url: String) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url,
            auth_token: None,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .inner
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req
    }

    pub async fn sign_in(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<api::user::Session, StatusCode> {
        let session: api::user::Session = expect_json(
            self.request(Method::POST, "/auth/sign-in")
                .json(&json!({ "email": email, "password": password })),
        )
        .await?;
        self.auth_token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn auth(mut self, email: &str, password: &str) -> Self {
        self.sign_in(email, password)
            .await
            .expect("failed to sign in");
        self
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: &str,
        area: Option<&str>,
    ) -> Result<(), StatusCode> {
        expect_ok(self.request(Method::POST, "/auth/sign-up").json(&json!({
            "email": email,
            "password": password,
            "name": name,
            "role": role,
            "area": area,
        })))
        .await
    }

    pub async fn sign_out(&self) -> Result<(), StatusCode> {
        expect_ok(self.request(Method::POST, "/auth/sign-out")).await
    }

    pub async fn me(&self) -> Result<Me, StatusCode> {
        expect_json(self.request(Method::GET, "/me")).await
    }

    pub async fn get_tickets(
        &self,
        search: &str,
    ) -> Result<api::ticket::List, StatusCode> {
        expect_json(
            self.request(Method::GET, "/ticket")
                .query(&[("search", search)]),
        )
        .await
    }

    pub async fn add_ticket(
        &self,
        title: &str,
        kind: &str,
        area: &str,
        description: &str,
        priority: u8,
    ) -> Result<api::Ticket, StatusCode> {
        expect_json(self.request(Method::POST, "/ticket").json(&json!({
            "title": title,
            "kind": kind,
            "area": area,
            "description": description,
            "priority": priority,
        })))
        .await
    }

    pub async fn add_ticket_with_attachments(
        &self,
        title: &str,
        kind: &str,
        area: &str,
        description: &str,
        priority: u8,
        attachments: Vec<api::ticket::Attachment>,
    ) -> Result<api::Ticket, StatusCode> {
        expect_json(self.request(Method::POST, "/ticket").json(&json!({
            "title": title,
            "kind": kind,
            "area": area,
            "description": description,
            "priority": priority,
            "attachments": attachments,
        })))
        .await
    }

    pub async fn get_ticket(
        &self,
        id: api::ticket::Id,
    ) -> Result<api::Ticket, StatusCode> {
        expect_json(self.request(Method::GET, &format!("/ticket/{id}")))
            .await
    }

    pub async fn set_status(
        &self,
        id: api::ticket::Id,
        status: &str,
    ) -> Result<api::Ticket, StatusCode> {
        expect_json(
            self.request(Method::PATCH, &format!("/ticket/{id}"))
                .json(&json!({ "op": "setStatus", "data": { "status": status } })),
        )
        .await
    }

    pub async fn add_message(
        &self,
        id: api::ticket::Id,
        text: &str,
        attachments: Vec<api::ticket::Attachment>,
    ) -> Result<api::Ticket, StatusCode> {
        expect_json(
            self.request(Method::PATCH, &format!("/ticket/{id}")).json(
                &json!({
                    "op": "addMessage",
                    "data": { "text": text, "attachments": attachments },
                }),
            ),
        )
        .await
    }

    pub async fn board(&self) -> Result<api::ticket::Board, StatusCode> {
        expect_json(self.request(Method::GET, "/board")).await
    }

    pub async fn dashboard(
        &self,
    ) -> Result<api::ticket::Dashboard, StatusCode> {
        expect_json(self.request(Method::GET, "/dashboard")).await
    }

    pub async fn analytics(
        &self,
        query: &str,
    ) -> Result<api::analytics::Report, StatusCode> {
        expect_json(
            self.request(Method::GET, &format!("/analytics?{query}")),
        )
        .await
    }

    pub async fn upload(
        &self,
        files: Vec<(&str, &str, Vec<u8>)>,
    ) -> Result<Vec<api::ticket::Attachment>, StatusCode> {
        let mut form = reqwest::multipart::Form::new();
        for (name, mime_type, bytes) in files {
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(name.to_string())
                .mime_str(mime_type)
                .expect("invalid mime type");
            form = form.part("files", part);
        }
        expect_json(self.request(Method::POST, "/upload").multipart(form))
            .await
    }

    pub async fn users(&self) -> Result<Vec<api::User>, StatusCode> {
        expect_json(self.request(Method::GET, "/user")).await
    }

    pub async fn add_user(
        &self,
        name: &str,
        email: &str,
        role: &str,
        area: Option<&str>,
    ) -> Result<api::User, StatusCode> {
        expect_json(self.request(Method::POST, "/user").json(&json!({
            "name": name,
            "email": email,
            "role": role,
            "area": area,
        })))
        .await
    }

    pub async fn delete_user(
        &self,
        id: api::user::Id,
    ) -> Result<(), StatusCode> {
        expect_ok(self.request(Method::DELETE, &format!("/user/{id}"))).await
    }

    pub async fn analyze(
        &self,
        description: &str,
    ) -> Result<Value, StatusCode> {
        expect_json(
            self.request(Method::POST, "/ai/analyze")
                .json(&json!({ "description": description })),
        )
        .await
    }

    pub async fn suggest_response(
        &self,
        description: &str,
        query: &str,
    ) -> Result<Value, StatusCode> {
        expect_json(
            self.request(Method::POST, "/ai/response")
                .json(&json!({ "description": description, "query": query })),
        )
        .await
    }
}

async fn expect_json<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
) -> Result<T, StatusCode> {
    Ok(req
        .send()
        .await
        .expect("failed to send a request")
        .error_for_status()
        .map_err(|e| e.status().expect("status error"))?
        .json::<T>()
        .await
        .expect("failed to get a response"))
}

async fn expect_ok(req: reqwest::RequestBuilder) -> Result<(), StatusCode> {
    req.send()
        .await
        .expect("failed to send a request")
        .error_for_status()
        .map_err(|e| e.status().expect("status error"))?;
    Ok(())
}

// Stub backend: auth endpoints minting real HS256 tokens, `profiles` and
// `tickets` tables held in memory, a write-only bucket and a canned
// generative-AI endpoint.

struct StubState {
    credentials: HashMap<String, (String, Uuid)>,
    profiles: Vec<Value>,
    tickets: Vec<Value>,
    attachments: Vec<Value>,
}

impl StubState {
    fn seeded() -> Self {
        let alice = Uuid::from_u128(1);
        let bob = Uuid::from_u128(2);

        let mut credentials = HashMap::new();
        credentials
            .insert(ALICE.to_string(), (PASSWORD.to_string(), alice));
        credentials.insert(BOB.to_string(), (PASSWORD.to_string(), bob));

        let profiles = vec![
            json!({
                "id": alice,
                "name": "Alice",
                "email": ALICE,
                "role": "Ejecutivo",
                "area": "Comercial",
                "avatar_url": "https://picsum.photos/seed/alice/100/100",
            }),
            json!({
                "id": bob,
                "name": "Bob",
                "email": BOB,
                "role": "Administrador",
                "area": null,
                "avatar_url": "https://picsum.photos/seed/bob/100/100",
            }),
        ];

        Self {
            credentials,
            profiles,
            tickets: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

type Stub = Arc<Mutex<StubState>>;

async fn spawn_stub() -> SocketAddr {
    let stub: Stub = Arc::new(Mutex::new(StubState::seeded()));

    let app = Router::new()
        .route("/auth/v1/token", post(stub_token))
        .route("/auth/v1/signup", post(stub_signup))
        .route("/auth/v1/logout", post(stub_logout))
        .route(
            "/rest/v1/profiles",
            get(stub_get_profiles)
                .post(stub_add_profile)
                .delete(stub_delete_profiles),
        )
        .route(
            "/rest/v1/tickets",
            get(stub_get_tickets)
                .post(stub_add_ticket)
                .patch(stub_patch_tickets),
        )
        .route("/rest/v1/attachments", post(stub_add_attachments))
        .route("/storage/v1/object/:bucket/*path", post(stub_put_object))
        .route("/v1beta/models/*model", post(stub_generate))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind the stub");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server failed");
    });
    addr
}

fn mint_token(user_id: Uuid) -> String {
    let claims = server::AuthClaims {
        sub: api::user::Id::from(user_id.as_u128()),
        exp: (OffsetDateTime::now_utc().unix_timestamp()) + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to mint a token")
}

async fn stub_token(
    State(stub): State<Stub>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let stub = stub.lock().expect("stub state poisoned");
    match stub.credentials.get(email) {
        Some((stored, id)) if stored == password => Ok(Json(json!({
            "access_token": mint_token(*id),
            "user": { "id": id },
        }))),
        _ => Err(StatusCode::BAD_REQUEST),
    }
}

async fn stub_signup(
    State(stub): State<Stub>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let metadata = body["data"].clone();

    let mut stub = stub.lock().expect("stub state poisoned");
    if stub.credentials.contains_key(&email) {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let id = Uuid::new_v4();
    stub.credentials.insert(email.clone(), (password, id));
    stub.profiles.push(json!({
        "id": id,
        "name": metadata["name"],
        "email": email,
        "role": metadata["role"],
        "area": metadata["area"],
        "avatar_url": format!("https://picsum.photos/seed/{id}/100/100"),
    }));

    Ok(Json(json!({ "id": id })))
}

async fn stub_logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn id_filter(filters: &HashMap<String, String>) -> Option<String> {
    filters
        .get("id")
        .and_then(|f| f.strip_prefix("eq."))
        .map(str::to_string)
}

fn matches_id(row: &Value, id: &Option<String>) -> bool {
    match id {
        Some(id) => row["id"].as_str() == Some(id),
        None => true,
    }
}

async fn stub_get_profiles(
    State(stub): State<Stub>,
    Query(filters): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let id = id_filter(&filters);
    let stub = stub.lock().expect("stub state poisoned");
    Json(
        stub.profiles
            .iter()
            .filter(|row| matches_id(row, &id))
            .cloned()
            .collect(),
    )
}

async fn stub_add_profile(
    State(stub): State<Stub>,
    Json(row): Json<Value>,
) -> StatusCode {
    stub.lock().expect("stub state poisoned").profiles.push(row);
    StatusCode::CREATED
}

async fn stub_delete_profiles(
    State(stub): State<Stub>,
    Query(filters): Query<HashMap<String, String>>,
) -> StatusCode {
    let id = id_filter(&filters);
    stub.lock()
        .expect("stub state poisoned")
        .profiles
        .retain(|row| !matches_id(row, &id));
    StatusCode::NO_CONTENT
}

async fn stub_get_tickets(
    State(stub): State<Stub>,
    Query(filters): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let id = id_filter(&filters);
    let stub = stub.lock().expect("stub state poisoned");
    Json(
        stub.tickets
            .iter()
            .filter(|row| matches_id(row, &id))
            .cloned()
            .map(|mut row| {
                let attached: Vec<Value> = stub
                    .attachments
                    .iter()
                    .filter(|a| a["ticket_id"] == row["id"])
                    .cloned()
                    .collect();
                row["attachments"] = Value::Array(attached);
                row
            })
            .collect(),
    )
}

async fn stub_add_ticket(
    State(stub): State<Stub>,
    Json(row): Json<Value>,
) -> StatusCode {
    stub.lock().expect("stub state poisoned").tickets.push(row);
    StatusCode::CREATED
}

async fn stub_patch_tickets(
    State(stub): State<Stub>,
    Query(filters): Query<HashMap<String, String>>,
    Json(changes): Json<Value>,
) -> StatusCode {
    let id = id_filter(&filters);
    let mut stub = stub.lock().expect("stub state poisoned");
    for row in stub.tickets.iter_mut() {
        if !matches_id(row, &id) {
            continue;
        }
        if let (Some(row), Some(changes)) =
            (row.as_object_mut(), changes.as_object())
        {
            for (key, value) in changes {
                row.insert(key.clone(), value.clone());
            }
        }
    }
    StatusCode::NO_CONTENT
}

async fn stub_add_attachments(
    State(stub): State<Stub>,
    Json(rows): Json<Vec<Value>>,
) -> StatusCode {
    stub.lock()
        .expect("stub state poisoned")
        .attachments
        .extend(rows);
    StatusCode::CREATED
}

async fn stub_put_object(
    Path((_bucket, path)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    if body.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!({ "Key": path })))
}

/// Returns a structured analysis when the request asks for JSON output
/// and a plain draft reply otherwise.
async fn stub_generate(Json(body): Json<Value>) -> Json<Value> {
    let text = if body.get("generationConfig").is_some() {
        r#"{"summary": "Resumen generado.",
            "suggestedCategory": "Error",
            "priority": "Alta"}"#
            .to_string()
    } else {
        "Estimado usuario, estamos revisando su caso.".to_string()
    };
    Json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }],
    }))
}
