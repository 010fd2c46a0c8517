use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, FromRequestParts, Multipart, Path, Query, State},
    http::{request, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, RequestPartsExt as _, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use derive_more::From;
use futures::future::try_join_all;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{ai, api, backend, domain, upload};

/// Profile lookup during sign-in is raced against this; a backend that
/// cannot produce the row in time behaves like a missing profile.
const PROFILE_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Uploads may carry several original-size camera images.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-out", post(sign_out))
        .route("/me", get(get_me))
        .route("/ticket", get(list_tickets).post(add_ticket))
        .route("/ticket/:id", get(get_ticket).patch(edit_ticket))
        .route("/board", get(get_board))
        .route("/dashboard", get(get_dashboard))
        .route("/analytics", get(get_analytics))
        .route(
            "/upload",
            post(upload_files).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/user", get(list_users).post(add_user))
        .route("/user/:id", delete(delete_user))
        .route("/ai/analyze", post(analyze_description))
        .route("/ai/response", post(suggest_response))
        .with_state(Arc::new(state))
}

pub struct AppState {
    backend: backend::Client,
    ai: ai::Client,
    jwt_decoding_key: DecodingKey,
}

impl AppState {
    pub fn new(
        backend: backend::Client,
        ai: ai::Client,
        jwt_secret: &str,
    ) -> Self {
        Self {
            backend,
            ai,
            jwt_decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }
}

type SharedAppState = Arc<AppState>;

#[derive(Deserialize)]
struct SignInInput {
    email: String,
    password: String,
}

async fn sign_in(
    State(state): State<SharedAppState>,
    Json(SignInInput { email, password }): Json<SignInInput>,
) -> Result<Json<api::user::Session>, SignInError> {
    use SignInError as E;

    if !domain::access::email_domain_allowed(&email) {
        return Err(E::EmailDomainNotAllowed);
    }

    let session =
        state.backend.sign_in(&email, &password).await.map_err(|e| {
            if e.is_rejection() {
                E::WrongEmailOrPassword
            } else {
                E::Backend(e)
            }
        })?;

    let profile = match tokio::time::timeout(
        PROFILE_FETCH_TIMEOUT,
        state
            .backend
            .get_profile_by_id(&session.access_token, session.user.id),
    )
    .await
    {
        Err(_elapsed) => {
            force_sign_out(&state, &session.access_token).await;
            return Err(E::ProfileFetchTimedOut);
        }
        Ok(Err(e)) => return Err(E::Backend(e)),
        Ok(Ok(None)) => {
            // Authenticated but profileless sessions are unusable; drop
            // them instead of leaving the caller stuck.
            force_sign_out(&state, &session.access_token).await;
            return Err(E::ProfileMissing);
        }
        Ok(Ok(Some(profile))) => profile,
    };

    let views = domain::access::permitted_views(profile.role);
    Ok(Json(api::user::Session {
        token: session.access_token,
        user: profile.into(),
        views,
    }))
}

async fn force_sign_out(state: &AppState, token: &str) {
    if let Err(e) = state.backend.sign_out(token).await {
        tracing::error!("failed to revoke session: {e:?}");
    }
}

#[derive(Debug, From)]
pub enum SignInError {
    #[from]
    Backend(backend::Error),
    EmailDomainNotAllowed,
    ProfileFetchTimedOut,
    ProfileMissing,
    WrongEmailOrPassword,
}

impl IntoResponse for SignInError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("sign-in failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::EmailDomainNotAllowed
            | Self::ProfileMissing
            | Self::WrongEmailOrPassword => StatusCode::FORBIDDEN,
            Self::ProfileFetchTimedOut => StatusCode::GATEWAY_TIMEOUT,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct SignUpInput {
    email: String,
    password: String,
    name: String,
    role: api::user::Role,
    area: Option<api::ticket::Area>,
}

async fn sign_up(
    State(state): State<SharedAppState>,
    Json(input): Json<SignUpInput>,
) -> Result<StatusCode, SignUpError> {
    use SignUpError as E;

    if !domain::access::email_domain_allowed(&input.email) {
        return Err(E::EmailDomainNotAllowed);
    }
    let area = match (input.role, input.area) {
        (api::user::Role::Executive, None) => return Err(E::AreaRequired),
        (api::user::Role::Executive, Some(area)) => Some(area),
        // Admins get global access; a submitted area is dropped.
        (api::user::Role::Admin, _) => None,
    };

    let metadata = json!({
        "name": input.name,
        "role": input.role,
        "area": area,
    });
    state
        .backend
        .sign_up(&input.email, &input.password, metadata)
        .await
        .map_err(|e| {
            if e.is_rejection() {
                E::SignUpRejected
            } else {
                E::Backend(e)
            }
        })?;

    Ok(StatusCode::CREATED)
}

#[derive(Debug, From)]
pub enum SignUpError {
    #[from]
    Backend(backend::Error),
    AreaRequired,
    EmailDomainNotAllowed,
    SignUpRejected,
}

impl IntoResponse for SignUpError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("sign-up failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::AreaRequired | Self::SignUpRejected => {
                StatusCode::BAD_REQUEST
            }
            Self::EmailDomainNotAllowed => StatusCode::FORBIDDEN,
        }
        .into_response()
    }
}

async fn sign_out(
    State(state): State<SharedAppState>,
    auth: Auth,
) -> Result<StatusCode, SignOutError> {
    state.backend.sign_out(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, From)]
pub enum SignOutError {
    #[from]
    Backend(backend::Error),
}

impl IntoResponse for SignOutError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("sign-out failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Me {
    user: api::User,
    views: Vec<api::user::View>,
}

async fn get_me(
    State(state): State<SharedAppState>,
    auth: Auth,
) -> Result<Json<Me>, GetMeError> {
    use GetMeError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;

    let views = domain::access::permitted_views(profile.role);
    Ok(Json(Me {
        user: profile.into(),
        views,
    }))
}

#[derive(Debug, From)]
pub enum GetMeError {
    #[from]
    Backend(backend::Error),
    ProfileNotFound,
}

impl IntoResponse for GetMeError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("profile fetch failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::ProfileNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct ListTicketsInput {
    search: Option<String>,
}

async fn list_tickets(
    State(state): State<SharedAppState>,
    auth: Auth,
    Query(ListTicketsInput { search }): Query<ListTicketsInput>,
) -> Result<Json<api::ticket::List>, ListTicketsError> {
    use ListTicketsError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    let tickets = state.backend.get_tickets(&auth.token).await?;

    let tickets = domain::filter::scope(
        tickets,
        &profile,
        search.as_deref().unwrap_or(""),
    );
    let total_count = tickets.len();

    Ok(Json(api::ticket::List {
        tickets: tickets.into_iter().map(Into::into).collect(),
        total_count,
    }))
}

#[derive(Debug, From)]
pub enum ListTicketsError {
    #[from]
    Backend(backend::Error),
    ProfileNotFound,
}

impl IntoResponse for ListTicketsError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("failed to list tickets: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::ProfileNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct AddTicketInput {
    title: String,
    kind: api::ticket::Kind,
    area: api::ticket::Area,
    description: String,
    priority: u8,
    #[serde(default)]
    attachments: Vec<api::ticket::Attachment>,
}

async fn add_ticket(
    State(state): State<SharedAppState>,
    auth: Auth,
    Json(input): Json<AddTicketInput>,
) -> Result<Json<api::Ticket>, AddTicketError> {
    use AddTicketError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    if !domain::access::can_create_tickets(profile.role) {
        return Err(E::TicketCannotBeCreated);
    }
    if input.priority > 100 {
        return Err(E::InvalidPriority);
    }

    let now = OffsetDateTime::now_utc();
    let id = backend::ticket::Id::new();
    let ticket = backend::Ticket {
        id,
        code: id.display_code(),
        creator_id: profile.id,
        creator_name: profile.name.clone(),
        title: input.title,
        kind: input.kind,
        area: input.area,
        status: api::ticket::Status::Sent,
        description: input.description,
        priority: input.priority,
        attachments: input.attachments,
        messages: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    state.backend.insert_ticket(&auth.token, &ticket).await?;

    Ok(Json(ticket.into()))
}

#[derive(Debug, From)]
pub enum AddTicketError {
    #[from]
    Backend(backend::Error),
    InvalidPriority,
    ProfileNotFound,
    TicketCannotBeCreated,
}

impl IntoResponse for AddTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("ticket insert failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidPriority | Self::TicketCannotBeCreated => {
                StatusCode::BAD_REQUEST
            }
            Self::ProfileNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

async fn get_ticket(
    State(state): State<SharedAppState>,
    auth: Auth,
    Path(id): Path<api::ticket::Id>,
) -> Result<Json<api::Ticket>, GetTicketError> {
    use GetTicketError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    let ticket = state
        .backend
        .get_ticket_by_id(&auth.token, id)
        .await?
        .ok_or(E::TicketNotFound)?;

    // Other users' tickets stay invisible to non-admins.
    if profile.role != api::user::Role::Admin
        && ticket.creator_id != profile.id
    {
        return Err(E::TicketNotFound);
    }

    Ok(Json(ticket.into()))
}

#[derive(Debug, From)]
pub enum GetTicketError {
    #[from]
    Backend(backend::Error),
    ProfileNotFound,
    TicketNotFound,
}

impl IntoResponse for GetTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("ticket fetch failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::TicketNotFound => StatusCode::NOT_FOUND,
            Self::ProfileNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(content = "data", rename_all = "camelCase", tag = "op")]
enum EditTicketInput {
    /// Kanban drag-drop. Last writer wins.
    SetStatus {
        status: api::ticket::Status,
    },
    AddMessage {
        text: String,
        #[serde(default)]
        attachments: Vec<api::ticket::Attachment>,
    },
}

async fn edit_ticket(
    State(state): State<SharedAppState>,
    auth: Auth,
    Path(id): Path<api::ticket::Id>,
    Json(op): Json<EditTicketInput>,
) -> Result<Json<api::Ticket>, EditTicketError> {
    use EditTicketError as E;
    use EditTicketInput as Op;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    let mut ticket = state
        .backend
        .get_ticket_by_id(&auth.token, id)
        .await?
        .ok_or(E::TicketNotFound)?;

    if profile.role != api::user::Role::Admin
        && ticket.creator_id != profile.id
    {
        return Err(E::TicketNotFound);
    }

    ticket.updated_at = OffsetDateTime::now_utc();

    let changes = match op {
        Op::SetStatus { status } => {
            if !domain::access::can_move_tickets(profile.role) {
                return Err(E::StatusCannotBeChanged);
            }

            ticket.status = status;
            backend::ticket::Changes {
                status: Some(status),
                messages: None,
                updated_at: ticket.updated_at,
            }
        }
        Op::AddMessage { text, attachments } => {
            if text.trim().is_empty() && attachments.is_empty() {
                return Err(E::EmptyMessage);
            }
            if !attachments.is_empty()
                && !domain::access::can_attach_to_messages(profile.role)
            {
                return Err(E::AttachmentsNotAllowed);
            }

            ticket.messages.push(backend::ticket::Message {
                id: Uuid::new_v4().to_string(),
                author: profile.name.clone(),
                role: profile.role,
                text,
                attachments,
                timestamp: ticket.updated_at,
            });
            backend::ticket::Changes {
                status: None,
                messages: Some(&ticket.messages),
                updated_at: ticket.updated_at,
            }
        }
    };

    state
        .backend
        .update_ticket(&auth.token, ticket.id, &changes)
        .await?;

    Ok(Json(ticket.into()))
}

#[derive(Debug, From)]
pub enum EditTicketError {
    #[from]
    Backend(backend::Error),
    AttachmentsNotAllowed,
    EmptyMessage,
    ProfileNotFound,
    StatusCannotBeChanged,
    TicketNotFound,
}

impl IntoResponse for EditTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("ticket update failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::AttachmentsNotAllowed
            | Self::EmptyMessage
            | Self::StatusCannotBeChanged => StatusCode::BAD_REQUEST,
            Self::TicketNotFound => StatusCode::NOT_FOUND,
            Self::ProfileNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

async fn get_board(
    State(state): State<SharedAppState>,
    auth: Auth,
) -> Result<Json<api::ticket::Board>, ListTicketsError> {
    use ListTicketsError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    let tickets = state.backend.get_tickets(&auth.token).await?;
    let tickets = domain::filter::scope(tickets, &profile, "");

    let columns = domain::board::columns(tickets)
        .into_iter()
        .map(|(status, tickets)| api::ticket::Column {
            status,
            tickets: tickets.into_iter().map(Into::into).collect(),
        })
        .collect();

    Ok(Json(api::ticket::Board {
        columns,
        can_move: domain::access::can_move_tickets(profile.role),
    }))
}

async fn get_dashboard(
    State(state): State<SharedAppState>,
    auth: Auth,
) -> Result<Json<api::ticket::Dashboard>, ListTicketsError> {
    use ListTicketsError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    let tickets = state.backend.get_tickets(&auth.token).await?;
    let tickets = domain::filter::scope(tickets, &profile, "");

    let total = tickets.len();
    let resolved = tickets
        .iter()
        .filter(|t| t.status == api::ticket::Status::Resolved)
        .count();
    let critical = tickets
        .iter()
        .filter(|t| t.kind == api::ticket::Kind::Error)
        .count();

    let recent = domain::filter::most_recently_updated(tickets, 5);

    Ok(Json(api::ticket::Dashboard {
        total,
        pending: total - resolved,
        resolved,
        critical,
        recent: recent.into_iter().map(Into::into).collect(),
    }))
}

async fn get_analytics(
    State(state): State<SharedAppState>,
    auth: Auth,
    Query(period): Query<domain::analytics::Period>,
) -> Result<Json<api::analytics::Report>, AnalyticsError> {
    use AnalyticsError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    if profile.role != api::user::Role::Admin {
        return Err(E::NotPermitted);
    }

    let tickets = state.backend.get_tickets(&auth.token).await?;
    // Year options cover the whole data set, not the filtered slice.
    let years = domain::analytics::years(&tickets);
    let tickets = period.filter(tickets);

    let errors_by_area = domain::analytics::errors_by_area(&tickets)
        .into_iter()
        .map(|(area, count)| api::analytics::AreaErrors { area, count })
        .collect();
    let top_kind_by_area = domain::analytics::top_kind_by_area(&tickets)
        .into_iter()
        .map(|(area, kind, count)| api::analytics::AreaTopKind {
            area,
            kind,
            count,
        })
        .collect();

    Ok(Json(api::analytics::Report {
        errors_by_area,
        top_kind_by_area,
        resolution_rate: domain::analytics::resolution_rate(&tickets),
        total_tickets: tickets.len(),
        years,
    }))
}

#[derive(Debug, From)]
pub enum AnalyticsError {
    #[from]
    Backend(backend::Error),
    NotPermitted,
    ProfileNotFound,
}

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("analytics rollup failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotPermitted => StatusCode::FORBIDDEN,
            Self::ProfileNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

async fn upload_files(
    State(state): State<SharedAppState>,
    auth: Auth,
    mut multipart: Multipart,
) -> Result<Json<Vec<api::ticket::Attachment>>, UploadError> {
    use UploadError as E;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| E::MalformedUpload)?
    {
        let name = field
            .file_name()
            .or(field.name())
            .unwrap_or("archivo")
            .to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|_| E::MalformedUpload)?;
        files.push((name, mime_type, bytes.to_vec()));
    }
    if files.is_empty() {
        return Err(E::MalformedUpload);
    }

    // The batch is atomic from the caller's view: any failed upload fails
    // the whole request.
    let state = &state;
    let token = &auth.token;
    let uploads = files.into_iter().map(|(name, mime_type, bytes)| {
        async move {
            let prepared = upload::prepare(bytes, &mime_type);
            let path = upload::object_path(&name);
            let size = upload::human_size(prepared.bytes.len());
            let mime_type = prepared.mime_type;

            state
                .backend
                .upload_object(token, &path, &mime_type, prepared.bytes)
                .await?;

            Ok::<_, backend::Error>(api::ticket::Attachment {
                id: Uuid::new_v4().to_string(),
                name,
                mime_type,
                url: state.backend.public_object_url(&path),
                size,
            })
        }
    });

    let attachments = try_join_all(uploads).await?;
    Ok(Json(attachments))
}

#[derive(Debug, From)]
pub enum UploadError {
    #[from]
    Backend(backend::Error),
    MalformedUpload,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("attachment upload failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::MalformedUpload => StatusCode::BAD_REQUEST,
        }
        .into_response()
    }
}

async fn list_users(
    State(state): State<SharedAppState>,
    auth: Auth,
) -> Result<Json<Vec<api::User>>, UserAccessError> {
    use UserAccessError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    if profile.role != api::user::Role::Admin {
        return Err(E::NotPermitted);
    }

    let profiles = state.backend.get_profiles(&auth.token).await?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

#[derive(Deserialize)]
struct AddUserInput {
    name: String,
    email: String,
    role: api::user::Role,
    area: Option<api::ticket::Area>,
}

async fn add_user(
    State(state): State<SharedAppState>,
    auth: Auth,
    Json(input): Json<AddUserInput>,
) -> Result<Json<api::User>, UserAccessError> {
    use UserAccessError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    if profile.role != api::user::Role::Admin {
        return Err(E::NotPermitted);
    }

    if !domain::access::email_domain_allowed(&input.email) {
        return Err(E::EmailDomainNotAllowed);
    }
    let area = match (input.role, input.area) {
        (api::user::Role::Executive, None) => return Err(E::AreaRequired),
        (api::user::Role::Executive, Some(area)) => Some(area),
        (api::user::Role::Admin, _) => None,
    };

    let id = api::user::Id::new();
    let new_profile = backend::Profile {
        id,
        name: input.name,
        email: input.email,
        role: input.role,
        area,
        avatar_url: format!("https://picsum.photos/seed/{id}/100/100"),
    };
    state
        .backend
        .insert_profile(&auth.token, &new_profile)
        .await?;

    Ok(Json(new_profile.into()))
}

async fn delete_user(
    State(state): State<SharedAppState>,
    auth: Auth,
    Path(id): Path<api::user::Id>,
) -> Result<StatusCode, UserAccessError> {
    use UserAccessError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    if profile.role != api::user::Role::Admin {
        return Err(E::NotPermitted);
    }

    state.backend.delete_profile(&auth.token, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, From)]
pub enum UserAccessError {
    #[from]
    Backend(backend::Error),
    AreaRequired,
    EmailDomainNotAllowed,
    NotPermitted,
    ProfileNotFound,
}

impl IntoResponse for UserAccessError {
    fn into_response(self) -> Response {
        match self {
            Self::Backend(e) => {
                tracing::error!("user access operation failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::AreaRequired => StatusCode::BAD_REQUEST,
            Self::EmailDomainNotAllowed | Self::NotPermitted => {
                StatusCode::FORBIDDEN
            }
            Self::ProfileNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct AnalyzeInput {
    description: String,
}

async fn analyze_description(
    State(state): State<SharedAppState>,
    _: Auth,
    Json(AnalyzeInput { description }): Json<AnalyzeInput>,
) -> Result<Json<ai::Analysis>, AiError> {
    let analysis = state.ai.analyze(&description).await?;
    Ok(Json(analysis))
}

#[derive(Deserialize)]
struct SuggestResponseInput {
    description: String,
    query: String,
}

#[derive(Serialize)]
struct SuggestResponseOutput {
    response: String,
}

async fn suggest_response(
    State(state): State<SharedAppState>,
    auth: Auth,
    Json(input): Json<SuggestResponseInput>,
) -> Result<Json<SuggestResponseOutput>, AiError> {
    use AiError as E;

    let profile = state
        .backend
        .get_profile_by_id(&auth.token, auth.user_id)
        .await?
        .ok_or(E::ProfileNotFound)?;
    if profile.role != api::user::Role::Admin {
        return Err(E::NotPermitted);
    }

    let response = state
        .ai
        .suggest_response(&input.description, &input.query)
        .await?;
    Ok(Json(SuggestResponseOutput { response }))
}

#[derive(Debug, From)]
pub enum AiError {
    #[from]
    Ai(ai::Error),
    #[from]
    Backend(backend::Error),
    NotPermitted,
    ProfileNotFound,
}

impl IntoResponse for AiError {
    fn into_response(self) -> Response {
        match self {
            Self::Ai(e) => {
                tracing::error!("ai completion failed: {e:?}");
                StatusCode::BAD_GATEWAY
            }
            Self::Backend(e) => {
                tracing::error!("ai handler failed: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotPermitted => StatusCode::FORBIDDEN,
            Self::ProfileNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

/// Caller identity, verified against the backend-issued HS256 token.
pub struct Auth {
    pub user_id: api::user::Id,
    pub token: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthClaims {
    pub sub: api::user::Id,
    pub exp: i64,
}

#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
        }
        .into_response()
    }
}

#[async_trait]
impl FromRequestParts<SharedAppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;
        let token_data = decode::<AuthClaims>(
            bearer.token(),
            &state.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(Auth {
            user_id: token_data.claims.sub,
            token: bearer.token().to_string(),
        })
    }
}
