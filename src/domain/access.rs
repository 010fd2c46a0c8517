use crate::api::user::View;
use crate::backend::user::Role;

/// Corporate sign-up/sign-in is restricted to these email domains.
pub const ALLOWED_EMAIL_DOMAINS: [&str; 2] =
    ["gmail.com", "capitalinteligente.cl"];

pub fn email_domain_allowed(email: &str) -> bool {
    email
        .rsplit_once('@')
        .map_or(false, |(_, domain)| {
            ALLOWED_EMAIL_DOMAINS.contains(&domain)
        })
}

/// Screens a role may open. Views are resolved here, never by the caller.
pub fn permitted_views(role: Role) -> Vec<View> {
    match role {
        Role::Executive => {
            vec![View::Dashboard, View::Kanban, View::Create]
        }
        Role::Admin => vec![
            View::Dashboard,
            View::Kanban,
            View::Analytics,
            View::UserAccess,
        ],
    }
}

/// Only admins reassign statuses on the board.
pub fn can_move_tickets(role: Role) -> bool {
    role == Role::Admin
}

/// Tickets are filed by executives; admins triage them.
pub fn can_create_tickets(role: Role) -> bool {
    role == Role::Executive
}

/// Message attachments are an admin capability.
pub fn can_attach_to_messages(role: Role) -> bool {
    role == Role::Admin
}
