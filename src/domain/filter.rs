use crate::backend::{
    ticket::Ticket,
    user::{Profile, Role},
};

/// Restricts and orders a ticket list for a viewer: non-admins see only
/// their own tickets, the query narrows by substring, and the result is
/// sorted by descending priority (newest first on ties).
pub fn scope(
    mut tickets: Vec<Ticket>,
    viewer: &Profile,
    query: &str,
) -> Vec<Ticket> {
    if viewer.role != Role::Admin {
        tickets.retain(|t| t.creator_id == viewer.id);
    }

    let query = query.trim().to_lowercase();
    if !query.is_empty() {
        tickets.retain(|t| matches(t, &query));
    }

    sort_by_priority(&mut tickets);
    tickets
}

// `query` must already be trimmed and lowercased.
fn matches(ticket: &Ticket, query: &str) -> bool {
    ticket.code.to_lowercase().contains(query)
        || ticket.title.to_lowercase().contains(query)
        || ticket.area.to_string().to_lowercase().contains(query)
        || ticket.creator_name.to_lowercase().contains(query)
}

pub fn sort_by_priority(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.created_at.cmp(&a.created_at))
    });
}

/// The `n` most recently updated tickets, for the dashboard table.
pub fn most_recently_updated(
    mut tickets: Vec<Ticket>,
    n: usize,
) -> Vec<Ticket> {
    tickets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    tickets.truncate(n);
    tickets
}
