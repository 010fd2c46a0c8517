use crate::backend::ticket::{Status, Ticket};

/// Groups tickets into the five fixed kanban columns, in workflow order.
/// Cards match on exact status only.
pub fn columns(tickets: Vec<Ticket>) -> Vec<(Status, Vec<Ticket>)> {
    let mut columns: Vec<(Status, Vec<Ticket>)> =
        Status::ALL.into_iter().map(|s| (s, Vec::new())).collect();

    for ticket in tickets {
        if let Some((_, cards)) =
            columns.iter_mut().find(|(s, _)| *s == ticket.status)
        {
            cards.push(ticket);
        }
    }

    columns
}
