pub mod analytics;
pub mod ticket;
pub mod user;

pub use self::{ticket::Ticket, user::User};
