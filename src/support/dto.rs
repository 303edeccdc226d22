use serde::Deserialize;

use crate::support::repo::TicketStatus;

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub request_type: String,
    pub details: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    pub status: TicketStatus,
}
