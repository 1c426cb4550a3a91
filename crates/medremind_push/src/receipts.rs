//! Interpretation of gateway tickets
//!
//! Tickets are matched to tokens by position. A `DeviceNotRegistered` error
//! marks the token for deactivation; any other error is reported only.

use crate::models::{DeliveryOutcome, DeliveryStatus, PushTicket, TicketStatus, DEVICE_NOT_REGISTERED};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub outcomes: Vec<DeliveryOutcome>,
    /// Tokens the gateway reported as permanently unregistered
    pub to_deactivate: Vec<String>,
}

impl ReceiptSummary {
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }

    /// Appends the results of another batch
    pub fn merge(&mut self, other: ReceiptSummary) {
        self.outcomes.extend(other.outcomes);
        self.to_deactivate.extend(other.to_deactivate);
    }
}

/// Classifies each ticket against the token it was sent to
///
/// A ticket list of a different length than `tokens` is truncated to the
/// shorter of the two; unmatched tokens get no outcome.
pub fn process_tickets(tokens: &[String], tickets: &[PushTicket]) -> ReceiptSummary {
    if tokens.len() != tickets.len() {
        warn!(
            tokens = tokens.len(),
            tickets = tickets.len(),
            "Push gateway returned a ticket count that does not match the messages sent"
        );
    }

    let mut summary = ReceiptSummary::default();
    for (token, ticket) in tokens.iter().zip(tickets) {
        let status = classify(ticket);
        if let DeliveryStatus::PermanentFailure { .. } = status {
            debug!(token = %token, "Token is no longer registered");
            summary.to_deactivate.push(token.clone());
        }
        summary.outcomes.push(DeliveryOutcome {
            token: token.clone(),
            status,
        });
    }
    summary
}

fn classify(ticket: &PushTicket) -> DeliveryStatus {
    if ticket.status == TicketStatus::Ok {
        return DeliveryStatus::Delivered;
    }

    match ticket.error_code() {
        Some(DEVICE_NOT_REGISTERED) => DeliveryStatus::PermanentFailure {
            error: DEVICE_NOT_REGISTERED.to_string(),
        },
        Some(code) => DeliveryStatus::Failed {
            error: Some(code.to_string()),
        },
        None => DeliveryStatus::Failed {
            error: ticket.message.clone(),
        },
    }
}
