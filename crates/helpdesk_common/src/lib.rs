//! Shared types and pipeline for the offline helpdesk assistant.
//!
//! Every question becomes a ticket: local context is collected, the query is
//! triaged by keyword, a local model is asked for troubleshooting steps and
//! the whole exchange is written to the ticket directory.

pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod invoker;
pub mod pipeline;
pub mod prompt;
pub mod ticket;

pub use classifier::{classify_department, classify_severity, Department, Severity};
pub use config::HelpdeskConfig;
pub use context::SystemContext;
pub use error::HelpdeskError;
pub use invoker::{query_model, InvocationOutcome, ModelRunner};
pub use pipeline::{Interaction, Pipeline};
pub use prompt::build_prompt;
pub use ticket::{load_ticket, save, TicketRecord};

/// Model loaded when the caller does not name one
pub const DEFAULT_MODEL: &str = "phi";

/// Ticket directory relative to the executable's own directory
pub const TICKET_SUBDIR: [&str; 2] = ["Tickets", "Unprocessed"];

/// Placeholder for host facts that could not be determined
pub const UNKNOWN: &str = "unknown";
