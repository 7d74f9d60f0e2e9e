//! One question in, one answer and one ticket out.
//!
//! Stages run in a fixed order: context, triage, prompt, model, ticket.
//! Model failures are already folded into the answer text by the invoker,
//! so the only error this returns is a ticket that could not be written.

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::classifier::{classify_department, classify_severity, Department, Severity};
use crate::config::HelpdeskConfig;
use crate::context::{self, HostIdentity, HostNetwork, LocalHost, SystemContext};
use crate::error::HelpdeskError;
use crate::invoker::ModelRunner;
use crate::prompt::build_prompt;
use crate::ticket::{self, TicketRecord};

/// Result of handling one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub response: String,
    pub ticket_path: PathBuf,
    pub severity: Severity,
    pub department: Department,
}

/// Wires the stages together
pub struct Pipeline {
    runner: ModelRunner,
    ticket_dir: PathBuf,
    identity: Box<dyn HostIdentity + Send + Sync>,
    network: Box<dyn HostNetwork + Send + Sync>,
}

impl Pipeline {
    pub fn new(runner: ModelRunner, ticket_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            ticket_dir: ticket_dir.into(),
            identity: Box::new(LocalHost),
            network: Box::new(LocalHost),
        }
    }

    pub fn from_config(config: &HelpdeskConfig) -> Result<Self, HelpdeskError> {
        Ok(Self::new(
            ModelRunner::from_config(&config.runner),
            config.ticket_dir()?,
        ))
    }

    /// Replace the host accessors used for context collection
    pub fn with_host(
        mut self,
        identity: impl HostIdentity + Send + Sync + 'static,
        network: impl HostNetwork + Send + Sync + 'static,
    ) -> Self {
        self.identity = Box::new(identity);
        self.network = Box::new(network);
        self
    }

    pub fn ticket_dir(&self) -> &Path {
        &self.ticket_dir
    }

    fn collect_context(&self) -> SystemContext {
        context::collect_with(self.identity.as_ref(), self.network.as_ref(), Local::now())
    }

    /// Handle one question end to end
    pub async fn handle(&self, query: &str, model: &str) -> Result<Interaction, HelpdeskError> {
        let context = self.collect_context();
        let severity = classify_severity(query);
        let department = classify_department(query);

        let prompt = build_prompt(&context, query);
        let response = self.runner.query_model(&prompt, model).await;

        let record = TicketRecord::new(context, query, response.clone(), severity, department);
        let ticket_path = ticket::save(&record, &self.ticket_dir)?;

        info!(
            "handled query: severity={} department={} ticket={}",
            severity,
            department,
            ticket_path.display()
        );

        Ok(Interaction {
            response,
            ticket_path,
            severity,
            department,
        })
    }
}
