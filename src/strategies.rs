//! Invalidation Strategy Table
//!
//! Centralizes the "what else becomes stale" knowledge for every mutation
//! against the backing service, so no call site duplicates the dependency
//! graph between resources. Each resource has a typed event enum and one
//! handler; every handler is a finite, explicit list of invalidation calls.
//!
//! Handlers are synchronous and idempotent, and never perform I/O or
//! re-fetch; they only remove cache entries and let subscriptions carry
//! the staleness to every mounted reader.

use tracing::debug;

use crate::cache::keys::resource_key;
use crate::cache::{CacheManager, KeyPattern};

// == Resource Events ==
/// Mutations against clients.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Created,
    Updated(String),
    Deleted(String),
}

/// Mutations against leads.
#[derive(Debug, Clone)]
pub enum LeadEvent {
    Created,
    Updated(String),
    Deleted(String),
    /// A lead became a client; every aggregate it fed is stale.
    Converted {
        lead_id: String,
        client_id: String,
    },
}

/// Mutations against projects.
#[derive(Debug, Clone)]
pub enum ProjectEvent {
    Created,
    Updated(String),
    Deleted(String),
    StageChanged(String),
}

/// Mutations against agents.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Created,
    Updated(String),
    Deleted(String),
    StatusChanged(String),
}

/// Mutations against conversations.
#[derive(Debug, Clone)]
pub enum ConversationEvent {
    Started,
    Deleted(String),
    /// New message in one conversation; list views keep their previews.
    MessageAdded(String),
}

/// Mutations against reports.
#[derive(Debug, Clone)]
pub enum ReportEvent {
    Generated,
}

/// Auth session transitions. Everything cached under the old session is
/// untrustworthy afterwards.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    LoggedOut,
    AuthError,
}

// == Invalidation Strategies ==
/// The strategy table. Read-only after construction; call sites invoke the
/// handler for their resource immediately after a successful write against
/// the external service.
#[derive(Clone)]
pub struct InvalidationStrategies {
    cache: CacheManager,
}

impl InvalidationStrategies {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    // == Clients ==
    pub fn client(&self, event: ClientEvent) {
        debug!(?event, "applying invalidation strategy");
        match event {
            ClientEvent::Created => {
                self.cache.invalidate_resource("clients");
                self.cache.invalidate_resource("reports");
            }
            ClientEvent::Updated(id) => {
                self.cache.invalidate(&resource_key("clients", &id));
                self.cache.invalidate_resource("clients");
            }
            ClientEvent::Deleted(id) => {
                self.cache.invalidate(&resource_key("clients", &id));
                self.cache.invalidate_resource("clients");
                self.cache.invalidate_resource("reports");
                // leads and projects referencing the client are stale too
                self.cache
                    .invalidate_matching(&scoped("leads", "client", &id));
                self.cache
                    .invalidate_matching(&scoped("projects", "client", &id));
            }
        }
    }

    // == Leads ==
    pub fn lead(&self, event: LeadEvent) {
        debug!(?event, "applying invalidation strategy");
        match event {
            LeadEvent::Created => {
                self.cache.invalidate_resource("leads");
                self.cache.invalidate_resource("reports");
            }
            LeadEvent::Updated(id) => {
                self.cache.invalidate(&resource_key("leads", &id));
                self.cache.invalidate_resource("leads");
            }
            LeadEvent::Deleted(id) => {
                self.cache.invalidate(&resource_key("leads", &id));
                self.cache.invalidate_resource("leads");
                self.cache.invalidate_resource("reports");
            }
            LeadEvent::Converted { lead_id, client_id } => {
                self.cache.invalidate(&resource_key("leads", &lead_id));
                self.cache.invalidate_resource("leads");
                self.cache.invalidate(&resource_key("clients", &client_id));
                self.cache.invalidate_resource("clients");
                self.cache.invalidate_resource("reports");
            }
        }
    }

    // == Projects ==
    pub fn project(&self, event: ProjectEvent) {
        debug!(?event, "applying invalidation strategy");
        match event {
            ProjectEvent::Created => {
                self.cache.invalidate_resource("projects");
                self.cache.invalidate_resource("reports");
            }
            ProjectEvent::Updated(id) => {
                self.cache.invalidate(&resource_key("projects", &id));
                self.cache.invalidate_resource("projects");
            }
            ProjectEvent::Deleted(id) => {
                self.cache.invalidate(&resource_key("projects", &id));
                self.cache.invalidate_resource("projects");
                self.cache.invalidate_resource("reports");
                self.cache
                    .invalidate_matching(&scoped("conversations", "project", &id));
            }
            ProjectEvent::StageChanged(id) => {
                self.cache.invalidate(&resource_key("projects", &id));
                self.cache.invalidate_resource("projects");
                self.cache.invalidate_resource("reports");
            }
        }
    }

    // == Agents ==
    pub fn agent(&self, event: AgentEvent) {
        debug!(?event, "applying invalidation strategy");
        match event {
            AgentEvent::Created => {
                self.cache.invalidate_resource("agents");
            }
            AgentEvent::Updated(id) => {
                self.cache.invalidate(&resource_key("agents", &id));
                self.cache.invalidate_resource("agents");
            }
            AgentEvent::Deleted(id) => {
                self.cache.invalidate(&resource_key("agents", &id));
                self.cache.invalidate_resource("agents");
                self.cache
                    .invalidate_matching(&scoped("conversations", "agent", &id));
            }
            AgentEvent::StatusChanged(id) => {
                self.cache.invalidate(&resource_key("agents", &id));
                // conversation views embed the assigned agent's status
                self.cache
                    .invalidate_matching(&scoped("conversations", "agent", &id));
            }
        }
    }

    // == Conversations ==
    pub fn conversation(&self, event: ConversationEvent) {
        debug!(?event, "applying invalidation strategy");
        match event {
            ConversationEvent::Started => {
                self.cache.invalidate_resource("conversations");
            }
            ConversationEvent::Deleted(id) => {
                self.cache.invalidate(&resource_key("conversations", &id));
                self.cache.invalidate_resource("conversations");
            }
            ConversationEvent::MessageAdded(id) => {
                self.cache.invalidate(&resource_key("conversations", &id));
            }
        }
    }

    // == Reports ==
    pub fn report(&self, event: ReportEvent) {
        debug!(?event, "applying invalidation strategy");
        match event {
            ReportEvent::Generated => {
                self.cache.invalidate_resource("reports");
            }
        }
    }

    // == Session ==
    pub fn session(&self, event: SessionEvent) {
        debug!(?event, "applying invalidation strategy");
        match event {
            SessionEvent::LoggedOut | SessionEvent::AuthError => {
                self.cache.clear();
            }
        }
    }
}

/// Pattern for keys of one resource scoped to a related entity, e.g.
/// `leads:all:client:c1`. The id is escaped before compilation; if the
/// template still fails to compile, the whole resource is invalidated
/// instead, since over-invalidation only costs a refetch.
fn scoped(resource: &str, field: &str, id: &str) -> KeyPattern {
    let pattern = format!("^{}:.*{}:{}", resource, field, regex::escape(id));
    KeyPattern::regex(&pattern).unwrap_or_else(|_| KeyPattern::prefix(resource))
}
