//! The unified memory facade.
//!
//! [`UnifiedMemory`] composes alias resolution, the context window, and the
//! entity graph into the operations exposed to clients. Every operation first
//! resolves the caller's identifier, so data written under one alias is visible
//! under every other alias of the same user. Operations return
//! [`MemoryResult`]; translating failures into a wire shape is the caller's job.

use serde::Serialize;
use std::sync::Arc;

use crate::config::ConcordConfig;
use crate::memory::clock::{Clock, SystemClock};
use crate::memory::context::{self, MessageSelection};
use crate::memory::entities::{self, ObservationUpdate, UpsertStrategy};
use crate::memory::error::MemoryResult;
use crate::memory::identity;
use crate::memory::search::{self, SearchResults, SearchScope};
use crate::memory::types::{
    EntityInput, EntityRef, EntitySummary, IncomingMessage, Message, ObservationInput,
};
use crate::store::DocumentStore;

/// Tunables for [`UnifiedMemory`].
#[derive(Debug, Clone)]
pub struct MemorySettings {
    pub message_selection: MessageSelection,
    pub upsert_strategy: UpsertStrategy,
    pub default_max_messages: usize,
    pub context_entity_limit: usize,
    pub default_max_results: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            message_selection: MessageSelection::Head,
            upsert_strategy: UpsertStrategy::Replace,
            default_max_messages: 20,
            context_entity_limit: 10,
            default_max_results: 10,
        }
    }
}

impl From<&ConcordConfig> for MemorySettings {
    fn from(config: &ConcordConfig) -> Self {
        Self {
            message_selection: config.context.message_selection,
            upsert_strategy: config.entities.upsert_strategy,
            default_max_messages: config.context.default_max_messages,
            context_entity_limit: config.entities.context_entity_limit,
            default_max_results: config.search.default_max_results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnifiedContext {
    pub user_id: String,
    pub context_summary: String,
    pub recent_messages: Vec<Message>,
    pub entities: Vec<EntitySummary>,
    /// Messages stored for the user, not just the ones returned.
    pub message_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedEntities {
    pub interface: String,
    pub created: Vec<EntityRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub interface: String,
    /// Messages received in the request.
    pub synced: usize,
    /// Messages that were not already stored.
    pub added: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservationsAdded {
    pub interface: String,
    pub updated: Vec<ObservationUpdate>,
}

pub struct UnifiedMemory {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    settings: MemorySettings,
}

impl UnifiedMemory {
    pub fn new(store: Arc<dyn DocumentStore>, settings: MemorySettings) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), settings)
    }

    pub fn with_clock(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        settings: MemorySettings,
    ) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn resolve(&self, user_id: &str) -> MemoryResult<String> {
        identity::resolve(self.store.as_ref(), user_id)
    }

    /// Summary, the selected slice of messages, and the most recently updated entities.
    /// Without `include_history` no messages are returned; `message_count` is
    /// still reported.
    pub fn get_unified_context(
        &self,
        user_id: &str,
        max_messages: Option<usize>,
        include_history: bool,
    ) -> MemoryResult<UnifiedContext> {
        let canonical = self.resolve(user_id)?;
        let limit = if include_history {
            max_messages.unwrap_or(self.settings.default_max_messages)
        } else {
            0
        };

        let snapshot = context::read(
            self.store.as_ref(),
            &canonical,
            limit,
            self.settings.message_selection,
        )?;
        let entities = entities::list(
            self.store.as_ref(),
            &canonical,
            self.settings.context_entity_limit,
        )?;

        tracing::info!(
            user_id,
            canonical = %canonical,
            message_count = snapshot.total,
            entities = entities.len(),
            "unified context read"
        );

        Ok(UnifiedContext {
            user_id: user_id.to_string(),
            context_summary: snapshot.summary,
            recent_messages: snapshot.messages,
            entities: entities.into_iter().map(EntitySummary::from).collect(),
            message_count: snapshot.total,
        })
    }

    pub fn search_unified_memory(
        &self,
        user_id: &str,
        query: &str,
        max_results: Option<usize>,
        interface: Option<&str>,
        scope: SearchScope,
    ) -> MemoryResult<SearchResults> {
        let canonical = self.resolve(user_id)?;
        let limit = max_results.unwrap_or(self.settings.default_max_results);

        let results =
            search::search(self.store.as_ref(), &canonical, query, limit, interface, scope)?;
        tracing::info!(
            user_id,
            canonical = %canonical,
            query,
            ?scope,
            messages = results.messages.len(),
            entities = results.entities.len(),
            "unified search"
        );
        Ok(results)
    }

    /// Upsert each entity in order. Not transactional: if a write fails, the
    /// entities before it stay written and the rest are skipped.
    pub fn create_unified_entities(
        &self,
        user_id: &str,
        interface: &str,
        inputs: &[EntityInput],
    ) -> MemoryResult<CreatedEntities> {
        let canonical = self.resolve(user_id)?;

        let created = inputs
            .iter()
            .map(|input| {
                entities::upsert(
                    self.store.as_ref(),
                    self.clock.as_ref(),
                    self.settings.upsert_strategy,
                    &canonical,
                    interface,
                    &input.name,
                    &input.entity_type,
                    &input.observations,
                )
            })
            .collect::<MemoryResult<Vec<_>>>()?;

        tracing::info!(user_id, canonical = %canonical, interface, count = created.len(), "entities created");
        Ok(CreatedEntities {
            interface: interface.to_string(),
            created,
        })
    }

    pub fn sync_conversation_state(
        &self,
        user_id: &str,
        interface: &str,
        messages: &[IncomingMessage],
        context_summary: Option<&str>,
    ) -> MemoryResult<SyncReport> {
        let canonical = self.resolve(user_id)?;
        let added = context::append(
            self.store.as_ref(),
            self.clock.as_ref(),
            &canonical,
            interface,
            messages,
            context_summary,
        )?;

        tracing::info!(user_id, canonical = %canonical, interface, synced = messages.len(), added, "conversation synced");
        Ok(SyncReport {
            interface: interface.to_string(),
            synced: messages.len(),
            added,
        })
    }

    /// Append observations to existing entities; unknown names are reported, not created.
    pub fn add_observations(
        &self,
        user_id: &str,
        interface: &str,
        inputs: &[ObservationInput],
    ) -> MemoryResult<ObservationsAdded> {
        let canonical = self.resolve(user_id)?;

        let updated = inputs
            .iter()
            .map(|input| {
                entities::add_observations(
                    self.store.as_ref(),
                    self.clock.as_ref(),
                    &canonical,
                    interface,
                    &input.entity_name,
                    &input.contents,
                )
            })
            .collect::<MemoryResult<Vec<_>>>()?;

        tracing::info!(user_id, canonical = %canonical, interface, entities = updated.len(), "observations added");
        Ok(ObservationsAdded {
            interface: interface.to_string(),
            updated,
        })
    }
}
