pub mod add_observations;
pub mod create_unified_entities;
pub mod get_unified_context;
pub mod search_unified_memory;
pub mod sync_conversation_state;

use add_observations::AddObservationsParams;
use create_unified_entities::CreateUnifiedEntitiesParams;
use get_unified_context::GetUnifiedContextParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use search_unified_memory::SearchUnifiedMemoryParams;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use sync_conversation_state::SyncConversationStateParams;

use crate::memory::{MemoryError, MemoryResult, UnifiedMemory};

/// The operations a client can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetUnifiedContext,
    SearchUnifiedMemory,
    CreateUnifiedEntities,
    SyncConversationState,
    AddObservations,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Self::GetUnifiedContext,
        Self::SearchUnifiedMemory,
        Self::CreateUnifiedEntities,
        Self::SyncConversationState,
        Self::AddObservations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetUnifiedContext => "get_unified_context",
            Self::SearchUnifiedMemory => "search_unified_memory",
            Self::CreateUnifiedEntities => "create_unified_entities",
            Self::SyncConversationState => "sync_conversation_state",
            Self::AddObservations => "add_observations",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| MemoryError::UnknownOperation(s.to_string()))
    }
}

/// A fully parsed operation call.
#[derive(Debug, Clone)]
pub enum Request {
    GetUnifiedContext(GetUnifiedContextParams),
    SearchUnifiedMemory(SearchUnifiedMemoryParams),
    CreateUnifiedEntities(CreateUnifiedEntitiesParams),
    SyncConversationState(SyncConversationStateParams),
    AddObservations(AddObservationsParams),
}

impl Request {
    /// Parse an operation name and its JSON arguments. Fails before any I/O
    /// on an unknown name or malformed arguments.
    pub fn parse(operation: &str, arguments: Value) -> MemoryResult<Self> {
        let op: Operation = operation.parse()?;
        Ok(match op {
            Operation::GetUnifiedContext => Self::GetUnifiedContext(parse_args(op, arguments)?),
            Operation::SearchUnifiedMemory => Self::SearchUnifiedMemory(parse_args(op, arguments)?),
            Operation::CreateUnifiedEntities => {
                Self::CreateUnifiedEntities(parse_args(op, arguments)?)
            }
            Operation::SyncConversationState => {
                Self::SyncConversationState(parse_args(op, arguments)?)
            }
            Operation::AddObservations => Self::AddObservations(parse_args(op, arguments)?),
        })
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::GetUnifiedContext(_) => Operation::GetUnifiedContext,
            Self::SearchUnifiedMemory(_) => Operation::SearchUnifiedMemory,
            Self::CreateUnifiedEntities(_) => Operation::CreateUnifiedEntities,
            Self::SyncConversationState(_) => Operation::SyncConversationState,
            Self::AddObservations(_) => Operation::AddObservations,
        }
    }
}

fn parse_args<T: DeserializeOwned>(op: Operation, arguments: Value) -> MemoryResult<T> {
    serde_json::from_value(arguments).map_err(|e| MemoryError::InvalidArguments {
        operation: op.to_string(),
        reason: e.to_string(),
    })
}

/// Run a parsed request against the facade and serialize its result.
pub fn execute(memory: &UnifiedMemory, request: Request) -> MemoryResult<Value> {
    let value = match request {
        Request::GetUnifiedContext(p) => {
            serde_json::to_value(memory.get_unified_context(
            &p.user_id,
            p.max_messages,
            p.include_history.unwrap_or(true),
        )?)?
        }
        Request::SearchUnifiedMemory(p) => serde_json::to_value(memory.search_unified_memory(
            &p.user_id,
            &p.query,
            p.max_results,
            p.interface.as_deref(),
            p.search_type.unwrap_or_default(),
        )?)?,
        Request::CreateUnifiedEntities(p) => serde_json::to_value(
            memory.create_unified_entities(&p.user_id, &p.interface, &p.entities)?,
        )?,
        Request::SyncConversationState(p) => serde_json::to_value(memory.sync_conversation_state(
            &p.user_id,
            &p.interface,
            &p.messages,
            p.context_summary.as_deref(),
        )?)?,
        Request::AddObservations(p) => serde_json::to_value(
            memory.add_observations(&p.user_id, &p.interface, &p.observations)?,
        )?,
    };
    Ok(value)
}

/// Parse and execute one call by operation name.
pub fn dispatch(memory: &UnifiedMemory, operation: &str, arguments: Value) -> MemoryResult<Value> {
    let request = Request::parse(operation, arguments)?;
    execute(memory, request)
}

/// The concord MCP tool handler. Holds the shared facade and exposes one tool
/// per [`Operation`] via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct ConcordTools {
    tool_router: ToolRouter<Self>,
    memory: Arc<UnifiedMemory>,
}

#[tool_router]
impl ConcordTools {
    pub fn new(memory: Arc<UnifiedMemory>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            memory,
        }
    }

    /// Read the unified context for a user across all interfaces.
    #[tool(description = "Get unified context from ALL interfaces (terminal, WhatsApp, etc). Returns the context summary, stored messages, and recently updated entities with interface attribution.")]
    async fn get_unified_context(
        &self,
        Parameters(params): Parameters<GetUnifiedContextParams>,
    ) -> Result<String, String> {
        tracing::info!(user_id = %params.user_id, max_messages = ?params.max_messages, "get_unified_context called");
        self.run(Request::GetUnifiedContext(params)).await
    }

    /// Substring search over messages and entities.
    #[tool(description = "Search across ALL memory: messages and entities from every interface. Case-insensitive substring match.")]
    async fn search_unified_memory(
        &self,
        Parameters(params): Parameters<SearchUnifiedMemoryParams>,
    ) -> Result<String, String> {
        tracing::info!(user_id = %params.user_id, query = %params.query, "search_unified_memory called");
        self.run(Request::SearchUnifiedMemory(params)).await
    }

    /// Create or overwrite entities in the knowledge graph.
    #[tool(description = "Create entities in the unified knowledge graph with interface tracking. Each observation records the interface it came from.")]
    async fn create_unified_entities(
        &self,
        Parameters(params): Parameters<CreateUnifiedEntitiesParams>,
    ) -> Result<String, String> {
        tracing::info!(
            user_id = %params.user_id,
            interface = %params.interface,
            count = params.entities.len(),
            "create_unified_entities called"
        );
        self.run(Request::CreateUnifiedEntities(params)).await
    }

    /// Append conversation messages to the shared context window.
    #[tool(description = "Sync conversation messages so they are visible from every other interface. Identical messages are stored once.")]
    async fn sync_conversation_state(
        &self,
        Parameters(params): Parameters<SyncConversationStateParams>,
    ) -> Result<String, String> {
        tracing::info!(
            user_id = %params.user_id,
            interface = %params.interface,
            count = params.messages.len(),
            "sync_conversation_state called"
        );
        self.run(Request::SyncConversationState(params)).await
    }

    /// Append observations to entities that already exist.
    #[tool(description = "Add observations to existing entities. Entities that do not exist are reported as not_found, not created.")]
    async fn add_observations(
        &self,
        Parameters(params): Parameters<AddObservationsParams>,
    ) -> Result<String, String> {
        tracing::info!(
            user_id = %params.user_id,
            interface = %params.interface,
            count = params.observations.len(),
            "add_observations called"
        );
        self.run(Request::AddObservations(params)).await
    }
}

impl ConcordTools {
    /// Run the synchronous core off the async runtime and render the outcome.
    /// `Err` becomes an `isError` tool result; the server keeps running.
    async fn run(&self, request: Request) -> Result<String, String> {
        let operation = request.operation();
        let memory = Arc::clone(&self.memory);

        let outcome = tokio::task::spawn_blocking(move || execute(&memory, request))
            .await
            .map_err(|e| format!("Error: {operation} task failed: {e}"))?;

        match outcome {
            Ok(value) => serde_json::to_string_pretty(&value)
                .map_err(|e| format!("Error: serialization failed: {e}")),
            Err(e) => {
                tracing::warn!(%operation, error = %e, "operation failed");
                Err(format!("Error: {e}"))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for ConcordTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Concord is one memory shared by every interface a user talks through. \
                 Use sync_conversation_state to save messages, create_unified_entities and \
                 add_observations to record facts, and get_unified_context or \
                 search_unified_memory to read them back from any interface."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = "delete_everything".parse::<Operation>().unwrap_err();
        assert!(matches!(err, MemoryError::UnknownOperation(_)));
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        let err = Request::parse("get_unified_context", serde_json::json!({"max_messages": 5}))
            .unwrap_err();
        assert!(err.to_string().contains("invalid arguments for get_unified_context"));
    }
}
