pub mod clock;
pub mod context;
pub mod entities;
pub mod error;
pub mod identity;
pub mod search;
pub mod types;
pub mod unified;

pub use error::{MemoryError, MemoryResult};
pub use unified::{MemorySettings, UnifiedMemory};
