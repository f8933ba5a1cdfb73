//! Coordination kernel
//!
//! The shared substrate under the agents: a typed interaction router, an
//! agent registry, a concurrency gate bounding heavy work, and a topic
//! event bus. Everything is an explicitly constructed service handed out
//! as `Arc` handles; there are no globals.

use thiserror::Error;

pub mod events;
pub mod gate;
pub mod interaction;
pub mod kernel;
pub mod registry;

pub use events::{EventBus, Subscriber};
pub use gate::ConcurrencyGate;
pub use interaction::{Interaction, InteractionStatus, InteractionType};
pub use kernel::{InteractionHandler, Kernel, SELF_IMPROVEMENT_TOOL};
pub use registry::{AgentRecord, AgentRegistry};

/// Kernel errors
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("a handler is already registered for {0:?}")]
    DuplicateHandler(InteractionType),

    #[error("handler failed: {0}")]
    Handler(String),

    #[error("concurrency gate is closed")]
    GateClosed,

    #[error("tool error: {0}")]
    Tool(#[from] axon_tools::ToolError),
}

pub type Result<T> = std::result::Result<T, KernelError>;

pub(crate) fn short_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}
