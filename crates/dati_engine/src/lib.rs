//! Dati engine: backend HTTP client, timers and effect execution.
mod client;
mod engine;
mod scheduler;
mod types;

pub use client::{decode_reply, Backend, ClientSettings, ReqwestBackend};
pub use engine::{execute, EngineEvents, EngineHandle};
pub use scheduler::{Scheduler, TickSink, TimerKind};
pub use types::{ApiError, ApiOutcome, ApiRequest, ApiResult, EngineEvent, FailureKind};
