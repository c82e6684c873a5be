pub mod api;
pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod validation;
pub mod workflow;

pub use api::{AbortSignal, ApiClient, InterpretationRecord};
pub use chat::{ChatSession, Message, Role, APOLOGY_MESSAGE, SUGGESTED_QUESTIONS};
pub use config::ClientConfig;
pub use context::{AppContext, Language};
pub use error::{ApiError, ApiResult, ChatError, ErrorKind, WorkflowError};
pub use export::{export_text, write_export, EXPORT_FILE_NAME};
pub use validation::{validate_file, FileHandle, Validation};
pub use workflow::{Phase, Workflow, WorkflowState};

use tracing_subscriber::EnvFilter;

/// Load `.env` and install the tracing subscriber
///
/// Call once at process start. Safe to call again; later calls are no-ops.
pub fn init() {
    // CWD first, then the parent (running from a nested target dir)
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }

    // Default: warn for dependencies, info for this crate
    // Use RUST_LOG=debug for per-transition logs
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,med_interpret_lib=info")),
        )
        .try_init();
}
