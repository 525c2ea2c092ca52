//! Jobmail
//!
//! Ingests a user's sent-mail history from Gmail, reconstructs each message's
//! structured content, classifies it as job/career-related with a layered
//! keyword-then-model decision procedure, and persists the result
//! idempotently into a local SQLite store keyed by message id and thread.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 (read-only scope) with on-disk token caching
//! - **Listing**: paginated id retrieval bounded by a batch cap, tolerant of
//!   mid-listing failures
//! - **Fetching**: typed message reconstruction (headers, MIME bodies,
//!   attachment manifest) validated at the provider boundary
//! - **Classification**: deterministic keyword gate with a model-backed
//!   fallback for ambiguous mail
//! - **Persistence**: idempotent full-row upsert, per-message failure
//!   isolation, observable run summaries
//! - **Surface**: a thin HTTP API for sync triggering, listing, thread
//!   reconstruction, attachment bytes, drafting and free-text filtering
//!
//! # Example Usage
//!
//! ```no_run
//! use jobmail::{auth, client::GmailMailClient, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let hub = auth::initialize_gmail_hub(
//!         "credentials.json".as_ref(),
//!         ".jobmail/token.json".as_ref(),
//!     )
//!     .await?;
//!
//!     let client = GmailMailClient::new(hub);
//!
//!     // Wire the client into an IngestionPipeline and run a batch
//!     // ...
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`client`] - Mail provider trait + Gmail implementation with deadlines and retry
//! - [`pager`] - Paginated message-id listing
//! - [`fetcher`] - Raw payload to typed message conversion
//! - [`body`] - MIME part-tree reconstruction
//! - [`classifier`] - Keyword gate + model fallback, free-text filtering
//! - [`engine`] - Injectable completion backend
//! - [`drafter`] - Follow-up draft generation
//! - [`pipeline`] - Batch ingestion orchestration
//! - [`store`] - SQLite message store
//! - [`api`] - HTTP surface
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases

pub mod api;
pub mod auth;
pub mod body;
pub mod classifier;
pub mod cli;
pub mod client;
pub mod config;
pub mod drafter;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod pager;
pub mod pipeline;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{MailError, Result};

// Core data models
pub use models::{Attachment, Message, MessageDate, MessageSummary};

// Client traits and implementations
pub use client::{GmailMailClient, MailClient, MessagePage, ProgressCallback};

// Pipeline types
pub use pipeline::{IngestionPipeline, RunSummary};

// Classification and generation
pub use classifier::RelevanceClassifier;
pub use drafter::DraftGenerator;
pub use engine::{CompletionBackend, OpenAiBackend};

// Persistence
pub use store::Store;

// Config types
pub use config::{ApiConfig, Config, ModelConfig, StoreConfig, SyncConfig};

// CLI types (for binary usage)
pub use cli::{Cli, Commands};
