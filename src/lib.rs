//! # middleman-tools
//!
//! Typed Rust client for the [Middleman.ai](https://middleman-ai.com) document
//! conversion API, with a CLI and an MCP server built on top of it.
//!
//! All rendering happens server-side. This crate builds the HTTP requests,
//! decodes the responses into typed models and maps failures onto a small,
//! closed error set ([`MiddlemanError`] / [`ErrorKind`]).
//!
//! ## Layers
//!
//! ```text
//! caller
//!  │
//!  ├─ ToolsClient      one method per capability (md→pdf/docx/pptx, page images, templates)
//!  ├─ Transport        headers, JSON / multipart bodies, status → error classification
//!  └─ remote API       https://middleman-ai.com/api/…
//!
//! adapters over ToolsClient:
//!  ├─ tools            name + description + string in / string out, for agent frameworks
//!  ├─ mcp              JSON-RPC 2.0 server on stdio
//!  └─ middleman (bin)  one subcommand per operation
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use middleman_tools::{ClientConfig, ToolsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ToolsClient::new(ClientConfig::new("your-api-key")?)?;
//!     let pdf_url = client.md_to_pdf("# Sample\nThis is a test.", None).await?;
//!     println!("{pdf_url}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `middleman` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! middleman-tools = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use blocking::BlockingToolsClient;
pub use client::{PageSource, ToolsClient};
pub use config::{ClientConfig, ClientConfigBuilder, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use error::{ErrorKind, MiddlemanError};
pub use models::{PageImage, Placeholder, Presentation, Slide, TemplatePlaceholder, TemplateSlide};
pub use tools::{default_tools, TemplateDefaults, Tool, ToolError};
