//! Tool-calling adapters for agent frameworks.
//!
//! Each [`Tool`] wraps one client operation as a named, described callable
//! that takes a single string and returns a single string. Turning that
//! string into typed arguments (for example splitting `"<template id>,<json>"`)
//! is the adapter's job. Client errors pass through inside
//! [`ToolError::Api`] with their kind intact.

use crate::client::{PageSource, ToolsClient};
use crate::error::MiddlemanError;
use crate::models::{PageImage, Presentation, TemplateSlide};
use async_trait::async_trait;
use thiserror::Error;

/// Environment variable with the default PDF template id.
pub const PDF_TEMPLATE_ENV: &str = "MIDDLEMAN_PDF_TEMPLATE_ID";
/// Environment variable with the default DOCX template id.
pub const DOCX_TEMPLATE_ENV: &str = "MIDDLEMAN_DOCX_TEMPLATE_ID";
/// Environment variable with the default PPTX template id.
pub const PPTX_TEMPLATE_ENV: &str = "MIDDLEMAN_TEMPLATE_ID";

/// Failure of a tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool input could not be turned into call arguments.
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    /// The underlying API call failed.
    #[error(transparent)]
    Api(#[from] MiddlemanError),
}

/// A single-input, single-output callable backed by the API.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable identifier, e.g. `md-to-pdf`.
    fn name(&self) -> &str;

    /// Natural-language description shown to the orchestrating model.
    fn description(&self) -> &str;

    async fn run(&self, input: &str) -> Result<String, ToolError>;
}

/// Template ids used when a tool input does not name one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDefaults {
    pub pdf: Option<String>,
    pub docx: Option<String>,
    pub pptx: Option<String>,
}

impl TemplateDefaults {
    /// Read defaults from `MIDDLEMAN_PDF_TEMPLATE_ID`,
    /// `MIDDLEMAN_DOCX_TEMPLATE_ID` and `MIDDLEMAN_TEMPLATE_ID`.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            pdf: read(PDF_TEMPLATE_ENV),
            docx: read(DOCX_TEMPLATE_ENV),
            pptx: read(PPTX_TEMPLATE_ENV),
        }
    }
}

/// Every tool, wired to `client`.
pub fn default_tools(client: &ToolsClient, defaults: TemplateDefaults) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(MdToPdfTool::new(client.clone(), defaults.pdf)),
        Box::new(MdToDocxTool::new(client.clone(), defaults.docx)),
        Box::new(MdToPptxTool::new(client.clone())),
        Box::new(PageImagesTool::new(client.clone(), PageSource::Pdf)),
        Box::new(PageImagesTool::new(client.clone(), PageSource::Pptx)),
        Box::new(PageImagesTool::new(client.clone(), PageSource::Docx)),
        Box::new(JsonToPptxAnalyzeTool::new(client.clone(), defaults.pptx.clone())),
        Box::new(JsonToPptxExecuteTool::new(client.clone(), defaults.pptx)),
    ]
}

// ── Markdown tools ───────────────────────────────────────────────────────

pub struct MdToPdfTool {
    client: ToolsClient,
    default_template_id: Option<String>,
}

impl MdToPdfTool {
    pub fn new(client: ToolsClient, default_template_id: Option<String>) -> Self {
        Self {
            client,
            default_template_id,
        }
    }
}

#[async_trait]
impl Tool for MdToPdfTool {
    fn name(&self) -> &str {
        "md-to-pdf"
    }

    fn description(&self) -> &str {
        "Convert a Markdown string to PDF. The input must be valid Markdown. \
         The output is the download URL of the generated PDF."
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        Ok(self
            .client
            .md_to_pdf(input, self.default_template_id.as_deref())
            .await?)
    }
}

pub struct MdToDocxTool {
    client: ToolsClient,
    default_template_id: Option<String>,
}

impl MdToDocxTool {
    pub fn new(client: ToolsClient, default_template_id: Option<String>) -> Self {
        Self {
            client,
            default_template_id,
        }
    }
}

#[async_trait]
impl Tool for MdToDocxTool {
    fn name(&self) -> &str {
        "md-to-docx"
    }

    fn description(&self) -> &str {
        "Convert a Markdown string to DOCX. The input must be valid Markdown. \
         The output is the download URL of the generated DOCX."
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        Ok(self
            .client
            .md_to_docx(input, self.default_template_id.as_deref())
            .await?)
    }
}

pub struct MdToPptxTool {
    client: ToolsClient,
}

impl MdToPptxTool {
    pub fn new(client: ToolsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for MdToPptxTool {
    fn name(&self) -> &str {
        "md-to-pptx"
    }

    fn description(&self) -> &str {
        "Convert a Markdown string to PPTX. The input must be valid Markdown. \
         The output is the download URL of the generated PPTX."
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        Ok(self.client.md_to_pptx(input).await?)
    }
}

// ── Page images ──────────────────────────────────────────────────────────

/// Page-image rendering for one document type.
pub struct PageImagesTool {
    client: ToolsClient,
    source: PageSource,
}

impl PageImagesTool {
    pub fn new(client: ToolsClient, source: PageSource) -> Self {
        Self { client, source }
    }
}

#[async_trait]
impl Tool for PageImagesTool {
    fn name(&self) -> &str {
        match self.source {
            PageSource::Pdf => "pdf-to-page-images",
            PageSource::Pptx => "pptx-to-page-images",
            PageSource::Docx => "docx-to-page-images",
        }
    }

    fn description(&self) -> &str {
        match self.source {
            PageSource::Pdf => {
                "Render each page of a PDF as an image. The input must be a local PDF \
                 file path. The output lists one image URL per page."
            }
            PageSource::Pptx => {
                "Render each slide of a PPTX as an image. The input must be a local PPTX \
                 file path. The output lists one image URL per slide."
            }
            PageSource::Docx => {
                "Render each page of a DOCX as an image. The input must be a local DOCX \
                 file path. The output lists one image URL per page."
            }
        }
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        let path = input.trim();
        if path.is_empty() {
            return Err(ToolError::InvalidInput("a file path is required".into()));
        }
        let pages = self
            .client
            .file_to_page_images(path, self.source, None)
            .await?;
        Ok(format_pages(&pages))
    }
}

/// One `Page N: url` line per page.
pub fn format_pages(pages: &[PageImage]) -> String {
    pages
        .iter()
        .map(|p| format!("Page {}: {}", p.page_no, p.image_url))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Templates ────────────────────────────────────────────────────────────

pub struct JsonToPptxAnalyzeTool {
    client: ToolsClient,
    default_template_id: Option<String>,
}

impl JsonToPptxAnalyzeTool {
    pub fn new(client: ToolsClient, default_template_id: Option<String>) -> Self {
        Self {
            client,
            default_template_id,
        }
    }
}

#[async_trait]
impl Tool for JsonToPptxAnalyzeTool {
    fn name(&self) -> &str {
        "json-to-pptx-analyze"
    }

    fn description(&self) -> &str {
        "Analyse the structure of a PPTX template. The input is the template ID (UUID); \
         leave it empty to use the configured default. The output lists each slide type \
         with its placeholder names."
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        let template_id = resolve_template_id(input, self.default_template_id.as_deref())?;
        let slides = self.client.json_to_pptx_analyze(template_id).await?;
        Ok(format_template(&slides))
    }
}

/// One `Slide N: type (placeholders: a, b)` line per slide layout.
pub fn format_template(slides: &[TemplateSlide]) -> String {
    slides
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "Slide {}: {} (placeholders: {})",
                i + 1,
                s.slide_type,
                s.placeholder_names().join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct JsonToPptxExecuteTool {
    client: ToolsClient,
    default_template_id: Option<String>,
}

impl JsonToPptxExecuteTool {
    pub fn new(client: ToolsClient, default_template_id: Option<String>) -> Self {
        Self {
            client,
            default_template_id,
        }
    }
}

#[async_trait]
impl Tool for JsonToPptxExecuteTool {
    fn name(&self) -> &str {
        "json-to-pptx-execute"
    }

    fn description(&self) -> &str {
        "Generate a PPTX from a template and presentation JSON. The input is \
         \"<template ID>,<JSON>\" (comma separated); the template ID may be omitted when a \
         default is configured. The JSON has the form {\"slides\": [{\"type\": ..., \
         \"placeholders\": [{\"name\": ..., \"content\": ...}]}]}. The output is the \
         download URL of the generated PPTX."
    }

    async fn run(&self, input: &str) -> Result<String, ToolError> {
        let (template_id, presentation) =
            parse_execute_input(input, self.default_template_id.as_deref())?;
        Ok(self
            .client
            .json_to_pptx_execute(&template_id, &presentation)
            .await?)
    }
}

fn resolve_template_id<'a>(input: &'a str, default: Option<&'a str>) -> Result<&'a str, ToolError> {
    let input = input.trim();
    if !input.is_empty() {
        return Ok(input);
    }
    default
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidInput("no template ID given and no default configured".into()))
}

/// Split `"<template id>,<json>"`, or take bare JSON with the default id.
pub fn parse_execute_input(
    input: &str,
    default_template_id: Option<&str>,
) -> Result<(String, Presentation), ToolError> {
    let input = input.trim();
    let (template_id, json) = if input.starts_with('{') {
        let id = resolve_template_id("", default_template_id)?;
        (id, input)
    } else {
        let (id, json) = input.split_once(',').ok_or_else(|| {
            ToolError::InvalidInput("expected \"<template ID>,<JSON>\"".into())
        })?;
        (resolve_template_id(id, default_template_id)?, json.trim())
    };

    let presentation: Presentation = serde_json::from_str(json)
        .map_err(|e| ToolError::InvalidInput(format!("malformed presentation JSON: {e}")))?;
    Ok((template_id.to_string(), presentation))
}
