//! The operation facade: one async method per remote capability.
//!
//! Every method follows the same four steps: shape the wire request, hand it
//! to [`Transport::send`], decode the payload into its response model, and
//! return only the field the caller needs. Errors from any step propagate
//! unchanged; nothing here retries or recovers.

use crate::config::ClientConfig;
use crate::error::MiddlemanError;
use crate::models::{
    decode, MdToDocxRequest, MdToDocxResponse, MdToPdfRequest, MdToPdfResponse, MdToPptxRequest,
    MdToPptxResponse, PageImage, PageImagesResponse, Presentation, TemplateAnalyzeRequest,
    TemplateAnalyzeResponse, TemplateExecuteRequest, TemplateExecuteResponse, TemplateSlide,
};
use crate::transport::{request_id_headers, FileUpload, RequestBody, Transport};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub const MD_TO_PDF_PATH: &str = "/api/v1/tools/md-to-pdf";
pub const MD_TO_DOCX_PATH: &str = "/api/v1/tools/md-to-docx";
pub const MD_TO_PPTX_PATH: &str = "/api/v1/tools/md-to-pptx";
pub const PDF_TO_PAGE_IMAGES_PATH: &str = "/api/v1/tools/pdf-to-page-images";
pub const PPTX_TO_PAGE_IMAGES_PATH: &str = "/api/v1/tools/pptx-to-page-images";
pub const DOCX_TO_PAGE_IMAGES_PATH: &str = "/api/v1/tools/docx-to-page-images";
pub const TEMPLATE_ANALYZE_PATH: &str = "/api/v2/tools/json-to-pptx/analyze";
pub const TEMPLATE_EXECUTE_PATH: &str = "/api/v2/tools/json-to-pptx/execute";
pub const LIST_TOOLS_PATH: &str = "/api/v1/tools";

/// Document type uploaded for page-image rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    Pdf,
    Pptx,
    Docx,
}

impl PageSource {
    /// Infer the source type from a file extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MiddlemanError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("pptx") => Ok(Self::Pptx),
            Some("docx") => Ok(Self::Docx),
            _ => Err(MiddlemanError::validation(format!(
                "Cannot infer document type of '{}': expected a .pdf, .pptx or .docx file",
                path.display()
            ))),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_TO_PAGE_IMAGES_PATH,
            Self::Pptx => PPTX_TO_PAGE_IMAGES_PATH,
            Self::Docx => DOCX_TO_PAGE_IMAGES_PATH,
        }
    }

    /// Multipart field the endpoint expects the file under.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf_file",
            Self::Pptx => "pptx_file",
            Self::Docx => "docx_file",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Pptx => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }
}

/// Typed client for the Middleman.ai tools API.
///
/// Cheap to clone; clones share the underlying connection pool but no
/// mutable state.
///
/// # Example
/// ```rust,no_run
/// use middleman_tools::{ClientConfig, ToolsClient};
///
/// # async fn run() -> Result<(), middleman_tools::MiddlemanError> {
/// let client = ToolsClient::new(ClientConfig::new("sk-...")?)?;
/// let url = client.md_to_pdf("# Sample\nThis is a test.", None).await?;
/// println!("{url}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolsClient {
    config: ClientConfig,
    transport: Transport,
}

impl ToolsClient {
    pub fn new(config: ClientConfig) -> Result<Self, MiddlemanError> {
        let transport = Transport::new(&config)?;
        Ok(Self { config, transport })
    }

    /// Build a client from `MIDDLEMAN_API_KEY` / `MIDDLEMAN_BASE_URL`.
    pub fn from_env() -> Result<Self, MiddlemanError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ── Markdown conversion ──────────────────────────────────────────────

    /// Convert Markdown to PDF and return the download URL.
    pub async fn md_to_pdf(
        &self,
        markdown: &str,
        pdf_template_id: Option<&str>,
    ) -> Result<String, MiddlemanError> {
        let body = MdToPdfRequest {
            markdown,
            pdf_template_id,
        };
        let data = self.post_json(MD_TO_PDF_PATH, &body).await?;
        let response: MdToPdfResponse = decode(data)?;
        Ok(response.pdf_url)
    }

    /// Convert Markdown to DOCX and return the download URL.
    pub async fn md_to_docx(
        &self,
        markdown: &str,
        docx_template_id: Option<&str>,
    ) -> Result<String, MiddlemanError> {
        let body = MdToDocxRequest {
            markdown,
            docx_template_id,
        };
        let data = self.post_json(MD_TO_DOCX_PATH, &body).await?;
        let response: MdToDocxResponse = decode(data)?;
        Ok(response.docx_url)
    }

    /// Convert Markdown to PPTX and return the download URL.
    pub async fn md_to_pptx(&self, markdown: &str) -> Result<String, MiddlemanError> {
        let data = self
            .post_json(MD_TO_PPTX_PATH, &MdToPptxRequest { markdown })
            .await?;
        let response: MdToPptxResponse = decode(data)?;
        Ok(response.pptx_url)
    }

    // ── Page images ──────────────────────────────────────────────────────

    /// Upload a local PDF and return one image URL per page, in page order.
    pub async fn pdf_to_page_images(
        &self,
        path: impl AsRef<Path>,
        request_id: Option<&str>,
    ) -> Result<Vec<PageImage>, MiddlemanError> {
        self.file_to_page_images(path, PageSource::Pdf, request_id)
            .await
    }

    /// Upload a local PPTX and return one image URL per slide.
    pub async fn pptx_to_page_images(
        &self,
        path: impl AsRef<Path>,
        request_id: Option<&str>,
    ) -> Result<Vec<PageImage>, MiddlemanError> {
        self.file_to_page_images(path, PageSource::Pptx, request_id)
            .await
    }

    /// Upload a local DOCX and return one image URL per page.
    pub async fn docx_to_page_images(
        &self,
        path: impl AsRef<Path>,
        request_id: Option<&str>,
    ) -> Result<Vec<PageImage>, MiddlemanError> {
        self.file_to_page_images(path, PageSource::Docx, request_id)
            .await
    }

    /// Upload `path` to the page-image endpoint for `source`.
    ///
    /// The whole file is read into memory and the handle closed before the
    /// request is sent. An unreadable file is a
    /// [`MiddlemanError::Validation`]; no request is made in that case.
    pub async fn file_to_page_images(
        &self,
        path: impl AsRef<Path>,
        source: PageSource,
        request_id: Option<&str>,
    ) -> Result<Vec<PageImage>, MiddlemanError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            MiddlemanError::validation(format!("Failed to read file '{}': {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        info!(
            path = %path.display(),
            bytes = bytes.len(),
            endpoint = source.endpoint(),
            "uploading document for page images"
        );

        let upload = FileUpload {
            field: source.field_name().to_string(),
            file_name,
            mime: source.mime().to_string(),
            bytes,
        };
        let headers = request_id_headers(request_id)?;
        let data = self
            .transport
            .send(
                Method::POST,
                source.endpoint(),
                RequestBody::Multipart(upload),
                &headers,
            )
            .await?;
        let response: PageImagesResponse = decode(data)?;
        Ok(response.pages)
    }

    // ── Template (JSON → PPTX) ───────────────────────────────────────────

    /// Describe the slide layouts and placeholders of a PPTX template.
    pub async fn json_to_pptx_analyze(
        &self,
        pptx_template_id: &str,
    ) -> Result<Vec<TemplateSlide>, MiddlemanError> {
        let data = self
            .post_json(
                TEMPLATE_ANALYZE_PATH,
                &TemplateAnalyzeRequest { pptx_template_id },
            )
            .await?;
        let response: TemplateAnalyzeResponse = decode(data)?;
        Ok(response.slides)
    }

    /// Fill a PPTX template with `presentation` and return the download URL.
    pub async fn json_to_pptx_execute(
        &self,
        pptx_template_id: &str,
        presentation: &Presentation,
    ) -> Result<String, MiddlemanError> {
        presentation.validate()?;
        let body = TemplateExecuteRequest {
            pptx_template_id,
            presentation,
        };
        let data = self.post_json(TEMPLATE_EXECUTE_PATH, &body).await?;
        let response: TemplateExecuteResponse = decode(data)?;
        Ok(response.pptx_url)
    }

    // ── Discovery ────────────────────────────────────────────────────────

    /// List the tools the service offers. Descriptors are passed through as-is.
    pub async fn list_tools(&self) -> Result<Vec<serde_json::Value>, MiddlemanError> {
        let data = self
            .transport
            .send(Method::GET, LIST_TOOLS_PATH, RequestBody::Empty, &HeaderMap::new())
            .await?;
        match data {
            serde_json::Value::Array(tools) => Ok(tools),
            other => Err(MiddlemanError::validation(format!(
                "Expected a JSON array of tools, got {}",
                json_type_name(&other)
            ))),
        }
    }

    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<serde_json::Value, MiddlemanError> {
        let value = serde_json::to_value(body)
            .map_err(|e| MiddlemanError::validation(format!("Failed to encode request: {e}")))?;
        self.transport
            .send(Method::POST, path, RequestBody::Json(value), &HeaderMap::new())
            .await
    }
}

fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
