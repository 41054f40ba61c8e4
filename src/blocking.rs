//! Blocking wrapper around [`ToolsClient`].
//!
//! Each call drives the async client to completion on a current-thread tokio
//! runtime owned by the wrapper. Do not call these methods from inside an
//! async context; use [`ToolsClient`] directly there.

use crate::client::{PageSource, ToolsClient};
use crate::config::ClientConfig;
use crate::error::MiddlemanError;
use crate::models::{PageImage, Presentation, TemplateSlide};
use std::path::Path;
use tokio::runtime::{Builder, Runtime};

/// Synchronous counterpart of [`ToolsClient`].
#[derive(Debug)]
pub struct BlockingToolsClient {
    inner: ToolsClient,
    runtime: Runtime,
}

impl BlockingToolsClient {
    pub fn new(config: ClientConfig) -> Result<Self, MiddlemanError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                MiddlemanError::InvalidConfig(format!("Failed to create tokio runtime: {e}"))
            })?;
        Ok(Self {
            inner: ToolsClient::new(config)?,
            runtime,
        })
    }

    pub fn from_env() -> Result<Self, MiddlemanError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// The async client this wrapper drives.
    pub fn async_client(&self) -> &ToolsClient {
        &self.inner
    }

    pub fn md_to_pdf(
        &self,
        markdown: &str,
        pdf_template_id: Option<&str>,
    ) -> Result<String, MiddlemanError> {
        self.runtime
            .block_on(self.inner.md_to_pdf(markdown, pdf_template_id))
    }

    pub fn md_to_docx(
        &self,
        markdown: &str,
        docx_template_id: Option<&str>,
    ) -> Result<String, MiddlemanError> {
        self.runtime
            .block_on(self.inner.md_to_docx(markdown, docx_template_id))
    }

    pub fn md_to_pptx(&self, markdown: &str) -> Result<String, MiddlemanError> {
        self.runtime.block_on(self.inner.md_to_pptx(markdown))
    }

    pub fn file_to_page_images(
        &self,
        path: impl AsRef<Path>,
        source: PageSource,
        request_id: Option<&str>,
    ) -> Result<Vec<PageImage>, MiddlemanError> {
        self.runtime
            .block_on(self.inner.file_to_page_images(path, source, request_id))
    }

    pub fn pdf_to_page_images(
        &self,
        path: impl AsRef<Path>,
        request_id: Option<&str>,
    ) -> Result<Vec<PageImage>, MiddlemanError> {
        self.file_to_page_images(path, PageSource::Pdf, request_id)
    }

    pub fn pptx_to_page_images(
        &self,
        path: impl AsRef<Path>,
        request_id: Option<&str>,
    ) -> Result<Vec<PageImage>, MiddlemanError> {
        self.file_to_page_images(path, PageSource::Pptx, request_id)
    }

    pub fn docx_to_page_images(
        &self,
        path: impl AsRef<Path>,
        request_id: Option<&str>,
    ) -> Result<Vec<PageImage>, MiddlemanError> {
        self.file_to_page_images(path, PageSource::Docx, request_id)
    }

    pub fn json_to_pptx_analyze(
        &self,
        pptx_template_id: &str,
    ) -> Result<Vec<TemplateSlide>, MiddlemanError> {
        self.runtime
            .block_on(self.inner.json_to_pptx_analyze(pptx_template_id))
    }

    pub fn json_to_pptx_execute(
        &self,
        pptx_template_id: &str,
        presentation: &Presentation,
    ) -> Result<String, MiddlemanError> {
        self.runtime
            .block_on(self.inner.json_to_pptx_execute(pptx_template_id, presentation))
    }

    pub fn list_tools(&self) -> Result<Vec<serde_json::Value>, MiddlemanError> {
        self.runtime.block_on(self.inner.list_tools())
    }
}
