//! Request and response models for the Middleman.ai API.
//!
//! Response envelopes are decoded with `serde_json::from_value`, so a missing
//! or wrongly-typed field is rejected rather than defaulted. Unknown fields
//! are ignored; the service is free to add to its payloads.

use crate::error::MiddlemanError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ── Presentation (template execution payload) ────────────────────────────

/// A named content slot inside a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub name: String,
    pub content: String,
}

impl Placeholder {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// One slide of a [`Presentation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// Slide layout type as reported by template analysis.
    #[serde(rename = "type")]
    pub slide_type: String,
    /// A slide with nothing to fill may omit this.
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
}

impl Slide {
    pub fn new(slide_type: impl Into<String>, placeholders: Vec<Placeholder>) -> Self {
        Self {
            slide_type: slide_type.into(),
            placeholders,
        }
    }

    /// Placeholder names must be unique within a slide.
    pub fn validate(&self) -> Result<(), MiddlemanError> {
        let mut seen = HashSet::new();
        for p in &self.placeholders {
            if !seen.insert(p.name.as_str()) {
                return Err(MiddlemanError::validation(format!(
                    "Duplicate placeholder '{}' in slide of type '{}'",
                    p.name, self.slide_type
                )));
            }
        }
        Ok(())
    }
}

/// Full payload for template execution. Slide order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self { slides }
    }

    /// Validate every slide; the first problem found is returned.
    pub fn validate(&self) -> Result<(), MiddlemanError> {
        self.slides.iter().try_for_each(Slide::validate)
    }

    /// Parse a presentation from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, MiddlemanError> {
        serde_json::from_str(json)
            .map_err(|e| MiddlemanError::validation(format!("Invalid presentation JSON: {e}")))
    }
}

// ── Request bodies ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct MdToPdfRequest<'a> {
    pub markdown: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_template_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MdToDocxRequest<'a> {
    pub markdown: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docx_template_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MdToPptxRequest<'a> {
    pub markdown: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TemplateAnalyzeRequest<'a> {
    pub pptx_template_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TemplateExecuteRequest<'a> {
    pub pptx_template_id: &'a str,
    pub presentation: &'a Presentation,
}

// ── Response envelopes ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MdToPdfResponse {
    pub pdf_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MdToDocxResponse {
    pub docx_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MdToPptxResponse {
    pub pptx_url: String,
}

/// One rendered page (or slide) image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page_no: u32,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageImagesResponse {
    pub pages: Vec<PageImage>,
}

/// A placeholder slot discovered by template analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TemplatePlaceholderRepr")]
pub struct TemplatePlaceholder {
    pub name: String,
    /// Sample content from the template, when the service reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Older analysis payloads list placeholders as bare strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum TemplatePlaceholderRepr {
    Name(String),
    Object {
        name: String,
        #[serde(default)]
        content: Option<String>,
    },
}

impl From<TemplatePlaceholderRepr> for TemplatePlaceholder {
    fn from(repr: TemplatePlaceholderRepr) -> Self {
        match repr {
            TemplatePlaceholderRepr::Name(name) => Self {
                name,
                content: None,
            },
            TemplatePlaceholderRepr::Object { name, content } => Self { name, content },
        }
    }
}

/// One slide layout of an analysed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSlide {
    #[serde(rename = "type", alias = "title")]
    pub slide_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub placeholders: Vec<TemplatePlaceholder>,
}

impl TemplateSlide {
    pub fn placeholder_names(&self) -> Vec<&str> {
        self.placeholders.iter().map(|p| p.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateAnalyzeResponse {
    pub slides: Vec<TemplateSlide>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateExecuteResponse {
    pub pptx_url: String,
}

/// Decode a JSON payload into a response model, failing closed.
pub(crate) fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, MiddlemanError> {
    serde_json::from_value(value).map_err(|e| {
        MiddlemanError::validation(format!(
            "Unexpected response shape for {}: {e}",
            short_type_name::<T>()
        ))
    })
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
