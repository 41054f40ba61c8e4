//! End-to-end tests against the live Middleman.ai API.
//!
//! They spend real credit, so they are gated behind `E2E_ENABLED` and also
//! need `MIDDLEMAN_API_KEY`. Page-image and template tests additionally need
//! `E2E_PDF` (path to a local PDF) and `E2E_PPTX_TEMPLATE_ID`.
//!
//! Run with:
//!   E2E_ENABLED=1 MIDDLEMAN_API_KEY=... cargo test --test e2e -- --nocapture

use middleman_tools::{ErrorKind, Placeholder, Presentation, Slide, ToolsClient};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Return a live client, or skip the test.
macro_rules! e2e_client_or_skip {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        match ToolsClient::from_env() {
            Ok(c) => c,
            Err(e) => {
                println!("SKIP — {e}");
                return;
            }
        }
    }};
}

/// Read an env var or skip the test.
macro_rules! env_or_skip {
    ($name:expr) => {{
        match std::env::var($name) {
            Ok(v) if !v.trim().is_empty() => v,
            _ => {
                println!("SKIP — {} not set", $name);
                return;
            }
        }
    }};
}

fn assert_download_url(url: &str, ext: &str) {
    assert!(url.starts_with("https://"), "not an https URL: {url}");
    assert!(url.contains(ext), "expected '{ext}' in {url}");
}

// ── Markdown conversion ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_md_to_pdf_live() {
    let client = e2e_client_or_skip!();
    let url = client
        .md_to_pdf("# Sample\nThis is a test.", None)
        .await
        .expect("md_to_pdf");
    println!("pdf: {url}");
    assert_download_url(&url, ".pdf");
}

#[tokio::test]
async fn test_md_to_docx_live() {
    let client = e2e_client_or_skip!();
    let url = client
        .md_to_docx("# Sample\n\n- one\n- two", None)
        .await
        .expect("md_to_docx");
    assert_download_url(&url, ".docx");
}

#[tokio::test]
async fn test_md_to_pptx_live() {
    let client = e2e_client_or_skip!();
    let url = client
        .md_to_pptx("# Deck\n\n---\n\n## Slide two")
        .await
        .expect("md_to_pptx");
    assert_download_url(&url, ".pptx");
}

#[tokio::test]
async fn test_unknown_template_is_an_api_error() {
    let client = e2e_client_or_skip!();
    let err = client
        .md_to_pdf("# x", Some("00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap_err();
    println!("{:?}: {err}", err.kind());
    assert!(matches!(
        err.kind(),
        ErrorKind::NotFound | ErrorKind::Validation | ErrorKind::Api
    ));
}

// ── Page images ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pdf_to_page_images_live() {
    let client = e2e_client_or_skip!();
    let path = PathBuf::from(env_or_skip!("E2E_PDF"));
    let pages = client
        .pdf_to_page_images(&path, None)
        .await
        .expect("pdf_to_page_images");
    assert!(!pages.is_empty());
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.page_no as usize, i + 1, "pages out of order");
    }
}

// ── Templates ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_template_analyze_then_execute_live() {
    let client = e2e_client_or_skip!();
    let template_id = env_or_skip!("E2E_PPTX_TEMPLATE_ID");

    let layouts = client
        .json_to_pptx_analyze(&template_id)
        .await
        .expect("analyze");
    assert!(!layouts.is_empty());

    // Fill the first layout's placeholders with their own names.
    let first = &layouts[0];
    let presentation = Presentation::new(vec![Slide {
        slide_type: first.slide_type.clone(),
        placeholders: first
            .placeholder_names()
            .into_iter()
            .map(|name| Placeholder {
                name: name.to_string(),
                content: name.to_string(),
            })
            .collect(),
    }]);
    let url = client
        .json_to_pptx_execute(&template_id, &presentation)
        .await
        .expect("execute");
    assert_download_url(&url, ".pptx");
}
