//! `extract` and `questions`: run the page agent over a saved HTML file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::RwLock;
use tracing::debug;

use studybuddy_browser::{ExtractionLimits, PageAgent, PageAgentHandle, PageDocument, PdfViewerAgent};
use studybuddy_core::{ExtractedPage, PageContentProvider, PageRequest};

use crate::terminal_output::{note_info, note_warn, numbered};

/// A page loaded from disk.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// HTML file to treat as the open page
    pub html: PathBuf,

    /// Locator to report for the page (defaults to a file:// URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Text to treat as the current selection
    #[arg(long)]
    pub selection: Option<String>,

    /// Treat the file as a standalone PDF viewer rather than a web page
    #[arg(long)]
    pub pdf_viewer: bool,
}

fn default_locator(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

/// Parse the file and start an agent answering for it.
pub async fn spawn_page_agent(args: &PageArgs, limits: ExtractionLimits) -> Result<PageAgentHandle> {
    let html = tokio::fs::read_to_string(&args.html)
        .await
        .with_context(|| format!("Failed to read {}", args.html.display()))?;
    let locator = args.url.clone().unwrap_or_else(|| default_locator(&args.html));
    debug!(locator = %locator, bytes = html.len(), "Loaded page");

    let mut document = PageDocument::parse(locator, &html);
    if let Some(selection) = &args.selection {
        document = document.with_selection(selection.clone());
    }
    if args.pdf_viewer {
        let mut agent = PdfViewerAgent::new(Arc::new(RwLock::new(document)), limits);
        agent.preload().await;
        return Ok(agent.spawn());
    }
    Ok(PageAgent::new(document, limits).spawn())
}

async fn fetch(args: &PageArgs, limits: ExtractionLimits) -> Result<ExtractedPage> {
    let handle = spawn_page_agent(args, limits).await?;
    handle
        .request(PageRequest::GetPageContent)
        .await
        .into_page()
        .context("Page agent did not answer")
}

pub async fn run_extract(args: &PageArgs, limits: ExtractionLimits) -> Result<()> {
    let page = fetch(args, limits).await?;
    note_info(&format!("{} ({})", page.title, page.locator));
    if !page.selection_text.is_empty() {
        note_info(&format!("Selection: {}", page.selection_text));
    }
    println!("{}", page.raw_text);
    Ok(())
}

pub async fn run_questions(args: &PageArgs, limits: ExtractionLimits) -> Result<()> {
    let page = fetch(args, limits).await?;
    if page.questions.is_empty() {
        note_warn("No questions found on this page");
    } else {
        println!("{}", numbered(&page.questions));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn agent_reads_the_file_and_keeps_the_given_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        tokio::fs::write(
            &path,
            "<html><head><title>Osmosis</title></head><body><p>Water moves. Why does water move across membranes?</p></body></html>",
        )
        .await
        .unwrap();

        let args = PageArgs {
            html: path,
            url: Some("https://bio.example/osmosis".into()),
            selection: Some("Water moves".into()),
            pdf_viewer: false,
        };
        let page = fetch(&args, ExtractionLimits::default()).await.unwrap();
        assert_eq!(page.title, "Osmosis");
        assert_eq!(page.locator, "https://bio.example/osmosis");
        assert_eq!(page.selection_text, "Water moves");
        assert_eq!(page.questions, vec!["Why does water move across membranes?"]);
    }

    #[tokio::test(start_paused = true)]
    async fn viewer_mode_reports_no_questions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.pdf.html");
        let body = "Why do enzymes lower activation energy? They stabilize the transition state. ".repeat(3);
        tokio::fs::write(&path, format!("<body><p>{body}</p></body>")).await.unwrap();

        let args = PageArgs {
            html: path,
            url: Some("file:///notes/lecture.pdf".into()),
            selection: None,
            pdf_viewer: true,
        };
        let page = fetch(&args, ExtractionLimits::default()).await.unwrap();
        assert_eq!(page.title, "PDF Document");
        assert!(page.questions.is_empty());
        assert!(page.raw_text.starts_with("Why do enzymes"));
    }

    #[test]
    fn default_locator_is_a_file_url() {
        assert!(default_locator(Path::new("missing.html")).starts_with("file://"));
    }
}
