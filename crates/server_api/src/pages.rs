use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use anyhow::Context;
use async_trait::async_trait;
use shared::domain::PageId;
use tokio::fs;

/// Where flash messages are spliced into HTML pages.
pub const FLASH_MARKER: &str = "<!-- flashes -->";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Page {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            content_type: content_type_for("page.html"),
            body: body.into().into_bytes(),
        }
    }

    pub fn is_html(&self) -> bool {
        self.content_type.starts_with("text/html")
    }

    /// Replaces [`FLASH_MARKER`] with a list of the messages.
    ///
    /// Non-HTML pages and pages without the marker are left untouched.
    pub fn with_flashes(mut self, flashes: &[String]) -> Self {
        if !self.is_html() {
            return self;
        }
        let Ok(text) = std::str::from_utf8(&self.body) else {
            return self;
        };
        if !text.contains(FLASH_MARKER) {
            return self;
        }
        let rendered = text.replace(FLASH_MARKER, &render_flashes(flashes));
        self.body = rendered.into_bytes();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Found(Page),
    NotFound,
}

/// Resolves page identifiers to content.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn lookup(&self, page: &PageId) -> anyhow::Result<PageLookup>;
}

/// Serves files below a root directory, one file per page identifier.
#[derive(Debug, Clone)]
pub struct TemplateDir {
    root: PathBuf,
}

impl TemplateDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps `page` to a file below the root, or `None` if it would escape it.
    fn resolve(&self, page: &PageId) -> Option<PathBuf> {
        let relative = page.as_str().trim_start_matches('/');
        if relative.is_empty() || relative.contains('\\') {
            return None;
        }

        let mut path = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(segment) => path.push(segment),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(path)
    }
}

#[async_trait]
impl PageSource for TemplateDir {
    async fn lookup(&self, page: &PageId) -> anyhow::Result<PageLookup> {
        let Some(path) = self.resolve(page) else {
            return Ok(PageLookup::NotFound);
        };

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(PageLookup::NotFound),
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                return Err(err)
                    .with_context(|| format!("failed to stat page '{}'", path.display()));
            }
            Err(_) => return Ok(PageLookup::NotFound),
        }

        let body = fs::read(&path)
            .await
            .with_context(|| format!("failed to read page '{}'", path.display()))?;
        Ok(PageLookup::Found(Page {
            content_type: content_type_for(page.as_str()),
            body,
        }))
    }
}

/// MIME type guessed from the file extension; text types get a utf-8 charset.
pub fn content_type_for(path: &str) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_string()
    }
}

fn render_flashes(flashes: &[String]) -> String {
    if flashes.is_empty() {
        return String::new();
    }
    let items: String = flashes
        .iter()
        .map(|message| format!("<li>{}</li>", escape_html(message)))
        .collect();
    format!("<ul class=\"flashes\">{items}</ul>")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/pages_tests.rs"]
mod tests;
