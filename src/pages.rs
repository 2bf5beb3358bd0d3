//! Resolving link anchors against the generated HTML pages.
//!
//! Every link in a fragment is relative to the `html/search/` directory and
//! points at a page plus an optional `#anchor`. A link is broken when the
//! page does not exist or does not define the anchor as an `id` or `name`.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use thiserror::Error;

use crate::index::{Finding, FindingKind, SearchIndex};

static ANCHOR_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)(?:id|name)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid anchor regex")
});

/// Directory fragment URLs are relative to, inside the HTML root.
const SEARCH_DIR: &str = "search";

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to read page {page}: {source}")]
    Io {
        page: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetching {page} returned {status}")]
    Status { page: String, status: StatusCode },
}

/// A link URL resolved against the HTML root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorRef {
    /// A page inside the documentation site.
    Page { page: String, anchor: Option<String> },
    /// A link with a scheme or an absolute path; not checked.
    External,
    /// A link to a directory or to the current page (`../`, `#x`); not checked.
    NotAPage,
    /// Relative path that climbs above the HTML root.
    OutsideRoot,
}

impl AnchorRef {
    pub fn parse(url: &str) -> Self {
        if url.contains("://") || url.starts_with('/') || url.starts_with("mailto:") {
            return Self::External;
        }

        let (path, anchor) = match url.split_once('#') {
            Some((path, anchor)) => (path, Some(anchor.to_string()).filter(|a| !a.is_empty())),
            None => (url, None),
        };

        let last = path.rsplit('/').next().unwrap_or_default();
        if matches!(last, "" | "." | "..") {
            return Self::NotAPage;
        }

        let mut segments = vec![SEARCH_DIR];
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Self::OutsideRoot;
                    }
                }
                other => segments.push(other),
            }
        }

        Self::Page {
            page: segments.join("/"),
            anchor,
        }
    }
}

/// Collect every `id` and `name` attribute value of a page.
pub fn extract_anchors(html: &str) -> HashSet<String> {
    ANCHOR_ATTR
        .captures_iter(html)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Where HTML pages are read from.
pub trait PageSource {
    /// Fetch a page by its path relative to the HTML root. `Ok(None)` means
    /// the page does not exist.
    fn fetch(&self, page: &str) -> impl Future<Output = Result<Option<String>, PageError>> + Send;
}

/// Pages of a local `html/` directory.
#[derive(Debug, Clone)]
pub struct DirPages {
    root: PathBuf,
}

impl DirPages {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PageSource for DirPages {
    async fn fetch(&self, page: &str) -> Result<Option<String>, PageError> {
        let path = self.root.join(page);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PageError::Io {
                page: page.to_string(),
                source,
            }),
        }
    }
}

/// Pages of a published documentation site.
#[derive(Debug, Clone)]
pub struct HttpPages {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPages {
    /// `base_url` is the URL of the HTML root (the directory holding `search/`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

impl PageSource for HttpPages {
    async fn fetch(&self, page: &str) -> Result<Option<String>, PageError> {
        let url = format!("{}/{}", self.base_url, page);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PageError::Status {
                page: page.to_string(),
                status,
            });
        }
        Ok(Some(response.text().await?))
    }
}

/// What fetching a page produced, cached per check run.
enum Fetched {
    Anchors(HashSet<String>),
    Missing,
    Failed(String),
}

/// Check every in-site link of the index against the pages it points at.
///
/// Links flagged as external (`local == 0`), links with a scheme and links
/// that name no page are skipped. Each page is fetched at most once; a page
/// that cannot be fetched is reported on every link to it.
pub async fn check_anchors<S: PageSource>(index: &SearchIndex, source: &S) -> Vec<Finding> {
    let mut pages: HashMap<String, Fetched> = HashMap::new();
    let mut findings = Vec::new();

    for (name, entries) in index.fragments() {
        for entry in entries {
            for link in entry.symbols.iter().flat_map(|s| s.links.iter()) {
                if link.local == 0 {
                    continue;
                }
                let (page, anchor) = match AnchorRef::parse(&link.anchor_url) {
                    AnchorRef::Page { page, anchor } => (page, anchor),
                    AnchorRef::External | AnchorRef::NotAPage => continue,
                    AnchorRef::OutsideRoot => {
                        findings.push(Finding::new(
                            FindingKind::MissingPage,
                            *name,
                            Some(&entry.key),
                            format!("`{}` points outside the HTML root", link.anchor_url),
                        ));
                        continue;
                    }
                };

                if !pages.contains_key(&page) {
                    let fetched = match source.fetch(&page).await {
                        Ok(Some(html)) => Fetched::Anchors(extract_anchors(&html)),
                        Ok(None) => Fetched::Missing,
                        Err(e) => {
                            tracing::warn!("Could not fetch {}: {}", page, e);
                            Fetched::Failed(e.to_string())
                        }
                    };
                    tracing::debug!("Fetched {}", page);
                    pages.insert(page.clone(), fetched);
                }

                match (pages.get(&page), anchor) {
                    (Some(Fetched::Missing) | None, _) => findings.push(Finding::new(
                        FindingKind::MissingPage,
                        *name,
                        Some(&entry.key),
                        format!("page `{}` does not exist", page),
                    )),
                    (Some(Fetched::Failed(error)), _) => findings.push(Finding::new(
                        FindingKind::MissingPage,
                        *name,
                        Some(&entry.key),
                        format!("page `{}` could not be fetched: {}", page, error),
                    )),
                    (Some(Fetched::Anchors(anchors)), Some(anchor)) if !anchors.contains(&anchor) => {
                        findings.push(Finding::new(
                            FindingKind::MissingAnchor,
                            *name,
                            Some(&entry.key),
                            format!("`{}` has no anchor `{}`", page, anchor),
                        ))
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!("Checked anchors against {} page(s)", pages.len());
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_relative_to_search_dir() {
        assert_eq!(
            AnchorRef::parse("../class_scene.html#afe2698f88befb0208a947ef771ef5d16"),
            AnchorRef::Page {
                page: "class_scene.html".to_string(),
                anchor: Some("afe2698f88befb0208a947ef771ef5d16".to_string()),
            }
        );
        assert_eq!(
            AnchorRef::parse("../main_8cpp.html"),
            AnchorRef::Page {
                page: "main_8cpp.html".to_string(),
                anchor: None,
            }
        );
        assert_eq!(
            AnchorRef::parse("nomatches.html#"),
            AnchorRef::Page {
                page: "search/nomatches.html".to_string(),
                anchor: None,
            }
        );
    }

    #[test]
    fn test_external_and_outside() {
        assert_eq!(
            AnchorRef::parse("https://en.cppreference.com/w/cpp/container/list"),
            AnchorRef::External
        );
        assert_eq!(AnchorRef::parse("../../other.html"), AnchorRef::OutsideRoot);
    }

    #[test]
    fn test_directory_links_are_not_pages() {
        assert_eq!(AnchorRef::parse("../"), AnchorRef::NotAPage);
        assert_eq!(AnchorRef::parse("../#x"), AnchorRef::NotAPage);
        assert_eq!(AnchorRef::parse("#x"), AnchorRef::NotAPage);
        assert_eq!(AnchorRef::parse(".."), AnchorRef::NotAPage);
    }

    #[test]
    fn test_extract_anchors() {
        let html = r#"<a id="afe2698f88befb0208a947ef771ef5d16"></a>
<a class="anchor" name='a89161e526c90144cae9c786ed0ab6678'></a>
<div ID="details"><h2 class="groupheader">Detailed Description</h2></div>"#;
        let anchors = extract_anchors(html);
        assert!(anchors.contains("afe2698f88befb0208a947ef771ef5d16"));
        assert!(anchors.contains("a89161e526c90144cae9c786ed0ab6678"));
        assert!(anchors.contains("details"));
        assert!(!anchors.contains("groupheader"));
    }

    #[test]
    fn test_data_attributes_are_not_anchors() {
        let html = r#"<div data-id="a1" data-name='a2'><a id="a3"></a></div>"#;
        let anchors = extract_anchors(html);
        assert_eq!(anchors, HashSet::from(["a3".to_string()]));
    }
}
