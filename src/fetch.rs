use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Site chrome that repeats on every page and would pollute text and links.
static CHROME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script, style, nav, footer, header, aside, noscript").unwrap()
});
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// One anchor on a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Absolute URL, resolved against the page URL.
    pub href: String,
    /// The attribute value as written in the markup.
    pub raw_href: String,
    pub text: String,
}

/// Single-request HTTP fetcher. Every failure is logged and reported as `None`.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Option<Page> {
        match self.fetch_html(url).await {
            Ok((final_url, body)) => {
                debug!(url, bytes = body.len(), "Fetched page");
                Some(Page::parse(final_url, &body))
            }
            Err(e) => {
                warn!(url, error = %format!("{:#}", e), "Fetch failed");
                None
            }
        }
    }

    async fn fetch_html(&self, url: &str) -> Result<(Url, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {}", status);
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;
        Ok((final_url, body))
    }
}

/// A parsed page with site chrome already removed.
pub struct Page {
    url: Url,
    document: Html,
}

impl Page {
    pub fn parse(url: Url, html: &str) -> Self {
        let mut document = Html::parse_document(html);
        strip_chrome(&mut document);
        Self { url, document }
    }

    /// URL the page was served from, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Every `<a href>` still attached to the document, in document order.
    pub fn anchors(&self) -> Vec<Anchor> {
        // Detached chrome stays in the tree's storage; `Html::select` would
        // still visit it.
        self.document
            .root_element()
            .select(&ANCHOR_SELECTOR)
            .filter_map(|a| {
                let raw = a.value().attr("href")?.trim();
                if raw.is_empty() {
                    return None;
                }
                let href = self
                    .url
                    .join(raw)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| raw.to_string());
                let text = a
                    .text()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(Anchor {
                    href,
                    raw_href: raw.to_string(),
                    text,
                })
            })
            .collect()
    }

    /// Visible text nodes, trimmed, one per line.
    pub fn text(&self) -> String {
        self.document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn strip_chrome(document: &mut Html) {
    let ids: Vec<_> = document.select(&CHROME_SELECTOR).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html><head><title>WIC</title><style>p{}</style></head>
<body>
  <header><a href="/home">Home</a></header>
  <nav><a href="/menu">Public Health Menu</a></nav>
  <main>
    <h1>WIC Program</h1>
    <p>Call   us today.</p>
    <a href="apply.html"> Apply <b>now</b> </a>
    <a href="https://other.org/x">Elsewhere</a>
    <a href="">Empty</a>
    <script>var tracking = 1;</script>
    <noscript>Enable JavaScript</noscript>
  </main>
  <aside>Related links</aside>
  <footer>Copyright County</footer>
</body></html>"#;

    fn page() -> Page {
        Page::parse(Url::parse("https://county.gov/health/wic/").unwrap(), HTML)
    }

    #[test]
    fn chrome_is_removed_from_text() {
        let text = page().text();
        assert!(text.contains("WIC Program"));
        assert!(text.contains("Call   us today."));
        for gone in ["Home", "Public Health Menu", "tracking", "Enable JavaScript", "Related links", "Copyright"] {
            assert!(!text.contains(gone), "{gone} leaked into text");
        }
    }

    #[test]
    fn anchors_are_resolved_and_chrome_anchors_dropped() {
        let anchors = page().anchors();
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].href, "https://county.gov/health/wic/apply.html");
        assert_eq!(anchors[0].raw_href, "apply.html");
        assert_eq!(anchors[0].text, "Apply now");
        assert_eq!(anchors[1].href, "https://other.org/x");
    }

    #[test]
    fn chrome_links_never_reach_scoring() {
        use crate::discovery::scoring::{choose_best_link, NavLevel};

        let html = r#"<html><body>
            <nav><a href="/public-health">Public Health Department</a></nav>
            <main><a href="/contact">Contact Us</a></main>
            <footer><a href="/health">Health Services</a></footer>
            <aside><a href="/docs/report.pdf">Annual Report (PDF)</a></aside>
        </body></html>"#;
        let p = Page::parse(Url::parse("https://c.gov/").unwrap(), html);
        let anchors = p.anchors();
        let hrefs: Vec<&str> = anchors.iter().map(|a| a.href.as_str()).collect();
        assert_eq!(hrefs, vec!["https://c.gov/contact"]);
        assert!(choose_best_link(&anchors, "https://c.gov/", NavLevel::Department).is_none());
    }

    #[test]
    fn malformed_html_is_tolerated() {
        let p = Page::parse(
            Url::parse("https://county.gov/").unwrap(),
            "<div><p>Unclosed <a href='/wic'>WIC",
        );
        assert_eq!(p.anchors().len(), 1);
        assert!(p.text().contains("Unclosed"));
    }
}
