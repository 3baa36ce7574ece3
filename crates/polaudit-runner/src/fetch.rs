//! HTTP document fetcher with HTML-to-text reduction

use polaudit_domain::{DocumentFetcher, FetchedDocument};
use regex::{Captures, Regex};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use reqwest::StatusCode;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("polaudit/", env!("CARGO_PKG_VERSION"));

/// Elements whose content is never document text
const DROPPED_ELEMENTS: [&str; 10] = [
    "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside", "form",
];

static DROPPED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DROPPED_ELEMENTS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                .expect("element pattern is valid")
        })
        .collect()
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

static MAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*?)</main\s*>").expect("main pattern is valid"));

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(br|/p|/div|/li|/h[1-6]|/tr|/section|/article|/table|/ul|/ol)\b[^>]*>")
        .expect("line break pattern is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("entity pattern is valid")
});

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("space pattern is valid"));

/// `Accept-Language` header for a document language
pub fn accept_language(lang: Option<&str>) -> &'static str {
    match lang.map(|l| l.trim().to_lowercase()).as_deref() {
        Some(l) if l.starts_with("es") => "es-ES,es;q=0.9,en;q=0.6",
        Some(l) if l.starts_with("hi") => "hi-IN,hi;q=0.9,en;q=0.6",
        Some(l) if l.starts_with("ml") => "ml-IN,ml;q=0.9,en;q=0.6",
        _ => "en-GB,en;q=0.9,es;q=0.6",
    }
}

fn decode_entity(caps: &Captures<'_>) -> String {
    let name = &caps[1];
    let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            "laquo" => Some('«'),
            "raquo" => Some('»'),
            "ndash" => Some('–'),
            "mdash" => Some('—'),
            "hellip" => Some('…'),
            "copy" => Some('©'),
            "reg" => Some('®'),
            "euro" => Some('€'),
            "aacute" => Some('á'),
            "eacute" => Some('é'),
            "iacute" => Some('í'),
            "oacute" => Some('ó'),
            "uacute" => Some('ú'),
            "ntilde" => Some('ñ'),
            "Aacute" => Some('Á'),
            "Eacute" => Some('É'),
            "Iacute" => Some('Í'),
            "Oacute" => Some('Ó'),
            "Uacute" => Some('Ú'),
            "Ntilde" => Some('Ñ'),
            "uuml" => Some('ü'),
            "ordm" => Some('º'),
            "ordf" => Some('ª'),
            "iquest" => Some('¿'),
            "iexcl" => Some('¡'),
            _ => None,
        }
    };
    decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
}

/// Reduce an HTML page to its readable text
///
/// When the page has a `<main>` element with text, only that element is
/// read. Boilerplate elements are dropped, block ends become line breaks,
/// entities are decoded and repeated lines (menus, cookie banners) are kept
/// only once.
pub fn html_to_text(html: &str) -> String {
    let html = COMMENT.replace_all(html, " ");
    if let Some(main) = MAIN.captures(&html) {
        let text = reduce_html(&main[1]);
        if !text.is_empty() {
            return text;
        }
    }
    reduce_html(&html)
}

fn reduce_html(html: &str) -> String {
    let mut text = html.to_string();
    for pattern in DROPPED.iter() {
        text = pattern.replace_all(&text, " ").into_owned();
    }
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, " ");
    let text = ENTITY.replace_all(&text, decode_entity);

    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for line in text.lines() {
        let line = SPACES.replace_all(line, " ");
        let line = line.trim();
        if !line.is_empty() && seen.insert(line.to_string()) {
            lines.push(line.to_string());
        }
    }
    lines.join("\n")
}

/// Static HTTP fetcher
///
/// Tries the URL as given, then over plain `http` when it was `https`. A
/// 403 answer is retried once with a `Referer` pointing at the site root.
/// Only HTML and plain text produce text; any other content type yields an
/// empty document.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    fn get(&self, url: &str, lang: Option<&str>, referer: Option<&str>) -> reqwest::Result<Response> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, accept_language(lang));
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }
        request.send()
    }

    fn fetch_once(&self, url: &str, lang: Option<&str>) -> reqwest::Result<FetchedDocument> {
        let mut response = self.get(url, lang, None)?;
        if response.status() == StatusCode::FORBIDDEN {
            if let Some(root) = site_root(url) {
                debug!(url, "Forbidden, retrying with referer");
                response = self.get(url, lang, Some(&root))?;
            }
        }
        let response = response.error_for_status()?;

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_lowercase())
            .unwrap_or_default();
        let body = response.text()?;

        let text = if mime.contains("html") || (mime.is_empty() && body.trim_start().starts_with('<')) {
            html_to_text(&body)
        } else if mime.starts_with("text/plain") {
            body
        } else {
            debug!(url, mime = %mime, "Unsupported content type");
            String::new()
        };
        Ok(FetchedDocument { text, mime })
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &str, lang: Option<&str>) -> FetchedDocument {
        for candidate in scheme_candidates(url) {
            match self.fetch_once(&candidate, lang) {
                Ok(document) if !document.is_empty() => return document,
                Ok(_) => debug!(url = %candidate, "Fetched document has no text"),
                Err(e) => debug!(url = %candidate, error = %e, "Fetch failed"),
            }
        }
        FetchedDocument::empty()
    }
}

/// `url`, followed by its plain-http variant when it is https
fn scheme_candidates(url: &str) -> Vec<String> {
    let mut candidates = vec![url.to_string()];
    if let Some(rest) = url.strip_prefix("https://") {
        candidates.push(format!("http://{}", rest));
    }
    candidates
}

fn site_root(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(format!("{}://{}/", parsed.scheme(), host))
}
