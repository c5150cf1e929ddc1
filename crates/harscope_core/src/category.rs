//! Request classification.
//!
//! Both the category cascade and the CORS-failure heuristic are ordered rule
//! tables: the first rule that produces a verdict wins, so the order of the
//! tables below is part of the output contract.

use std::fmt;
use std::str::FromStr;

use crate::entry::{lenient_path, Entry, UrlParts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Fetch,
    Doc,
    Css,
    Js,
    Img,
    Media,
    Manifest,
    Cors,
    Ws,
    Wasm,
    Other,
}

impl Category {
    /// Every category in filter-bar order.
    pub const ALL: [Category; 11] = [
        Category::Fetch,
        Category::Doc,
        Category::Css,
        Category::Js,
        Category::Img,
        Category::Media,
        Category::Manifest,
        Category::Cors,
        Category::Ws,
        Category::Wasm,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Fetch => "fetch",
            Category::Doc => "doc",
            Category::Css => "css",
            Category::Js => "js",
            Category::Img => "img",
            Category::Media => "media",
            Category::Manifest => "manifest",
            Category::Cors => "cors",
            Category::Ws => "ws",
            Category::Wasm => "wasm",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category {0:?}")]
pub struct CategoryParseError(pub String);

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CategoryParseError(s.to_string()))
    }
}

/// Precomputed view of an entry shared by all rules.
pub struct RuleInput<'a> {
    pub entry: &'a Entry,
    /// `None` when the request URL does not parse.
    pub url: Option<UrlParts>,
    /// Lowercased URL path; recovered from the raw string when `url` is `None`.
    pub path: String,
}

impl<'a> RuleInput<'a> {
    pub fn new(entry: &'a Entry) -> Self {
        let url = entry.url_parts();
        let path = match &url {
            Some(parts) => parts.path.to_ascii_lowercase(),
            None => lenient_path(&entry.request.url).to_ascii_lowercase(),
        };
        Self { entry, url, path }
    }
}

pub type CategoryRule = fn(&RuleInput<'_>) -> Option<Category>;

/// The classification cascade, highest priority first.
pub const CATEGORY_RULES: &[(&str, CategoryRule)] = &[
    ("cors_failure", rule_cors_failure),
    ("websocket_scheme", rule_websocket_scheme),
    ("resource_type_hint", rule_resource_type),
    ("response_content_type", rule_content_type),
    ("path_extension", rule_extension),
    ("xhr_request_headers", rule_xhr_headers),
    ("path_heuristic", rule_path_heuristic),
];

/// Classifies an entry; falls back to [`Category::Other`].
pub fn classify(entry: &Entry) -> Category {
    let input = RuleInput::new(entry);
    CATEGORY_RULES
        .iter()
        .find_map(|(_, rule)| rule(&input))
        .unwrap_or(Category::Other)
}

fn rule_cors_failure(input: &RuleInput<'_>) -> Option<Category> {
    is_cors_failure(input.entry).then_some(Category::Cors)
}

fn rule_websocket_scheme(input: &RuleInput<'_>) -> Option<Category> {
    let scheme = input.url.as_ref()?.scheme.as_str();
    matches!(scheme, "ws" | "wss").then_some(Category::Ws)
}

const RESOURCE_TYPES: &[(&str, Category)] = &[
    ("image", Category::Img),
    ("stylesheet", Category::Css),
    ("script", Category::Js),
    ("document", Category::Doc),
    ("media", Category::Media),
    ("manifest", Category::Manifest),
    ("websocket", Category::Ws),
    ("fetch", Category::Fetch),
    ("xhr", Category::Fetch),
    ("wasm", Category::Wasm),
];

fn rule_resource_type(input: &RuleInput<'_>) -> Option<Category> {
    let hint = input.entry.resource_type.as_deref()?.to_ascii_lowercase();
    RESOURCE_TYPES
        .iter()
        .find(|(name, _)| *name == hint)
        .map(|(_, category)| *category)
}

const CONTENT_TYPES: &[(&[&str], Category)] = &[
    (&["text/html"], Category::Doc),
    (&["text/css"], Category::Css),
    (&["javascript", "ecmascript"], Category::Js),
    (&["image/"], Category::Img),
    (&["audio/", "video/"], Category::Media),
    (&["application/manifest", "text/cache-manifest"], Category::Manifest),
    (&["application/wasm"], Category::Wasm),
    (&["application/json", "application/xml", "text/xml"], Category::Fetch),
];

fn rule_content_type(input: &RuleInput<'_>) -> Option<Category> {
    // Every Content-Type header is consulted in order; the first one that
    // matches the table decides.
    input
        .entry
        .response
        .headers
        .iter()
        .filter(|header| header.name.eq_ignore_ascii_case("content-type"))
        .find_map(|header| {
            let value = header.value.to_ascii_lowercase();
            CONTENT_TYPES
                .iter()
                .find(|(needles, _)| needles.iter().any(|needle| value.contains(needle)))
                .map(|(_, category)| *category)
        })
}

const EXTENSIONS: &[(&[&str], Category)] = &[
    (&[".html", ".htm"], Category::Doc),
    (&[".css"], Category::Css),
    (&[".js", ".mjs"], Category::Js),
    (
        &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico"],
        Category::Img,
    ),
    (
        &[".mp4", ".webm", ".ogg", ".mp3", ".wav", ".flac"],
        Category::Media,
    ),
    (&[".wasm"], Category::Wasm),
    (&[".manifest", ".webmanifest"], Category::Manifest),
];

fn rule_extension(input: &RuleInput<'_>) -> Option<Category> {
    EXTENSIONS
        .iter()
        .find(|(suffixes, _)| suffixes.iter().any(|suffix| input.path.ends_with(suffix)))
        .map(|(_, category)| *category)
}

fn rule_xhr_headers(input: &RuleInput<'_>) -> Option<Category> {
    let is_fetch = input.entry.request.headers.iter().any(|header| {
        let value = header.value.to_ascii_lowercase();
        (header.name.eq_ignore_ascii_case("x-requested-with") && value == "xmlhttprequest")
            || (header.name.eq_ignore_ascii_case("accept")
                && (value.contains("application/json") || value.contains("application/xml")))
    });
    is_fetch.then_some(Category::Fetch)
}

fn rule_path_heuristic(input: &RuleInput<'_>) -> Option<Category> {
    let path = input.path.as_str();
    if path.is_empty() || path == "/" {
        return Some(Category::Doc);
    }
    ["/api/", "/rest/", "/graphql"]
        .iter()
        .any(|marker| path.contains(marker))
        .then_some(Category::Fetch)
}

pub type CorsRule = fn(&Entry, &str) -> Option<bool>;

/// The CORS-failure cascade. Each rule sees the uppercased method and either
/// decides (`Some`) or defers to the next rule.
pub const CORS_RULES: &[(&str, CorsRule)] = &[
    ("failed_preflight", cors_failed_preflight),
    ("origin_header", cors_origin_header),
    ("sec_fetch_mode", cors_sec_fetch_mode),
    ("cross_origin_json_get", cors_cross_origin_json_get),
];

/// Heuristic for requests the browser blocked for CORS reasons.
/// Only entries with status 0 qualify.
pub fn is_cors_failure(entry: &Entry) -> bool {
    if entry.response.status != 0 {
        return false;
    }
    let method = entry.request.method.to_ascii_uppercase();
    CORS_RULES
        .iter()
        .find_map(|(_, rule)| rule(entry, &method))
        .unwrap_or(false)
}

fn cors_failed_preflight(entry: &Entry, method: &str) -> Option<bool> {
    if method != "OPTIONS" {
        return None;
    }
    // An OPTIONS request without the preflight header is never a CORS failure.
    Some(entry.request_header("access-control-request-method").is_some())
}

fn cors_origin_header(entry: &Entry, _method: &str) -> Option<bool> {
    entry.request_header("origin").map(|_| true)
}

fn cors_sec_fetch_mode(entry: &Entry, _method: &str) -> Option<bool> {
    let is_cors = entry.request.headers.iter().any(|header| {
        header.name.eq_ignore_ascii_case("sec-fetch-mode") && header.value.eq_ignore_ascii_case("cors")
    });
    is_cors.then_some(true)
}

fn cors_cross_origin_json_get(entry: &Entry, method: &str) -> Option<bool> {
    if method != "GET" {
        return None;
    }
    let request_host = entry.url_parts()?.host;
    let mut cross_origin = false;
    let mut json_body = false;
    for header in &entry.request.headers {
        if header.name.eq_ignore_ascii_case("referer") {
            if let Some(referer) = UrlParts::parse(&header.value) {
                if !request_host.is_empty()
                    && !referer.host.is_empty()
                    && referer.host != request_host
                {
                    cross_origin = true;
                }
            }
        }
        if header.name.eq_ignore_ascii_case("content-type")
            && header.value.to_ascii_lowercase().contains("application/json")
        {
            json_body = true;
        }
    }
    (cross_origin && json_body).then_some(true)
}
