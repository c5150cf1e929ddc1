//! HAR entry model.
//!
//! Every field defaults when absent and string fields accept `null`, so
//! archives written by different browsers decode without a schema check.
//! Unknown fields are ignored here; the raw entry JSON is kept separately by
//! the ingestor for verbatim export.

use std::borrow::Cow;

use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub secure: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub http_only: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub http_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Vec<Header>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub post_data: Option<PostData>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub encoding: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub http_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Vec<Header>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cookies: Vec<Cookie>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Content,
}

/// Phase timings in milliseconds. `-1` means "not applicable" in HAR.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocked: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dns: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub connect: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub send: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wait: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub receive: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ssl: f64,
}

/// One recorded HTTP transaction. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub started_date_time: String,
    /// Total duration in milliseconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub request: Request,
    #[serde(default, deserialize_with = "null_as_default")]
    pub response: Response,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timings: Timings,
    /// Chrome's resource type hint (`image`, `script`, `xhr`, ...).
    #[serde(
        rename = "_resourceType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_type: Option<String>,
}

/// Host, path and query of a request URL. All empty when the URL does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlParts {
    pub scheme: String,
    /// Host with any port as written, e.g. `localhost:8080` or `a.com:443`.
    pub host: String,
    pub path: String,
    pub query: String,
}

impl UrlParts {
    pub fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw).ok()?;
        // The authority as written, so an explicit default port stays part
        // of the host.
        let host = match authority(raw) {
            Some(written) => written.to_string(),
            None => url.host_str().unwrap_or_default().to_string(),
        };
        Some(Self {
            scheme: url.scheme().to_string(),
            host,
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
        })
    }
}

/// `host[:port]` of an absolute URL, without user info.
fn authority(raw: &str) -> Option<&str> {
    let (_, rest) = raw.trim().split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    Some(authority.rsplit_once('@').map_or(authority, |(_, host)| host))
}

/// Best-effort path of a URL that did not parse: relative references and
/// empty strings included.
pub fn lenient_path(raw: &str) -> &str {
    let raw = raw.trim();
    let raw = &raw[..raw.find(['?', '#']).unwrap_or(raw.len())];
    match raw.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |slash| &rest[slash..]),
        None => raw,
    }
}

impl Entry {
    pub fn url_parts(&self) -> Option<UrlParts> {
        UrlParts::parse(&self.request.url)
    }

    /// First request header with the given name, compared case-insensitively.
    pub fn request_header(&self, name: &str) -> Option<&str> {
        find_header(&self.request.headers, name)
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        find_header(&self.response.headers, name)
    }

    /// Status 0 means the request was aborted or blocked before a response.
    pub fn is_error(&self) -> bool {
        self.response.status >= 400 || self.response.status == 0
    }

    /// Response body with base64 transfer encoding undone where possible.
    pub fn response_text(&self) -> Cow<'_, str> {
        let content = &self.response.content;
        if content.encoding == "base64" && !content.text.is_empty() {
            if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(&content.text) {
                return Cow::Owned(String::from_utf8_lossy(&bytes).into_owned());
            }
        }
        Cow::Borrowed(&content.text)
    }
}

fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::{lenient_path, Entry, UrlParts};

    #[test]
    fn missing_and_null_fields_default() {
        let entry: Entry = serde_json::from_str(
            r#"{"request":{"method":"GET","url":"https://a.com/","headers":null},
                "response":{"status":200,"content":{"mimeType":null}},
                "time":12.5,"extra":{"ignored":true}}"#,
        )
        .unwrap();
        assert_eq!(entry.request.method, "GET");
        assert!(entry.request.headers.is_empty());
        assert_eq!(entry.response.content.mime_type, "");
        assert_eq!(entry.time, 12.5);
        assert_eq!(entry.resource_type, None);
    }

    #[test]
    fn url_parts_keep_explicit_port() {
        let parts = UrlParts::parse("http://localhost:8080/api/v1?x=1").unwrap();
        assert_eq!(parts.host, "localhost:8080");
        assert_eq!(parts.path, "/api/v1");
        assert_eq!(parts.query, "x=1");
        assert!(UrlParts::parse("not a url").is_none());

        let parts = UrlParts::parse("https://user:pw@a.com:443/x").unwrap();
        assert_eq!(parts.host, "a.com:443");
        assert_eq!(UrlParts::parse("https://a.com/x").unwrap().host, "a.com");
    }

    #[test]
    fn lenient_path_of_unparseable_urls() {
        assert_eq!(lenient_path(""), "");
        assert_eq!(lenient_path("/api/users?x=1#top"), "/api/users");
        assert_eq!(lenient_path("http://exa mple.com/a/b?q"), "/a/b");
        assert_eq!(lenient_path("http://exa mple.com"), "");
    }

    #[test]
    fn base64_body_is_decoded() {
        let mut entry = Entry::default();
        entry.response.content.text = "aGVsbG8gd29ybGQ=".to_string();
        entry.response.content.encoding = "base64".to_string();
        assert_eq!(entry.response_text(), "hello world");

        entry.response.content.text = "%%%not base64".to_string();
        assert_eq!(entry.response_text(), "%%%not base64");
    }
}
