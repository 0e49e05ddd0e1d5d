//! Request section decoders. Every function here is pure: bytes and headers
//! in, JSON values out.

use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use memchr::memmem;
use serde_json::{Map, Value};

use super::{DispatchError, DispatchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Multipart { boundary: String },
    Other,
}

impl BodyKind {
    fn label(&self) -> &'static str {
        match self {
            BodyKind::Json => "application/json",
            BodyKind::Form => "application/x-www-form-urlencoded",
            BodyKind::Multipart { .. } => "multipart/form-data",
            BodyKind::Other => "unknown",
        }
    }
}

/// Classifies a `Content-Type` value. Parameters other than the multipart
/// boundary are ignored; `+json` suffixes count as JSON.
pub fn body_kind(content_type: Option<&str>) -> BodyKind {
    let Some(content_type) = content_type else {
        return BodyKind::Other;
    };
    let mut parts = content_type.split(';');
    let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();

    match essence.as_str() {
        "application/json" => BodyKind::Json,
        "application/x-www-form-urlencoded" => BodyKind::Form,
        "multipart/form-data" => {
            let boundary = parts.find_map(|param| {
                let (key, value) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("boundary")
                    .then(|| value.trim().trim_matches('"').to_string())
            });
            match boundary {
                Some(boundary) if !boundary.is_empty() => BodyKind::Multipart { boundary },
                _ => BodyKind::Other,
            }
        }
        other if other.starts_with("application/") && other.ends_with("+json") => BodyKind::Json,
        _ => BodyKind::Other,
    }
}

/// Header names (lowercase, as `http` stores them) to string values.
/// Repeated headers are joined with `, `.
pub fn decode_headers(headers: &HeaderMap) -> Map<String, Value> {
    let mut out = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        out.insert(name.as_str().to_string(), Value::String(joined));
    }
    out
}

/// Flat query map; when a key repeats the last value wins.
pub fn decode_query(query: Option<&str>) -> Map<String, Value> {
    let mut out = Map::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            out.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }
    out
}

/// Decodes `body` by content type. Unknown or absent content types, and an
/// empty body, decode to an empty object.
pub fn decode_body(headers: &HeaderMap, body: &Bytes) -> DispatchResult<Value> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let kind = body_kind(content_type);

    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    match &kind {
        BodyKind::Json => serde_json::from_slice(body).map_err(|err| DispatchError::MalformedBody {
            content_type: kind.label(),
            reason: err.to_string(),
        }),
        BodyKind::Form => Ok(Value::Object(collapse(
            url::form_urlencoded::parse(body)
                .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned()))),
        ))),
        BodyKind::Multipart { boundary } => decode_multipart(body, boundary)
            .map(|fields| Value::Object(collapse(fields)))
            .map_err(|reason| DispatchError::MalformedBody {
                content_type: kind.label(),
                reason,
            }),
        BodyKind::Other => Ok(Value::Object(Map::new())),
    }
}

/// Single occurrences stay scalar; a repeated key becomes an array of every
/// value in arrival order.
fn collapse(pairs: impl IntoIterator<Item = (String, Value)>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in pairs {
        match out.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                out.insert(key, value);
            }
        }
    }
    out
}

fn decode_multipart(body: &[u8], boundary: &str) -> Result<Vec<(String, Value)>, String> {
    let delimiter = format!("--{boundary}");
    let finder = memmem::Finder::new(delimiter.as_bytes());

    let mut cursor = finder
        .find(body)
        .ok_or_else(|| "opening boundary not found".to_string())?
        + delimiter.len();
    let mut fields = Vec::new();

    loop {
        let rest = &body[cursor..];
        if rest.starts_with(b"--") {
            return Ok(fields);
        }
        let rest = strip_line_break(rest).ok_or_else(|| "boundary not followed by CRLF".to_string())?;
        let start = body.len() - rest.len();

        let Some(length) = finder.find(rest) else {
            return Err("closing boundary not found".to_string());
        };
        let part = trim_trailing_line_break(&rest[..length]);
        if let Some(field) = decode_part(part)? {
            fields.push(field);
        }
        cursor = start + length + delimiter.len();
    }
}

fn decode_part(part: &[u8]) -> Result<Option<(String, Value)>, String> {
    let (head, content) = match memmem::find(part, b"\r\n\r\n") {
        Some(split) => (&part[..split], &part[split + 4..]),
        None => match memmem::find(part, b"\n\n") {
            Some(split) => (&part[..split], &part[split + 2..]),
            None => return Err("part headers not terminated".to_string()),
        },
    };
    let head = String::from_utf8_lossy(head);

    let mut name = None;
    let mut filename = None;
    let mut content_type = None;
    for line in head.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').skip(1) {
                if let Some((k, v)) = param.split_once('=') {
                    let v = v.trim().trim_matches('"').to_string();
                    match k.trim().to_ascii_lowercase().as_str() {
                        "name" => name = Some(v),
                        "filename" => filename = Some(v),
                        _ => {}
                    }
                }
            }
        } else if key.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    let Some(name) = name else {
        return Ok(None);
    };

    let value = match filename {
        Some(filename) => serde_json::json!({
            "filename": filename,
            "contentType": content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
            "size": content.len(),
        }),
        None => Value::String(String::from_utf8_lossy(content).into_owned()),
    };
    Ok(Some((name, value)))
}

fn strip_line_break(input: &[u8]) -> Option<&[u8]> {
    input
        .strip_prefix(b"\r\n")
        .or_else(|| input.strip_prefix(b"\n"))
}

fn trim_trailing_line_break(input: &[u8]) -> &[u8] {
    input
        .strip_suffix(b"\r\n")
        .or_else(|| input.strip_suffix(b"\n"))
        .unwrap_or(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn classifies_content_types() {
        assert_eq!(body_kind(Some("application/json; charset=utf-8")), BodyKind::Json);
        assert_eq!(body_kind(Some("application/problem+json")), BodyKind::Json);
        assert_eq!(
            body_kind(Some("application/x-www-form-urlencoded")),
            BodyKind::Form
        );
        assert_eq!(
            body_kind(Some("multipart/form-data; boundary=\"xyz\"")),
            BodyKind::Multipart {
                boundary: "xyz".to_string()
            }
        );
        assert_eq!(body_kind(Some("multipart/form-data")), BodyKind::Other);
        assert_eq!(body_kind(Some("text/plain")), BodyKind::Other);
        assert_eq!(body_kind(None), BodyKind::Other);
    }

    #[test]
    fn query_keeps_last_value() {
        let query = decode_query(Some("a=1&b=two%20words&a=3"));
        assert_eq!(query.get("a"), Some(&json!("3")));
        assert_eq!(query.get("b"), Some(&json!("two words")));
        assert!(decode_query(None).is_empty());
    }

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        let decoded = decode_headers(&headers);
        assert_eq!(decoded.get("x-tag"), Some(&json!("a, b")));
    }

    #[test]
    fn form_body_collapses_repeats_into_arrays() {
        let body = Bytes::from_static(b"name=ann&tag=x&tag=y&tag=z");
        let value = decode_body(&headers_with("application/x-www-form-urlencoded"), &body).unwrap();
        assert_eq!(value, json!({"name": "ann", "tag": ["x", "y", "z"]}));
    }

    #[test]
    fn malformed_json_is_a_client_error() {
        let body = Bytes::from_static(b"{\"username\":");
        let err = decode_body(&headers_with("application/json"), &body).unwrap_err();
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_content_type_yields_empty_object() {
        let body = Bytes::from_static(b"hello");
        let value = decode_body(&headers_with("text/plain"), &body).unwrap();
        assert_eq!(value, json!({}));
        let value = decode_body(&HeaderMap::new(), &body).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn multipart_fields_and_files() {
        let body = Bytes::from_static(
            b"--b0\r\n\
Content-Disposition: form-data; name=\"title\"\r\n\r\n\
hello\r\n\
--b0\r\n\
Content-Disposition: form-data; name=\"tag\"\r\n\r\n\
one\r\n\
--b0\r\n\
Content-Disposition: form-data; name=\"tag\"\r\n\r\n\
two\r\n\
--b0\r\n\
Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
Content-Type: text/plain\r\n\r\n\
abcd\r\n\
--b0--\r\n",
        );
        let value = decode_body(&headers_with("multipart/form-data; boundary=b0"), &body).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "hello",
                "tag": ["one", "two"],
                "upload": {"filename": "a.txt", "contentType": "text/plain", "size": 4},
            })
        );
    }

    #[test]
    fn multipart_without_closing_boundary_is_rejected() {
        let body = Bytes::from_static(
            b"--b0\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhello\r\n",
        );
        let err = decode_body(&headers_with("multipart/form-data; boundary=b0"), &body).unwrap_err();
        assert!(matches!(err, DispatchError::MalformedBody { .. }));
    }
}
