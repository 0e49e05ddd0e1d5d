use bitflags::bitflags;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub type Request = http::Request<Bytes>;
pub type Response = http::Response<Bytes>;
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type PathParams = HashMap<String, String>;
pub type ParamOffset = (usize, usize);
pub type CapturedParam = (std::sync::Arc<str>, ParamOffset);

pub const HTTP_METHOD_COUNT: usize = 9;

#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum HttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
    Patch = 4,
    Head = 5,
    Options = 6,
    Connect = 7,
    Trace = 8,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; HTTP_METHOD_COUNT] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Connect,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported http method '{0}'")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnsupportedMethod(s.to_string()))
    }
}

impl TryFrom<&http::Method> for HttpMethod {
    type Error = UnsupportedMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Options => http::Method::OPTIONS,
            HttpMethod::Connect => http::Method::CONNECT,
            HttpMethod::Trace => http::Method::TRACE,
        }
    }
}

bitflags! {
    /// Set of methods declared on one leaf, iterated in `HttpMethod` order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodSet: u16 {
        const GET = 1 << 0;
        const POST = 1 << 1;
        const PUT = 1 << 2;
        const DELETE = 1 << 3;
        const PATCH = 1 << 4;
        const HEAD = 1 << 5;
        const OPTIONS = 1 << 6;
        const CONNECT = 1 << 7;
        const TRACE = 1 << 8;
    }
}

impl MethodSet {
    pub fn of(method: HttpMethod) -> Self {
        Self::from_bits_truncate(1 << (method as u16))
    }

    pub fn contains_method(&self, method: HttpMethod) -> bool {
        self.contains(Self::of(method))
    }

    pub fn methods(&self) -> impl Iterator<Item = HttpMethod> + '_ {
        HttpMethod::ALL
            .into_iter()
            .filter(move |m| self.contains_method(*m))
    }

    /// Comma separated list suitable for `Allow` and
    /// `Access-Control-Allow-Methods`.
    pub fn header_value(&self) -> String {
        self.methods()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<HttpMethod> for MethodSet {
    fn from_iter<I: IntoIterator<Item = HttpMethod>>(iter: I) -> Self {
        iter.into_iter()
            .fold(MethodSet::empty(), |set, m| set | MethodSet::of(m))
    }
}
