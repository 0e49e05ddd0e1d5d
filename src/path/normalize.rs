use crate::types::ParamOffset;
use smallvec::SmallVec;
use std::borrow::Cow;

type SegmentSpans = SmallVec<[(usize, usize); 8]>;

/// Request path reduced to the form both matchers consume: every segment is
/// preceded by exactly one `/`, empty segments are dropped and the root path
/// is the empty string.
///
/// Case-insensitive paths also carry an ASCII-lowercased copy. Matching runs
/// on that copy while captured values are sliced from the original text;
/// both share byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    text: String,
    folded: Option<String>,
    segments: SegmentSpans,
}

impl NormalizedPath {
    /// Text literal segments are compared against.
    pub fn as_str(&self) -> &str {
        self.folded.as_deref().unwrap_or(&self.text)
    }

    /// Normalized text with the request's original casing.
    pub fn original(&self) -> &str {
        &self.text
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments
            .get(index)
            .map(|&(start, end)| &self.as_str()[start..end])
    }

    #[inline]
    pub fn span(&self, index: usize) -> Option<ParamOffset> {
        self.segments
            .get(index)
            .map(|&(start, end)| (start, end - start))
    }

    /// Offset and length of everything from segment `index` to the end,
    /// separators included. Empty when `index` is past the last segment.
    #[inline]
    pub fn remainder(&self, index: usize) -> ParamOffset {
        match self.segments.get(index) {
            Some(&(start, _)) => (start, self.text.len() - start),
            None => (self.text.len(), 0),
        }
    }

    /// Span of the original text; out-of-range spans yield `""`.
    pub fn slice(&self, (offset, len): ParamOffset) -> &str {
        let end = offset.saturating_add(len);
        if end <= self.text.len() {
            &self.text[offset..end]
        } else {
            ""
        }
    }
}

#[tracing::instrument(level = "trace", skip(raw), fields(path_len = raw.len() as u64))]
pub fn normalize_request_path(raw: &str, case_sensitive: bool) -> NormalizedPath {
    let cut = memchr::memchr2(b'?', b'#', raw.as_bytes()).unwrap_or(raw.len());
    let path = &raw[..cut];

    let mut text = String::with_capacity(path.len());
    let mut segments = SegmentSpans::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        text.push('/');
        let start = text.len();
        text.push_str(segment);
        segments.push((start, text.len()));
    }

    let folded = (!case_sensitive).then(|| text.to_ascii_lowercase());
    NormalizedPath {
        text,
        folded,
        segments,
    }
}

/// Percent-decodes a captured value. Malformed escapes are kept verbatim and
/// a result that is not valid UTF-8 falls back to the raw input.
pub fn decode_percent(input: &str) -> Cow<'_, str> {
    if memchr::memchr(b'%', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let Some(value) = decode_hex_pair(bytes[i + 1], bytes[i + 2])
        {
            output.push(value);
            i += 3;
            continue;
        }
        output.push(bytes[i]);
        i += 1;
    }

    match String::from_utf8(output) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(_) => Cow::Borrowed(input),
    }
}

fn decode_hex_pair(hi: u8, lo: u8) -> Option<u8> {
    fn val(byte: u8) -> Option<u8> {
        match byte {
            b'0'..=b'9' => Some(byte - b'0'),
            b'a'..=b'f' => Some(byte - b'a' + 10),
            b'A'..=b'F' => Some(byte - b'A' + 10),
            _ => None,
        }
    }

    Some(val(hi)? << 4 | val(lo)?)
}
