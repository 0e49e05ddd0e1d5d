use smallvec::SmallVec;

use crate::path::{NormalizedPath, decode_percent};
use crate::types::{CapturedParam, PathParams};

pub type CaptureList = SmallVec<[CapturedParam; 4]>;

pub(crate) fn captures_to_map(
    path: &NormalizedPath,
    captures: &[CapturedParam],
    decode: bool,
) -> PathParams {
    let mut map = PathParams::with_capacity(captures.len());
    for (name, offset) in captures {
        let raw = path.slice(*offset);
        let value = if decode {
            decode_percent(raw).into_owned()
        } else {
            raw.to_string()
        };
        map.insert(name.to_string(), value);
    }
    map
}
