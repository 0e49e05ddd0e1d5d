mod normalize;

pub use normalize::{NormalizedPath, decode_percent, normalize_request_path};
