mod error;
mod parser;
mod token;

pub use error::{PatternError, PatternResult};
pub use parser::{parse_path, render_path};
pub use token::{PathSegmentToken, TokenList};
