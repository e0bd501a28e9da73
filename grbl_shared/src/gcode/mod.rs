pub mod parser;
pub mod types;

pub use parser::{parse_line, strip_comments};
pub use types::{Code, ParsedLine};
