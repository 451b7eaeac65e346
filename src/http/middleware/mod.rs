//! Built-in middlewares.

pub mod body_parser;

pub use body_parser::{body_parser, parse_body, BodyParser, ParsedBody};
