/// Shared types used across the codebase
use axum::http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::{FilterEq, SortSpec};

/// CRUD operations the resource dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verb {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Verb {
    /// Map an HTTP method plus id presence onto a verb. `None` means the route does not exist.
    pub fn from_method(method: &Method, has_id: bool) -> Option<Self> {
        match (method.as_str(), has_id) {
            ("GET", false) => Some(Verb::List),
            ("GET", true) => Some(Verb::Get),
            ("POST", false) => Some(Verb::Create),
            ("PUT", _) => Some(Verb::Update),
            ("DELETE", _) => Some(Verb::Delete),
            _ => None,
        }
    }
}

/// One CRUD call, built per request and never shared.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub verb: Verb,
    pub resource: String,
    pub collection: &'static str,
    pub id: Option<String>,
    pub sort: SortSpec,
    pub filters: Vec<FilterEq>,
    /// Normalized write body; `None` on reads and deletes
    pub body: Option<Value>,
}

// Everything a URL path segment cannot carry literally
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'+')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode one path segment, e.g. a record id or user id.
pub fn encode_path_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_map_to_verbs() {
        assert_eq!(Verb::from_method(&Method::GET, false), Some(Verb::List));
        assert_eq!(Verb::from_method(&Method::GET, true), Some(Verb::Get));
        assert_eq!(Verb::from_method(&Method::POST, false), Some(Verb::Create));
        assert_eq!(Verb::from_method(&Method::POST, true), None);
        assert_eq!(Verb::from_method(&Method::PUT, false), Some(Verb::Update));
        assert_eq!(Verb::from_method(&Method::PATCH, true), None);
        assert_eq!(Verb::from_method(&Method::HEAD, false), None);
    }

    #[test]
    fn path_segments_use_percent_twenty_for_spaces() {
        assert_eq!(encode_path_segment("q 1"), "q%201");
        assert_eq!(encode_path_segment("a+b/c?d#e"), "a%2Bb%2Fc%3Fd%23e");
        assert_eq!(encode_path_segment("ação"), "a%C3%A7%C3%A3o");
        assert_eq!(encode_path_segment("7f3c-uuid_ok.~"), "7f3c-uuid_ok.~");
    }
}
