//! Retrieve responses
//!
//! Parses `RetrieveResponseMsg` documents into a status, a continuation
//! token and a list of JSON records, and classifies logical errors the
//! service reports inside otherwise successful responses.

use crate::error::{Error, Result};
use regex::Regex;
use roxmltree::{Document, Node};
use serde_json::{Map, Value};
use std::sync::LazyLock;

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Status the server returns when another page is waiting
pub const MORE_DATA_AVAILABLE: &str = "MoreDataAvailable";

static FIELD_PROBLEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(column|field|propert(y|ies)|property\(s\))\b").expect("valid regex")
});

static PERMISSION_PROBLEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(permission|not authori[sz]ed|unauthori[sz]ed|insufficient privileges|access denied)")
        .expect("valid regex")
});

/// One page of a retrieve traversal
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveResponse {
    /// `OverallStatus` as sent by the server
    pub status: String,
    /// Continuation token for the next page
    pub request_id: Option<String>,
    /// Records on this page
    pub results: Vec<Value>,
}

impl RetrieveResponse {
    /// A terminal page with `OK` status
    pub fn ok(results: Vec<Value>) -> Self {
        Self {
            status: "OK".to_string(),
            request_id: None,
            results,
        }
    }

    /// A page announcing more data behind `request_id`
    pub fn more(request_id: impl Into<String>, results: Vec<Value>) -> Self {
        Self {
            status: MORE_DATA_AVAILABLE.to_string(),
            request_id: Some(request_id.into()),
            results,
        }
    }

    /// Whether the server has another page
    pub fn has_more(&self) -> bool {
        self.status == MORE_DATA_AVAILABLE
    }

    /// Whether the status reports a logical error
    pub fn is_error(&self) -> bool {
        self.status.contains("Error")
    }

    /// Turn an error status into a typed error; passes other responses through
    pub fn into_result(self, object_type: &str) -> Result<Self> {
        if self.is_error() {
            Err(classify_remote_error(object_type, &self.status))
        } else {
            Ok(self)
        }
    }
}

/// Map a remote error message onto the error taxonomy
pub fn classify_remote_error(object_type: &str, message: &str) -> Error {
    if FIELD_PROBLEM.is_match(message) {
        Error::IncompatibleFieldSelection {
            object_type: object_type.to_string(),
            message: message.to_string(),
        }
    } else if PERMISSION_PROBLEM.is_match(message) {
        Error::PermissionFailure {
            object_type: object_type.to_string(),
            message: message.to_string(),
        }
    } else if object_type.is_empty() {
        Error::remote(message)
    } else {
        Error::remote(format!("{object_type}: {message}"))
    }
}

/// `faultstring` of a SOAP fault document, if `body` is one.
///
/// The object type is not known at this point; classified errors carry an
/// empty one for the transport to fill in.
pub fn soap_fault(body: &str) -> Option<Error> {
    let doc = Document::parse(body).ok()?;
    let fault = find_descendant(doc.root(), "Fault")?;
    let reason = find_descendant(fault, "faultstring")
        .and_then(|n| n.text())
        .unwrap_or("unknown SOAP fault");
    Some(classify_remote_error("", &format!("SOAP fault: {reason}")))
}

/// Parse a `RetrieveResponseMsg` body
pub fn parse_retrieve_response(body: &str) -> Result<RetrieveResponse> {
    let doc = Document::parse(body).map_err(|e| Error::malformed(format!("invalid XML: {e}")))?;

    if find_descendant(doc.root(), "Fault").is_some() {
        return Err(soap_fault(body).unwrap_or_else(|| Error::remote("SOAP fault")));
    }

    let msg = find_descendant(doc.root(), "RetrieveResponseMsg")
        .ok_or_else(|| Error::malformed("missing RetrieveResponseMsg"))?;

    let mut status = None;
    let mut request_id = None;
    let mut results = Vec::new();

    for child in msg.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "OverallStatus" => status = child.text().map(|s| s.trim().to_string()),
            "RequestID" => request_id = child.text().map(|s| s.trim().to_string()),
            "Results" => results.push(element_to_value(child)),
            _ => {}
        }
    }

    Ok(RetrieveResponse {
        status: status.ok_or_else(|| Error::malformed("missing OverallStatus"))?,
        request_id: request_id.filter(|s| !s.is_empty()),
        results,
    })
}

fn find_descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Convert an element into JSON: leaves become strings (or null when
/// `xsi:nil`), repeated children become arrays.
fn element_to_value(node: Node) -> Value {
    if node.attribute((XSI_NS, "nil")) == Some("true") {
        return Value::Null;
    }

    let children: Vec<Node> = node.children().filter(Node::is_element).collect();
    if children.is_empty() {
        return Value::String(node.text().unwrap_or_default().to_string());
    }

    let mut map = Map::new();
    for child in children {
        let name = child.tag_name().name().to_string();
        let value = element_to_value(child);
        match map.get_mut(&name) {
            // element_to_value never yields an array, so an array here means a repeat
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(name, value);
            }
        }
    }
    Value::Object(map)
}
