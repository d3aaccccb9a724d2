//! Retrieve request envelopes
//!
//! One `RetrieveRequest` describes one page of a cursor traversal: the
//! object, the properties to return, an optional filter and, after the first
//! page, the continuation token handed back by the server.

use super::filter::SearchFilter;
use quick_xml::escape::escape;
use std::fmt::Write;

const ENVELOPE_NAMESPACES: &str = concat!(
    r#"xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" "#,
    r#"xmlns:a="http://schemas.xmlsoap.org/ws/2004/08/addressing" "#,
    r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
    r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema""#
);

/// A single retrieve call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveRequest {
    /// Remote object type, e.g. `Email` or `DataExtensionObject[key]`
    pub object_type: String,
    /// Properties to return
    pub properties: Vec<String>,
    /// Optional search filter
    pub filter: Option<SearchFilter>,
    /// Continuation token from the previous page
    pub continue_request: Option<String>,
    /// Requested page size
    pub batch_size: Option<u32>,
}

impl RetrieveRequest {
    /// Create a request for `object_type` returning `properties`
    pub fn new(object_type: impl Into<String>, properties: Vec<String>) -> Self {
        Self {
            object_type: object_type.into(),
            properties,
            filter: None,
            continue_request: None,
            batch_size: None,
        }
    }

    /// Attach a filter
    #[must_use]
    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Same request, continuing from `request_id`
    #[must_use]
    pub fn continued(&self, request_id: Option<&str>) -> Self {
        let mut next = self.clone();
        next.continue_request = request_id.map(ToString::to_string);
        next
    }

    /// Render the full SOAP envelope
    pub fn to_envelope(&self, endpoint: &str, token: &str) -> String {
        let mut out = String::with_capacity(1024);
        let _ = write!(
            out,
            r#"<?xml version="1.0" encoding="UTF-8"?><s:Envelope {ENVELOPE_NAMESPACES}><s:Header>"#
        );
        let _ = write!(
            out,
            r#"<a:Action s:mustUnderstand="1">Retrieve</a:Action><a:To s:mustUnderstand="1">{}</a:To>"#,
            escape(endpoint)
        );
        let _ = write!(
            out,
            r#"<fueloauth xmlns="http://exacttarget.com">{}</fueloauth></s:Header>"#,
            escape(token)
        );
        out.push_str(
            r#"<s:Body><RetrieveRequestMsg xmlns="http://exacttarget.com/wsdl/partnerAPI"><RetrieveRequest>"#,
        );

        if let Some(request_id) = &self.continue_request {
            let _ = write!(out, "<ContinueRequest>{}</ContinueRequest>", escape(request_id.as_str()));
        }
        if let Some(batch_size) = self.batch_size {
            let _ = write!(out, "<Options><BatchSize>{batch_size}</BatchSize></Options>");
        }
        let _ = write!(out, "<ObjectType>{}</ObjectType>", escape(self.object_type.as_str()));
        for property in &self.properties {
            let _ = write!(out, "<Properties>{}</Properties>", escape(property.as_str()));
        }
        if let Some(filter) = &self.filter {
            out.push_str(&filter.to_xml());
        }

        out.push_str("</RetrieveRequest></RetrieveRequestMsg></s:Body></s:Envelope>");
        out
    }
}
