//! Search filters for retrieve calls
//!
//! A filter is either a simple comparison on one property or two filters
//! combined with AND/OR. Dates are sent as `DateValue`, everything else as
//! `Value`.

use crate::types::format_datetime;
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use std::fmt::Write;

/// Comparison operator of a simple filter part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    IsNull,
    IsNotNull,
    Like,
    In,
}

impl SimpleOperator {
    /// Wire name of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleOperator::Equals => "equals",
            SimpleOperator::NotEquals => "notEquals",
            SimpleOperator::GreaterThan => "greaterThan",
            SimpleOperator::GreaterThanOrEqual => "greaterThanOrEqual",
            SimpleOperator::LessThan => "lessThan",
            SimpleOperator::LessThanOrEqual => "lessThanOrEqual",
            SimpleOperator::Between => "between",
            SimpleOperator::IsNull => "isNull",
            SimpleOperator::IsNotNull => "isNotNull",
            SimpleOperator::Like => "like",
            SimpleOperator::In => "IN",
        }
    }
}

/// Logical operator joining two filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// Operand of a simple filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Date(DateTime<Utc>),
}

impl FilterValue {
    fn write_xml(&self, out: &mut String) {
        match self {
            FilterValue::Text(s) => {
                let _ = write!(out, "<Value>{}</Value>", escape(s.as_str()));
            }
            FilterValue::Date(dt) => {
                let _ = write!(out, "<DateValue>{}</DateValue>", format_datetime(dt));
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::Date(value)
    }
}

/// Search filter attached to a retrieve request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Comparison on a single property
    Simple {
        property: String,
        operator: SimpleOperator,
        values: Vec<FilterValue>,
    },
    /// Two filters joined with AND/OR
    Complex {
        left: Box<SearchFilter>,
        operator: LogicalOperator,
        right: Box<SearchFilter>,
    },
}

impl SearchFilter {
    /// Simple comparison
    pub fn simple(
        property: impl Into<String>,
        operator: SimpleOperator,
        values: Vec<FilterValue>,
    ) -> Self {
        Self::Simple {
            property: property.into(),
            operator,
            values,
        }
    }

    /// `property == value`
    pub fn equals(property: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::simple(property, SimpleOperator::Equals, vec![value.into()])
    }

    /// `property ∈ [start, end]`
    pub fn between(property: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::simple(
            property,
            SimpleOperator::Between,
            vec![FilterValue::Date(start), FilterValue::Date(end)],
        )
    }

    /// `start <= property < end`, or `start <= property <= end` when
    /// `closed`. Consecutive half-open windows never share a record.
    pub fn window(
        property: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        closed: bool,
    ) -> Self {
        let property = property.into();
        let upper = if closed {
            SimpleOperator::LessThanOrEqual
        } else {
            SimpleOperator::LessThan
        };
        Self::simple(
            property.clone(),
            SimpleOperator::GreaterThanOrEqual,
            vec![FilterValue::Date(start)],
        )
        .and(Self::simple(property, upper, vec![FilterValue::Date(end)]))
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: SearchFilter) -> Self {
        Self::Complex {
            left: Box::new(self),
            operator: LogicalOperator::And,
            right: Box::new(other),
        }
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: SearchFilter) -> Self {
        Self::Complex {
            left: Box::new(self),
            operator: LogicalOperator::Or,
            right: Box::new(other),
        }
    }

    /// Render as a `<Filter>` element
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_element("Filter", &mut out);
        out
    }

    fn write_element(&self, tag: &str, out: &mut String) {
        match self {
            SearchFilter::Simple {
                property,
                operator,
                values,
            } => {
                let _ = write!(
                    out,
                    "<{tag} xsi:type=\"SimpleFilterPart\"><Property>{}</Property><SimpleOperator>{}</SimpleOperator>",
                    escape(property.as_str()),
                    operator.as_str()
                );
                for value in values {
                    value.write_xml(out);
                }
                let _ = write!(out, "</{tag}>");
            }
            SearchFilter::Complex {
                left,
                operator,
                right,
            } => {
                let _ = write!(out, "<{tag} xsi:type=\"ComplexFilterPart\">");
                left.write_element("LeftOperand", out);
                let _ = write!(out, "<LogicalOperator>{}</LogicalOperator>", operator.as_str());
                right.write_element("RightOperand", out);
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}
