//! Request parameter sets and the API's bracket field naming.
//!
//! Jotform accepts nested values in flat form bodies by naming fields
//! `container[key]` or `container[key][subkey]`. The helpers here are pure
//! so the naming rules can be tested without a client.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::ApiError;

/// Bytes escaped inside a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Submission keys sent as-is even though they contain an underscore.
pub const UNSPLIT_SUBMISSION_KEYS: &[&str] = &["created_at"];

/// Parameters attached to a request.
///
/// `Fields` become the query string of a GET or the form body of a POST.
/// `Raw` is sent verbatim as the body of a PUT.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestParams {
    #[default]
    Empty,
    Fields(BTreeMap<String, String>),
    Raw(Vec<u8>),
}

impl RequestParams {
    pub fn is_empty(&self) -> bool {
        match self {
            RequestParams::Empty => true,
            RequestParams::Fields(fields) => fields.is_empty(),
            RequestParams::Raw(bytes) => bytes.is_empty(),
        }
    }
}

/// Percent-encode a caller-supplied value for use as one path segment.
///
/// Empty values and the dot segments `.` and `..` are rejected, since they
/// would address a different resource.
pub fn path_segment(value: &str) -> Result<String, ApiError> {
    if matches!(value, "" | "." | "..") {
        return Err(ApiError::InvalidRequest(format!(
            "{value:?} is not a valid path segment"
        )));
    }
    Ok(utf8_percent_encode(value, PATH_SEGMENT).to_string())
}

/// Paging, filtering and ordering for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub filter: BTreeMap<String, String>,
    pub order_by: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add one filter condition, e.g. `("created_at:gt", "2024-01-01")`.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }

    pub fn with_order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Encode as query parameters. Unset or empty values are left out; the
    /// filter map travels as a single JSON object named `filter` and the
    /// ordering field as `orderby`.
    pub fn to_params(&self) -> Result<BTreeMap<String, String>, ApiError> {
        let mut params = BTreeMap::new();
        if let Some(offset) = self.offset {
            params.insert("offset".to_string(), offset.to_string());
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), limit.to_string());
        }
        if !self.filter.is_empty() {
            params.insert("filter".to_string(), serde_json::to_string(&self.filter)?);
        }
        if let Some(order_by) = self.order_by.as_deref().filter(|s| !s.is_empty()) {
            params.insert("orderby".to_string(), order_by.to_string());
        }
        Ok(params)
    }
}

/// Filters for the account activity log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Activity type, e.g. `formCreation`; the server defaults to `all`
    pub action: Option<String>,
    /// Named range such as `lastWeek`
    pub date: Option<String>,
    /// `ASC` or `DESC`
    pub sort_by: Option<String>,
    /// `MM/DD/YYYY`
    pub start_date: Option<String>,
    /// `MM/DD/YYYY`
    pub end_date: Option<String>,
}

impl HistoryQuery {
    pub fn to_params(&self) -> BTreeMap<String, String> {
        [
            ("action", &self.action),
            ("date", &self.date),
            ("sortBy", &self.sort_by),
            ("startDate", &self.start_date),
            ("endDate", &self.end_date),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
    }
}

/// Definition of a form created through `JotformClient::create_form`.
///
/// Questions and emails are keyed by their position (`"1"`, `"2"`, ...)
/// and carry their own property maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewForm {
    pub properties: BTreeMap<String, String>,
    pub questions: BTreeMap<String, BTreeMap<String, String>>,
    pub emails: BTreeMap<String, BTreeMap<String, String>>,
}

impl NewForm {
    pub fn to_fields(&self) -> BTreeMap<String, String> {
        let mut fields = bracket_fields("properties", &self.properties);
        fields.extend(nested_bracket_fields("questions", &self.questions));
        fields.extend(nested_bracket_fields("emails", &self.emails));
        fields
    }
}

/// Field name for one submission answer.
///
/// `"3"` becomes `submission[3]`; `"3_first"` is split at the first
/// underscore into `submission[3][first]`. Keys listed in
/// `UNSPLIT_SUBMISSION_KEYS` are never split.
pub fn submission_field_name(key: &str) -> String {
    if UNSPLIT_SUBMISSION_KEYS.contains(&key) {
        return format!("submission[{key}]");
    }
    match key.split_once('_') {
        Some((prefix, suffix)) => format!("submission[{prefix}][{suffix}]"),
        None => format!("submission[{key}]"),
    }
}

/// Rename every key of a submission map with `submission_field_name`.
pub fn submission_fields(submission: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    submission
        .iter()
        .map(|(key, value)| (submission_field_name(key), value.clone()))
        .collect()
}

/// Wrap every key as `container[key]`, without splitting.
pub fn bracket_fields(
    container: &str,
    fields: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|(key, value)| (format!("{container}[{key}]"), value.clone()))
        .collect()
}

fn nested_bracket_fields(
    container: &str,
    items: &BTreeMap<String, BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    items
        .iter()
        .flat_map(|(item, fields)| {
            fields
                .iter()
                .map(move |(key, value)| (format!("{container}[{item}][{key}]"), value.clone()))
        })
        .collect()
}
