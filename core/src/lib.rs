//! Blocking client for the Jotform REST API.
//!
//! # Overview
//! Every API operation is a method on `JotformClient`. A call builds the
//! request URL under `{base_url}/v1/`, attaches the `apiKey` header, encodes
//! parameters as a query string, a form body, or a raw JSON body, executes
//! the request through an injected `HttpTransport`, and returns the
//! `content` field of the JSON envelope as raw bytes.
//!
//! # Design
//! - The transport is a trait. `UreqTransport` performs real I/O; any
//!   closure `Fn(&HttpRequest) -> Result<HttpResponse, TransportError>`
//!   can replace it in tests.
//! - `ClientConfig` is fixed at construction. Output-type and debug
//!   toggles return a reconfigured copy, so a client can be shared across
//!   threads freely.
//! - Payloads are returned as bytes; callers deserialize them into their own
//!   types.
//! - PDF downloads return the file body unmodified.

pub mod client;
pub mod config;
mod download;
pub mod envelope;
pub mod error;
pub mod http;
pub mod params;

pub use client::JotformClient;
pub use config::{ClientConfig, OutputType, API_VERSION, DEFAULT_BASE_URL};
pub use envelope::{unwrap_content, Envelope};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError, UreqTransport};
pub use params::{
    bracket_fields, path_segment, submission_field_name, submission_fields, HistoryQuery,
    ListQuery, NewForm, RequestParams,
};
