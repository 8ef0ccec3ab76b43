//! Request construction, execution and envelope unwrapping for every Jotform
//! API operation.
//!
//! # Design
//! `JotformClient` holds an immutable `ClientConfig` and a shared transport.
//! Each operation names its verb, resource path and parameter set, and goes
//! through the same three steps:
//!
//! 1. `build_request` turns them into an `HttpRequest` (URL, `apiKey`
//!    header, query string or body).
//! 2. The injected `HttpTransport` executes it.
//! 3. `parse_content` checks the status and unwraps the envelope.
//!
//! The build and parse halves are public so a caller that performs its own
//! I/O can use them directly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ClientConfig, OutputType, API_VERSION};
use crate::envelope::{error_message, unwrap_content};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, UreqTransport};
use crate::params::{
    bracket_fields, path_segment, submission_fields, HistoryQuery, ListQuery, NewForm,
    RequestParams,
};

const API_KEY_HEADER: &str = "apiKey";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Blocking client for the Jotform API.
///
/// Cloning is cheap; clones share the transport. Configuration never
/// changes in place: `with_output_type` and `with_debug` return a new client.
#[derive(Clone)]
pub struct JotformClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for JotformClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JotformClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JotformClient {
    /// Create a client that talks to the network through `UreqTransport`.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let config = config.validated()?;
        let transport = UreqTransport::new(config.timeout);
        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }

    /// Create a client that executes requests through `transport`.
    pub fn with_transport(
        config: ClientConfig,
        transport: impl HttpTransport + 'static,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            config: config.validated()?,
            transport: Arc::new(transport),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn output_type(&self) -> OutputType {
        self.config.output_type
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    /// Copy of this client requesting `output_type` responses.
    pub fn with_output_type(&self, output_type: OutputType) -> Self {
        let mut client = self.clone();
        client.config.output_type = output_type;
        client
    }

    /// Copy of this client with request logging switched on or off.
    pub fn with_debug(&self, debug: bool) -> Self {
        let mut client = self.clone();
        client.config.debug = debug;
        client
    }

    /// Absolute URL of `resource`, with the `.xml` suffix when XML output
    /// is selected.
    pub fn resource_url(&self, resource: &str) -> String {
        match self.config.output_type {
            OutputType::Json => self.raw_url(resource),
            OutputType::Xml => self.raw_url(&format!("{resource}.xml")),
        }
    }

    pub(crate) fn raw_url(&self, resource: &str) -> String {
        format!("{}/{API_VERSION}/{resource}", self.config.base_url)
    }

    /// Build the request for an enveloped operation.
    pub fn build_request(
        &self,
        method: HttpMethod,
        resource: &str,
        params: RequestParams,
    ) -> Result<HttpRequest, ApiError> {
        self.compose(method, self.resource_url(resource), params)
    }

    /// Build a request against an exact URL. Adds the `apiKey` header and
    /// places `params` according to the verb.
    pub(crate) fn compose(
        &self,
        method: HttpMethod,
        mut url: String,
        params: RequestParams,
    ) -> Result<HttpRequest, ApiError> {
        if self.config.debug {
            info!(%method, %url, params = %describe(&params), "jotform request");
        }

        let mut headers = vec![(API_KEY_HEADER.to_string(), self.config.api_key.clone())];
        let body = match (method, params) {
            (_, RequestParams::Empty) => None,
            (HttpMethod::Get, RequestParams::Fields(fields)) => {
                if !fields.is_empty() {
                    url.push('?');
                    url.push_str(&serde_urlencoded::to_string(&fields)?);
                }
                None
            }
            (HttpMethod::Post, RequestParams::Fields(fields)) => {
                headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
                Some(serde_urlencoded::to_string(&fields)?.into_bytes())
            }
            (HttpMethod::Put, RequestParams::Raw(bytes)) => {
                headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
                Some(bytes)
            }
            (HttpMethod::Delete, params) if params.is_empty() => None,
            (method, RequestParams::Fields(_)) => {
                return Err(ApiError::InvalidRequest(format!(
                    "{method} requests do not take form fields"
                )))
            }
            (method, RequestParams::Raw(_)) => {
                return Err(ApiError::InvalidRequest(format!(
                    "{method} requests do not take a raw body"
                )))
            }
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Run `request` through the transport.
    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = self.transport.execute(request)?;
        debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            bytes = response.body.len(),
            "jotform response"
        );
        Ok(response)
    }

    /// Check the status of an enveloped response and extract its payload.
    ///
    /// JSON responses yield the re-serialized `content` field; XML
    /// responses are returned as received.
    pub fn parse_content(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<Vec<u8>, ApiError> {
        if !response.is_success() {
            return Err(http_error(request, &response));
        }
        match self.config.output_type {
            OutputType::Json => unwrap_content(&response.body).inspect_err(|_| {
                warn!(url = %request.url, status = response.status, "response is not a JSON envelope");
            }),
            OutputType::Xml => Ok(response.body),
        }
    }

    fn call(
        &self,
        method: HttpMethod,
        resource: &str,
        params: RequestParams,
    ) -> Result<Vec<u8>, ApiError> {
        let request = self.build_request(method, resource, params)?;
        let response = self.send(&request)?;
        self.parse_content(&request, response)
    }

    fn get(&self, resource: &str) -> Result<Vec<u8>, ApiError> {
        self.call(HttpMethod::Get, resource, RequestParams::Empty)
    }

    fn get_with(
        &self,
        resource: &str,
        query: BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ApiError> {
        self.call(HttpMethod::Get, resource, RequestParams::Fields(query))
    }

    fn post(&self, resource: &str, fields: BTreeMap<String, String>) -> Result<Vec<u8>, ApiError> {
        self.call(HttpMethod::Post, resource, RequestParams::Fields(fields))
    }

    fn put(&self, resource: &str, body: &[u8]) -> Result<Vec<u8>, ApiError> {
        self.call(HttpMethod::Put, resource, RequestParams::Raw(body.to_vec()))
    }

    fn delete(&self, resource: &str) -> Result<Vec<u8>, ApiError> {
        self.call(HttpMethod::Delete, resource, RequestParams::Empty)
    }

    /// Account details: type, avatar, name, email, limits.
    pub fn get_user(&self) -> Result<Vec<u8>, ApiError> {
        self.get("user")
    }

    /// Submissions received this month, upload space used, and similar counters.
    pub fn get_usage(&self) -> Result<Vec<u8>, ApiError> {
        self.get("user/usage")
    }

    pub fn get_forms(&self, query: &ListQuery) -> Result<Vec<u8>, ApiError> {
        self.get_with("user/forms", query.to_params()?)
    }

    pub fn get_submissions(&self, query: &ListQuery) -> Result<Vec<u8>, ApiError> {
        self.get_with("user/submissions", query.to_params()?)
    }

    pub fn get_subusers(&self) -> Result<Vec<u8>, ApiError> {
        self.get("user/subusers")
    }

    pub fn get_folders(&self) -> Result<Vec<u8>, ApiError> {
        self.get("user/folders")
    }

    pub fn get_reports(&self) -> Result<Vec<u8>, ApiError> {
        self.get("user/reports")
    }

    /// Time zone, language and other account settings.
    pub fn get_settings(&self) -> Result<Vec<u8>, ApiError> {
        self.get("user/settings")
    }

    pub fn update_settings(&self, settings: &BTreeMap<String, String>) -> Result<Vec<u8>, ApiError> {
        self.post("user/settings", settings.clone())
    }

    /// Activity log: form changes, logins and other account events.
    pub fn get_history(&self, query: &HistoryQuery) -> Result<Vec<u8>, ApiError> {
        self.get_with("user/history", query.to_params())
    }

    pub fn register_user(&self, details: &BTreeMap<String, String>) -> Result<Vec<u8>, ApiError> {
        self.post("user/register", details.clone())
    }

    /// Log in with username, password, application name and access type.
    pub fn login_user(&self, credentials: &BTreeMap<String, String>) -> Result<Vec<u8>, ApiError> {
        self.post("user/login", credentials.clone())
    }

    pub fn logout_user(&self) -> Result<Vec<u8>, ApiError> {
        self.get("user/logout")
    }

    /// Details of a pricing plan such as `FREE` or `PREMIUM`.
    pub fn get_plan(&self, plan_name: &str) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("system/plan/{}", path_segment(plan_name)?))
    }

    pub fn get_form(&self, form_id: i64) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("form/{form_id}"))
    }

    pub fn create_form(&self, form: &NewForm) -> Result<Vec<u8>, ApiError> {
        self.post("user/forms", form.to_fields())
    }

    /// Create forms from a caller-built JSON document.
    pub fn create_forms(&self, forms: &[u8]) -> Result<Vec<u8>, ApiError> {
        self.put("user/forms", forms)
    }

    pub fn clone_form(&self, form_id: i64) -> Result<Vec<u8>, ApiError> {
        self.post(&format!("form/{form_id}/clone"), BTreeMap::new())
    }

    pub fn delete_form(&self, form_id: i64) -> Result<Vec<u8>, ApiError> {
        self.delete(&format!("form/{form_id}"))
    }

    pub fn get_form_files(&self, form_id: i64) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("form/{form_id}/files"))
    }

    pub fn get_form_questions(&self, form_id: i64) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("form/{form_id}/questions"))
    }

    pub fn get_form_question(&self, form_id: i64, question_id: u32) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("form/{form_id}/question/{question_id}"))
    }

    /// Add a question described by properties such as `type` and `text`.
    pub fn create_form_question(
        &self,
        form_id: i64,
        properties: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ApiError> {
        self.post(
            &format!("form/{form_id}/questions"),
            bracket_fields("question", properties),
        )
    }

    pub fn create_form_questions(&self, form_id: i64, questions: &[u8]) -> Result<Vec<u8>, ApiError> {
        self.put(&format!("form/{form_id}/questions"), questions)
    }

    pub fn edit_form_question(
        &self,
        form_id: i64,
        question_id: u32,
        properties: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ApiError> {
        self.post(
            &format!("form/{form_id}/question/{question_id}"),
            bracket_fields("question", properties),
        )
    }

    pub fn delete_form_question(&self, form_id: i64, question_id: u32) -> Result<Vec<u8>, ApiError> {
        self.delete(&format!("form/{form_id}/question/{question_id}"))
    }

    pub fn get_form_properties(&self, form_id: i64) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("form/{form_id}/properties"))
    }

    pub fn get_form_property(&self, form_id: i64, property_key: &str) -> Result<Vec<u8>, ApiError> {
        self.get(&format!(
            "form/{form_id}/properties/{}",
            path_segment(property_key)?
        ))
    }

    pub fn set_form_properties(
        &self,
        form_id: i64,
        properties: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ApiError> {
        self.post(
            &format!("form/{form_id}/properties"),
            bracket_fields("properties", properties),
        )
    }

    pub fn set_multiple_form_properties(
        &self,
        form_id: i64,
        properties: &[u8],
    ) -> Result<Vec<u8>, ApiError> {
        self.put(&format!("form/{form_id}/properties"), properties)
    }

    pub fn get_form_submissions(&self, form_id: i64, query: &ListQuery) -> Result<Vec<u8>, ApiError> {
        self.get_with(&format!("form/{form_id}/submissions"), query.to_params()?)
    }

    /// Submit answers keyed by question ID (`"3"`, `"4_first"`, ...).
    pub fn create_form_submission(
        &self,
        form_id: i64,
        submission: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ApiError> {
        self.post(
            &format!("form/{form_id}/submissions"),
            submission_fields(submission),
        )
    }

    pub fn create_form_submissions(
        &self,
        form_id: i64,
        submissions: &[u8],
    ) -> Result<Vec<u8>, ApiError> {
        self.put(&format!("form/{form_id}/submissions"), submissions)
    }

    pub fn get_submission(&self, submission_id: i64) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("user/submission/{submission_id}"))
    }

    pub fn edit_submission(
        &self,
        submission_id: i64,
        submission: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ApiError> {
        self.post(
            &format!("submission/{submission_id}"),
            submission_fields(submission),
        )
    }

    pub fn delete_submission(&self, submission_id: i64) -> Result<Vec<u8>, ApiError> {
        self.delete(&format!("submission/{submission_id}"))
    }

    pub fn get_form_webhooks(&self, form_id: i64) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("form/{form_id}/webhooks"))
    }

    /// Register a URL that receives form data on every submission.
    pub fn create_form_webhook(&self, form_id: i64, webhook_url: &str) -> Result<Vec<u8>, ApiError> {
        let fields = BTreeMap::from([("webhookURL".to_string(), webhook_url.to_string())]);
        self.post(&format!("form/{form_id}/webhooks"), fields)
    }

    pub fn delete_form_webhook(&self, form_id: i64, webhook_id: i64) -> Result<Vec<u8>, ApiError> {
        self.delete(&format!("form/{form_id}/webhooks/{webhook_id}"))
    }

    pub fn get_form_reports(&self, form_id: i64) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("form/{form_id}/reports"))
    }

    /// Create a report; `report` carries fields such as `title` and `list_type`.
    pub fn create_report(
        &self,
        form_id: i64,
        report: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, ApiError> {
        self.post(&format!("form/{form_id}/reports"), report.clone())
    }

    pub fn get_report(&self, report_id: i64) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("user/report/{report_id}"))
    }

    pub fn delete_report(&self, report_id: i64) -> Result<Vec<u8>, ApiError> {
        self.delete(&format!("report/{report_id}"))
    }

    pub fn get_folder(&self, folder_id: &str) -> Result<Vec<u8>, ApiError> {
        self.get(&format!("folder/{}", path_segment(folder_id)?))
    }
}

/// `Http` error for a response with status >= 300.
pub(crate) fn http_error(request: &HttpRequest, response: &HttpResponse) -> ApiError {
    ApiError::Http {
        method: request.method,
        url: request.url.clone(),
        status: response.status,
        message: error_message(&response.body),
    }
}

fn describe(params: &RequestParams) -> String {
    match params {
        RequestParams::Empty => String::new(),
        RequestParams::Fields(fields) => format!("{fields:?}"),
        RequestParams::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}
