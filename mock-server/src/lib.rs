//! In-memory stand-in for the Jotform API.
//!
//! Serves a subset of `/v1` with the same envelope, `apiKey` header check
//! and bracket-notation form bodies as the real service. A form counts as
//! having a native PDF template when its `formType` property is `pdfForm`.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// API key accepted by the mock.
pub const API_KEY: &str = "mock-api-key";

const PDF_FORM_TYPE: &str = "pdfForm";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MockForm {
    pub id: String,
    pub title: String,
    pub status: String,
    pub count: u64,
    pub properties: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MockSubmission {
    pub id: String,
    pub form_id: String,
    pub answers: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: i64,
    forms: BTreeMap<i64, MockForm>,
    submissions: BTreeMap<i64, MockSubmission>,
    webhooks: BTreeMap<i64, BTreeMap<String, String>>,
}

impl Store {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Insert a form directly, bypassing the HTTP surface.
    pub fn insert_form(&mut self, title: &str, properties: BTreeMap<String, String>) -> i64 {
        let id = self.allocate_id();
        self.forms.insert(
            id,
            MockForm {
                id: id.to_string(),
                title: title.to_string(),
                status: "ENABLED".to_string(),
                count: 0,
                properties,
            },
        );
        id
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_store(Arc::new(RwLock::new(Store::default())))
}

pub fn app_with_store(db: Db) -> Router {
    let api = Router::new()
        .route("/user", get(get_user))
        .route("/user/usage", get(get_usage))
        .route("/user/forms", get(list_forms).post(create_form))
        .route("/user/submission/{id}", get(get_submission))
        .route("/form/{id}", get(get_form).delete(delete_form))
        .route(
            "/form/{id}/submissions",
            get(list_form_submissions).post(create_submission),
        )
        .route("/form/{id}/webhooks", get(list_webhooks).post(create_webhook))
        .route("/form/{id}/webhooks/{webhook_id}", delete(delete_webhook))
        .route("/submission/{id}", post(edit_submission).delete(delete_submission))
        .route("/pdf-converter/{id}/fill-pdf", get(fill_pdf))
        .route("/generatePDF", get(generate_pdf))
        .layer(middleware::from_fn(require_api_key))
        .with_state(db);
    Router::new().nest("/v1", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_store(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(db)).await
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

fn envelope(status: StatusCode, message: &str, content: Value) -> Response {
    let body = json!({
        "responseCode": status.as_u16(),
        "message": message,
        "content": content,
        "duration": "1ms",
    });
    (status, Json(body)).into_response()
}

fn ok(content: impl Serialize) -> Response {
    match serde_json::to_value(content) {
        Ok(content) => envelope(StatusCode::OK, "success", content),
        Err(e) => envelope(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), Value::from("")),
    }
}

fn not_found(what: &str) -> Response {
    envelope(StatusCode::NOT_FOUND, &format!("{what} not found"), Value::from(""))
}

async fn require_api_key(req: Request, next: Next) -> Response {
    let authorized = req
        .headers()
        .get("apiKey")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| key == API_KEY);
    if !authorized {
        return envelope(
            StatusCode::UNAUTHORIZED,
            "You're not authorized to use this endpoint",
            Value::from(""),
        );
    }
    next.run(req).await
}

/// Split `container[a][b]` into `("container", ["a", "b"])`.
pub fn parse_bracket_key(key: &str) -> Option<(&str, Vec<&str>)> {
    let (container, rest) = key.split_once('[')?;
    let inner = rest.strip_suffix(']')?;
    Some((container, inner.split("][").collect()))
}

/// Collect `container[...]` fields of a form body into a JSON object.
/// One level of nesting becomes a string, two levels an object.
fn bracket_object(fields: &HashMap<String, String>, container: &str) -> BTreeMap<String, Value> {
    let mut out: BTreeMap<String, Value> = BTreeMap::new();
    for (key, value) in fields {
        let Some((name, parts)) = parse_bracket_key(key) else {
            continue;
        };
        if name != container {
            continue;
        }
        match parts.as_slice() {
            [field] => {
                out.insert(field.to_string(), Value::from(value.as_str()));
            }
            [field, sub, ..] => {
                let entry = out
                    .entry(field.to_string())
                    .or_insert_with(|| Value::Object(Default::default()));
                if let Value::Object(map) = entry {
                    map.insert(sub.to_string(), Value::from(value.as_str()));
                }
            }
            [] => {}
        }
    }
    out
}

fn strings(values: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    values
        .into_iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
        .collect()
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

async fn get_user() -> Response {
    ok(json!({
        "username": "mockuser",
        "name": "Mock User",
        "email": "mock@example.com",
        "account_type": "FREE",
    }))
}

async fn get_usage(State(db): State<Db>) -> Response {
    let store = db.read().await;
    ok(json!({ "submissions": store.submissions.len().to_string() }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub filter: Option<String>,
    pub orderby: Option<String>,
}

impl ListParams {
    fn filter_map(&self) -> Result<BTreeMap<String, String>, Response> {
        match self.filter.as_deref() {
            None => Ok(BTreeMap::new()),
            Some(raw) => serde_json::from_str(raw).map_err(|_| {
                envelope(StatusCode::BAD_REQUEST, "filter is not a JSON object", Value::from(""))
            }),
        }
    }

    fn page<T>(&self, items: Vec<T>) -> Vec<T> {
        let limit = self.limit.unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(limit)
            .collect()
    }
}

async fn list_forms(State(db): State<Db>, Query(params): Query<ListParams>) -> Response {
    let filter = match params.filter_map() {
        Ok(filter) => filter,
        Err(resp) => return resp,
    };
    let store = db.read().await;
    let mut forms: Vec<MockForm> = store
        .forms
        .values()
        .filter(|form| filter.get("status").map_or(true, |s| *s == form.status))
        .cloned()
        .collect();
    if params.orderby.as_deref() == Some("title") {
        forms.sort_by(|a, b| a.title.cmp(&b.title));
    }
    ok(params.page(forms))
}

async fn create_form(
    State(db): State<Db>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let properties = strings(bracket_object(&fields, "properties"));
    let title = properties
        .get("title")
        .cloned()
        .unwrap_or_else(|| "Untitled Form".to_string());
    let mut store = db.write().await;
    let id = store.insert_form(&title, properties);
    ok(&store.forms[&id])
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

async fn get_form(State(db): State<Db>, Path(id): Path<i64>) -> Response {
    let store = db.read().await;
    match store.forms.get(&id) {
        Some(form) => ok(form),
        None => not_found("Form"),
    }
}

async fn delete_form(State(db): State<Db>, Path(id): Path<i64>) -> Response {
    let mut store = db.write().await;
    let Some(mut form) = store.forms.remove(&id) else {
        return not_found("Form");
    };
    store.submissions.retain(|_, s| s.form_id != form.id);
    store.webhooks.remove(&id);
    form.status = "DELETED".to_string();
    ok(form)
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

async fn list_form_submissions(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Response {
    let store = db.read().await;
    if !store.forms.contains_key(&id) {
        return not_found("Form");
    }
    let form_id = id.to_string();
    let submissions: Vec<MockSubmission> = store
        .submissions
        .values()
        .filter(|s| s.form_id == form_id)
        .cloned()
        .collect();
    ok(params.page(submissions))
}

async fn create_submission(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let mut store = db.write().await;
    if !store.forms.contains_key(&id) {
        return not_found("Form");
    }
    let submission_id = store.allocate_id();
    let submission = MockSubmission {
        id: submission_id.to_string(),
        form_id: id.to_string(),
        answers: bracket_object(&fields, "submission"),
    };
    store.submissions.insert(submission_id, submission);
    if let Some(form) = store.forms.get_mut(&id) {
        form.count += 1;
    }
    ok(json!({
        "submissionID": submission_id.to_string(),
        "URL": format!("https://www.jotform.com/submission/{submission_id}"),
    }))
}

async fn get_submission(State(db): State<Db>, Path(id): Path<i64>) -> Response {
    let store = db.read().await;
    match store.submissions.get(&id) {
        Some(submission) => ok(submission),
        None => not_found("Submission"),
    }
}

async fn edit_submission(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let mut store = db.write().await;
    let Some(submission) = store.submissions.get_mut(&id) else {
        return not_found("Submission");
    };
    submission.answers.extend(bracket_object(&fields, "submission"));
    ok(json!({ "submissionID": id.to_string() }))
}

async fn delete_submission(State(db): State<Db>, Path(id): Path<i64>) -> Response {
    let mut store = db.write().await;
    let Some(submission) = store.submissions.remove(&id) else {
        return not_found("Submission");
    };
    if let Ok(form_id) = submission.form_id.parse::<i64>() {
        if let Some(form) = store.forms.get_mut(&form_id) {
            form.count = form.count.saturating_sub(1);
        }
    }
    ok(format!("Submission #{id} deleted successfully."))
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

async fn list_webhooks(State(db): State<Db>, Path(id): Path<i64>) -> Response {
    let store = db.read().await;
    if !store.forms.contains_key(&id) {
        return not_found("Form");
    }
    ok(store.webhooks.get(&id).cloned().unwrap_or_default())
}

async fn create_webhook(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let Some(url) = fields.get("webhookURL") else {
        return envelope(StatusCode::BAD_REQUEST, "webhookURL is required", Value::from(""));
    };
    let mut store = db.write().await;
    if !store.forms.contains_key(&id) {
        return not_found("Form");
    }
    let hooks = store.webhooks.entry(id).or_default();
    let next = hooks
        .keys()
        .filter_map(|k| k.parse::<u64>().ok())
        .max()
        .map_or(0, |max| max + 1);
    hooks.insert(next.to_string(), url.clone());
    ok(hooks.clone())
}

async fn delete_webhook(
    State(db): State<Db>,
    Path((id, webhook_id)): Path<(i64, i64)>,
) -> Response {
    let mut store = db.write().await;
    let Some(hooks) = store.webhooks.get_mut(&id) else {
        return not_found("Webhook");
    };
    if hooks.remove(&webhook_id.to_string()).is_none() {
        return not_found("Webhook");
    }
    ok(hooks.clone())
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

fn pdf(form_id: i64, submission_id: &str, variant: &str) -> Response {
    let body = format!("%PDF-1.4\n% {variant} form {form_id} submission {submission_id}\n%%EOF\n");
    ([(header::CONTENT_TYPE, "application/pdf")], body.into_bytes()).into_response()
}

async fn fill_pdf(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let store = db.read().await;
    let has_template = store
        .forms
        .get(&id)
        .and_then(|form| form.properties.get("formType"))
        .is_some_and(|t| t == PDF_FORM_TYPE);
    if !has_template {
        return envelope(
            StatusCode::BAD_REQUEST,
            "draw-pdf-answers Request Failed",
            Value::from(""),
        );
    }
    let submission_id = query.get("submissionID").cloned().unwrap_or_default();
    pdf(id, &submission_id, "rich")
}

async fn generate_pdf(
    State(db): State<Db>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(form_id) = query.get("formid").and_then(|id| id.parse::<i64>().ok()) else {
        return envelope(StatusCode::BAD_REQUEST, "formid is required", Value::from(""));
    };
    let store = db.read().await;
    if !store.forms.contains_key(&form_id) {
        return not_found("Form");
    }
    let submission_id = query.get("submissionid").cloned().unwrap_or_default();
    let variant = match query.get("reportid") {
        Some(report) => format!("report {report}"),
        None => "simple".to_string(),
    };
    pdf(form_id, &submission_id, &variant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_keys_split_into_parts() {
        assert_eq!(parse_bracket_key("submission[3]"), Some(("submission", vec!["3"])));
        assert_eq!(
            parse_bracket_key("submission[3][first]"),
            Some(("submission", vec!["3", "first"]))
        );
        assert_eq!(parse_bracket_key("webhookURL"), None);
    }

    #[test]
    fn bracket_object_nests_two_levels() {
        let fields = HashMap::from([
            ("submission[1]".to_string(), "hello".to_string()),
            ("submission[2][first]".to_string(), "Jane".to_string()),
            ("submission[2][last]".to_string(), "Doe".to_string()),
            ("other[9]".to_string(), "ignored".to_string()),
        ]);
        let answers = bracket_object(&fields, "submission");
        assert_eq!(answers["1"], json!("hello"));
        assert_eq!(answers["2"], json!({"first": "Jane", "last": "Doe"}));
        assert!(!answers.contains_key("9"));
    }

    #[test]
    fn store_allocates_increasing_ids() {
        let mut store = Store::default();
        let a = store.insert_form("A", BTreeMap::new());
        let b = store.insert_form("B", BTreeMap::new());
        assert!(b > a);
        assert_eq!(store.forms[&a].status, "ENABLED");
    }

    #[test]
    fn list_params_page() {
        let params = ListParams {
            offset: Some(1),
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(params.page(vec![1, 2, 3, 4]), vec![2, 3]);
    }
}
