use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::{general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Runtime settings for the mock cluster.
#[derive(Clone, Debug)]
pub struct ClusterConfig {
    pub cluster_name: String,
    /// When set, every request must carry matching basic-auth credentials.
    pub credentials: Option<(String, String)>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_name: "mock-cluster".to_string(),
            credentials: None,
        }
    }
}

impl ClusterConfig {
    /// Read `MOCK_CLUSTER_NAME`, `MOCK_CLUSTER_USER` and
    /// `MOCK_CLUSTER_PASSWORD`. Auth is enabled only when both of the
    /// latter are set.
    pub fn from_env() -> Self {
        let cluster_name =
            std::env::var("MOCK_CLUSTER_NAME").unwrap_or_else(|_| "mock-cluster".to_string());
        let credentials = match (
            std::env::var("MOCK_CLUSTER_USER"),
            std::env::var("MOCK_CLUSTER_PASSWORD"),
        ) {
            (Ok(user), Ok(password)) => Some((user, password)),
            _ => None,
        };
        Self {
            cluster_name,
            credentials,
        }
    }
}

/// Documents of one index, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Index {
    pub docs: Vec<(String, Value)>,
}

pub type Db = Arc<RwLock<HashMap<String, Index>>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    config: Arc<ClusterConfig>,
}

/// Request bodies larger than this are rejected before any handler runs.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Deserialize, Default)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub from: Option<usize>,
    #[serde(default)]
    pub size: Option<usize>,
}

/// Error in the cluster's wire shape: `{"error": {type, reason}, "status"}`.
pub struct ClusterError {
    status: StatusCode,
    kind: &'static str,
    reason: String,
}

impl ClusterError {
    fn new(status: StatusCode, kind: &'static str, reason: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            reason: reason.into(),
        }
    }

    fn index_not_found(index: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "index_not_found_exception",
            format!("no such index [{index}]"),
        )
    }
}

impl IntoResponse for ClusterError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {"type": self.kind, "reason": self.reason},
            "status": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    app_with(ClusterConfig::default())
}

pub fn app_with(config: ClusterConfig) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(HashMap::new())),
        config: Arc::new(config),
    };
    Router::new()
        .route("/", get(banner))
        .route("/_cluster/health", get(health))
        .route("/{index}/_doc", post(index_doc))
        .route("/{index}/_mapping", get(get_mapping))
        .route("/{index}/_search", post(search))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: ClusterConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ClusterError> {
    let Some((user, password)) = &state.config.credentials else {
        return Ok(next.run(request).await);
    };

    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| BASE64.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok());

    match supplied {
        Some(pair) if pair == format!("{user}:{password}") => Ok(next.run(request).await),
        Some(_) => Err(ClusterError::new(
            StatusCode::UNAUTHORIZED,
            "security_exception",
            "unable to authenticate user",
        )),
        None => Err(ClusterError::new(
            StatusCode::UNAUTHORIZED,
            "security_exception",
            "missing authentication credentials",
        )),
    }
}

async fn banner(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "node-0",
        "cluster_name": state.config.cluster_name,
        "version": {"number": "7.10.2"},
        "tagline": "You Know, for Search",
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let indices = state.db.read().await;
    Json(json!({
        "cluster_name": state.config.cluster_name,
        "status": "green",
        "number_of_indices": indices.len(),
    }))
}

async fn index_doc(
    State(state): State<AppState>,
    Path(index): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ClusterError> {
    let doc: Value = serde_json::from_slice(&body).map_err(|e| {
        ClusterError::new(
            StatusCode::BAD_REQUEST,
            "mapper_parsing_exception",
            format!("failed to parse: {e}"),
        )
    })?;
    if !doc.is_object() {
        return Err(ClusterError::new(
            StatusCode::BAD_REQUEST,
            "mapper_parsing_exception",
            "failed to parse, document is empty or not an object",
        ));
    }

    let id = Uuid::new_v4().to_string();
    state
        .db
        .write()
        .await
        .entry(index.clone())
        .or_default()
        .docs
        .push((id.clone(), doc));
    info!(%index, %id, "document indexed");

    Ok((
        StatusCode::CREATED,
        Json(json!({"_index": index, "_id": id, "result": "created"})),
    ))
}

async fn get_mapping(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> Result<Json<Value>, ClusterError> {
    let indices = state.db.read().await;
    let stored = indices
        .get(&index)
        .ok_or_else(|| ClusterError::index_not_found(&index))?;

    let mut properties = Map::new();
    for (_, doc) in &stored.docs {
        if let Some(fields) = doc.as_object() {
            for (field, value) in fields {
                properties
                    .entry(field.clone())
                    .or_insert_with(|| json!({"type": field_type(value)}));
            }
        }
    }

    let mut body = Map::new();
    body.insert(index, json!({"mappings": {"properties": properties}}));
    Ok(Json(Value::Object(body)))
}

async fn search(
    State(state): State<AppState>,
    Path(index): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ClusterError> {
    let request = parse_search(&body)?;
    let indices = state.db.read().await;
    let stored = indices
        .get(&index)
        .ok_or_else(|| ClusterError::index_not_found(&index))?;

    let matcher = Matcher::parse(request.query.as_ref())?;
    let matched: Vec<&(String, Value)> = stored
        .docs
        .iter()
        .filter(|(_, doc)| matcher.matches(doc))
        .collect();
    let total = matched.len();

    let hits: Vec<Value> = matched
        .into_iter()
        .skip(request.from.unwrap_or(0))
        .take(request.size.unwrap_or(10))
        .map(|(id, doc)| json!({"_index": index, "_id": id, "_score": 1.0, "_source": doc}))
        .collect();

    Ok(Json(json!({
        "took": 0,
        "timed_out": false,
        "hits": {
            "total": {"value": total, "relation": "eq"},
            "hits": hits,
        },
    })))
}

/// An empty or whitespace-only body is a search without a query.
fn parse_search(body: &[u8]) -> Result<SearchRequest, ClusterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SearchRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        ClusterError::new(
            StatusCode::BAD_REQUEST,
            "parsing_exception",
            format!("failed to parse search body: {e}"),
        )
    })
}

/// The subset of the query DSL the mock understands.
enum Matcher<'a> {
    All,
    Field { field: &'a str, value: &'a Value },
}

impl<'a> Matcher<'a> {
    fn parse(query: Option<&'a Value>) -> Result<Self, ClusterError> {
        let Some(query) = query else {
            return Ok(Matcher::All);
        };
        if query.get("match_all").is_some() {
            return Ok(Matcher::All);
        }
        if let Some((field, value)) = query
            .get("match")
            .and_then(Value::as_object)
            .and_then(|fields| fields.iter().next())
        {
            return Ok(Matcher::Field {
                field: field.as_str(),
                value,
            });
        }
        Err(ClusterError::new(
            StatusCode::BAD_REQUEST,
            "parsing_exception",
            format!("unknown query {query}"),
        ))
    }

    fn matches(&self, doc: &Value) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Field { field, value } => doc.get(*field) == Some(*value),
        }
    }
}

fn field_type(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "text",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "long",
        Value::Bool(_) => "boolean",
        Value::Object(_) => "object",
        Value::Array(items) => items.first().map(field_type).unwrap_or("text"),
        Value::Null => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_types_are_inferred() {
        assert_eq!(field_type(&json!("abc")), "text");
        assert_eq!(field_type(&json!(42)), "long");
        assert_eq!(field_type(&json!(4.2)), "float");
        assert_eq!(field_type(&json!(true)), "boolean");
        assert_eq!(field_type(&json!({"a": 1})), "object");
        assert_eq!(field_type(&json!([1, 2])), "long");
    }

    #[test]
    fn missing_query_matches_everything() {
        let matcher = Matcher::parse(None).ok().unwrap();
        assert!(matcher.matches(&json!({"title": "anything"})));
    }

    #[test]
    fn match_query_compares_field_value() {
        let query = json!({"match": {"title": "rust"}});
        let matcher = Matcher::parse(Some(&query)).ok().unwrap();
        assert!(matcher.matches(&json!({"title": "rust"})));
        assert!(!matcher.matches(&json!({"title": "python"})));
        assert!(!matcher.matches(&json!({"other": "rust"})));
    }

    #[test]
    fn unknown_query_is_rejected() {
        let query = json!({"fuzzy": {"title": "rst"}});
        assert!(Matcher::parse(Some(&query)).is_err());
    }

    #[test]
    fn empty_search_body_is_match_all() {
        let request = parse_search(b"").ok().unwrap();
        assert!(request.query.is_none());
        let request = parse_search(b" \n").ok().unwrap();
        assert!(request.size.is_none());
    }

    #[test]
    fn malformed_search_body_is_rejected() {
        let err = parse_search(b"{\"query\":").err().unwrap();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, "parsing_exception");
    }

    #[test]
    fn search_request_fields_are_optional() {
        let request: SearchRequest = serde_json::from_str("{}").unwrap();
        assert!(request.query.is_none());
        assert!(request.from.is_none());
        assert!(request.size.is_none());
    }
}
