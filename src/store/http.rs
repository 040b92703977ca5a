//! HTTP client for an Elasticsearch-compatible search service
//!
//! Filter trees and aggregations are rendered into the service's JSON query
//! DSL; nested aggregations wrap their terms aggregation under `inner`.

use super::{SearchRequest, SearchResponse, StoreClient};
use crate::error::StoreError;
use crate::query::{AggregationSpec, BoolExpr, Expr, MatchOperator, SortOrder};
use crate::result::{Bucket, RawHit};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the terms aggregation nested inside a `nested` aggregation
const NESTED_INNER: &str = "inner";

fn map_http_error(error: reqwest::Error, timeout: Duration) -> StoreError {
    if error.is_timeout() {
        StoreError::Timeout(timeout)
    } else if error.is_connect() {
        StoreError::Request(format!("Connection error: {}", error))
    } else {
        StoreError::Request(format!("HTTP error: {}", error))
    }
}

pub struct HttpStore {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, StoreError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| map_http_error(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl StoreClient for HttpStore {
    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let url = format!("{}/{}/_search", self.base_url, collection);
        let body = render_search(request);
        debug!(url = %url, from = request.from, size = request.size, "Sending search");
        let response = self.post(&url, &body).await?;
        parse_search_response(response)
    }

    async fn multi_get(&self, collection: &str, ids: &[String]) -> Result<Vec<RawHit>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/{}/_mget", self.base_url, collection);
        let response = self.post(&url, &json!({ "ids": ids })).await?;
        parse_mget_response(response)
    }

    fn backend_name(&self) -> &str {
        "http"
    }
}

/// Full `_search` request body
pub fn render_search(request: &SearchRequest) -> Value {
    let mut body = Map::new();
    body.insert("query".to_string(), render_query(&request.query));
    body.insert("from".to_string(), json!(request.from));
    body.insert("size".to_string(), json!(request.size));
    body.insert("track_total_hits".to_string(), json!(true));
    if !request.sort.is_empty() {
        let sort: Vec<Value> = request
            .sort
            .iter()
            .map(|s| {
                let order = match s.order {
                    SortOrder::Asc => "asc",
                    SortOrder::Desc => "desc",
                };
                json!({ s.field.as_str(): { "order": order } })
            })
            .collect();
        body.insert("sort".to_string(), Value::Array(sort));
    }
    if !request.aggregations.is_empty() {
        let aggs: Map<String, Value> = request
            .aggregations
            .iter()
            .map(|spec| (spec.name.clone(), render_aggregation(spec)))
            .collect();
        body.insert("aggs".to_string(), Value::Object(aggs));
    }
    Value::Object(body)
}

pub fn render_query(expr: &Expr) -> Value {
    match expr {
        Expr::MatchAll => json!({ "match_all": {} }),
        Expr::MatchNone => json!({ "match_none": {} }),
        Expr::Term { field, value } => json!({ "term": { field.as_str(): value } }),
        Expr::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
        Expr::Ids(ids) => json!({ "ids": { "values": ids } }),
        Expr::Match {
            field,
            text,
            operator,
        } => {
            let operator = match operator {
                MatchOperator::And => "and",
                MatchOperator::Or => "or",
            };
            json!({ "match": { field.as_str(): { "query": text, "operator": operator } } })
        }
        Expr::Prefix { field, prefix } => json!({ "prefix": { field.as_str(): prefix } }),
        Expr::Range { field, gte, lte } => {
            let mut bounds = Map::new();
            if let Some(gte) = gte {
                bounds.insert("gte".to_string(), gte.clone());
            }
            if let Some(lte) = lte {
                bounds.insert("lte".to_string(), lte.clone());
            }
            json!({ "range": { field.as_str(): bounds } })
        }
        Expr::Exists { field } => json!({ "exists": { "field": field } }),
        Expr::Nested { path, query } => {
            json!({ "nested": { "path": path, "query": render_query(query) } })
        }
        Expr::Bool(bool_expr) => render_bool(bool_expr),
    }
}

fn render_bool(expr: &BoolExpr) -> Value {
    let mut clauses = Map::new();
    for (occur, list) in [
        ("must", &expr.must),
        ("should", &expr.should),
        ("filter", &expr.filter),
        ("must_not", &expr.must_not),
    ] {
        if !list.is_empty() {
            clauses.insert(
                occur.to_string(),
                Value::Array(list.iter().map(render_query).collect()),
            );
        }
    }
    if let Some(minimum) = expr.minimum_should_match {
        clauses.insert("minimum_should_match".to_string(), json!(minimum));
    }
    json!({ "bool": clauses })
}

pub fn render_aggregation(spec: &AggregationSpec) -> Value {
    let terms = json!({ "terms": { "field": spec.field, "size": spec.size } });
    match &spec.nested_path {
        Some(path) => json!({
            "nested": { "path": path },
            "aggs": { NESTED_INNER: terms },
        }),
        None => terms,
    }
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    hits: HitsBody,
    #[serde(default)]
    aggregations: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct HitsBody {
    #[serde(default)]
    total: Option<Value>,
    #[serde(default)]
    hits: Vec<HitBody>,
}

#[derive(Debug, Deserialize)]
struct HitBody {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Value,
}

#[derive(Debug, Deserialize)]
struct MgetBody {
    #[serde(default)]
    docs: Vec<MgetDoc>,
}

#[derive(Debug, Deserialize)]
struct MgetDoc {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source", default)]
    source: Value,
}

pub fn parse_search_response(body: Value) -> Result<SearchResponse, StoreError> {
    let body: SearchBody = serde_json::from_value(body)
        .map_err(|e| StoreError::Decode(format!("Malformed search response: {}", e)))?;

    // `total` is either a bare number or `{ "value": n, "relation": .. }`
    let total_hits = match &body.hits.total {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(total) => total.get("value").and_then(Value::as_u64).unwrap_or(0),
        None => body.hits.hits.len() as u64,
    };

    let hits = body
        .hits
        .hits
        .into_iter()
        .map(|hit| RawHit {
            id: hit.id,
            source: hit.source,
        })
        .collect();

    let aggregations = body
        .aggregations
        .iter()
        .map(|(name, agg)| (name.clone(), parse_buckets(agg)))
        .collect();

    Ok(SearchResponse {
        hits,
        aggregations,
        total_hits,
    })
}

fn parse_buckets(agg: &Value) -> Vec<Bucket> {
    let buckets = agg
        .get("buckets")
        .or_else(|| agg.get(NESTED_INNER).and_then(|inner| inner.get("buckets")))
        .and_then(Value::as_array);
    let Some(buckets) = buckets else {
        return Vec::new();
    };
    buckets
        .iter()
        .filter_map(|bucket| {
            let key = match bucket.get("key")? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let doc_count = bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0);
            Some(Bucket::new(key, doc_count))
        })
        .collect()
}

pub fn parse_mget_response(body: Value) -> Result<Vec<RawHit>, StoreError> {
    let body: MgetBody = serde_json::from_value(body)
        .map_err(|e| StoreError::Decode(format!("Malformed multi-get response: {}", e)))?;
    Ok(body
        .docs
        .into_iter()
        .filter(|doc| doc.found)
        .map(|doc| RawHit {
            id: doc.id,
            source: doc.source,
        })
        .collect())
}
