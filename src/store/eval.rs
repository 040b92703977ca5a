//! Local evaluation of filter trees and aggregations over JSON documents.
//!
//! Reference semantics for the embedded stores: exact term matching,
//! word-containment matching, any-value semantics over arrays, per-element
//! evaluation of nested clauses. Relevance scoring is not modeled; hits keep
//! collection order unless a sort is requested.

use super::{SearchRequest, SearchResponse};
use crate::query::{normalize_text, AggregationSpec, Expr, MatchOperator, SortOrder, SortSpec};
use crate::result::{Bucket, RawHit};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Run `request` over `(id, document)` pairs in collection order
pub fn search<'a, I>(documents: I, request: &SearchRequest) -> SearchResponse
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let query = Prepared::new(&request.query);
    let matched: Vec<(&str, &Value)> = documents
        .into_iter()
        .filter(|(id, doc)| query.matches(id, doc))
        .collect();

    let aggregations = request
        .aggregations
        .iter()
        .map(|spec| {
            (
                spec.name.clone(),
                aggregate(spec, matched.iter().map(|(_, doc)| *doc)),
            )
        })
        .collect();

    let total_hits = matched.len() as u64;
    let mut window = matched;
    if !request.sort.is_empty() {
        window.sort_by(|(_, a), (_, b)| compare_by(&request.sort, a, b));
    }
    let hits = window
        .into_iter()
        .skip(request.from)
        .take(request.size)
        .map(|(id, doc)| RawHit {
            id: id.to_string(),
            source: doc.clone(),
        })
        .collect();

    SearchResponse {
        hits,
        aggregations,
        total_hits,
    }
}

/// Whether `doc` (stored under `id`) satisfies `expr`
pub fn matches(expr: &Expr, id: &str, doc: &Value) -> bool {
    Prepared::new(expr).matches(id, doc)
}

/// Filter tree prepared once per request; id lists become hash sets
enum Prepared<'q> {
    Ids(HashSet<&'q str>),
    Nested {
        path: &'q str,
        query: Box<Prepared<'q>>,
    },
    Bool {
        must: Vec<Prepared<'q>>,
        filter: Vec<Prepared<'q>>,
        must_not: Vec<Prepared<'q>>,
        should: Vec<Prepared<'q>>,
        required_should: usize,
    },
    Leaf(&'q Expr),
}

impl<'q> Prepared<'q> {
    fn new(expr: &'q Expr) -> Self {
        match expr {
            Expr::Ids(ids) => Prepared::Ids(ids.iter().map(String::as_str).collect()),
            Expr::Nested { path, query } => Prepared::Nested {
                path: path.as_str(),
                query: Box::new(Prepared::new(query)),
            },
            Expr::Bool(b) => Prepared::Bool {
                must: prepare_all(&b.must),
                filter: prepare_all(&b.filter),
                must_not: prepare_all(&b.must_not),
                should: prepare_all(&b.should),
                required_should: b.required_should(),
            },
            leaf => Prepared::Leaf(leaf),
        }
    }

    fn matches(&self, id: &str, doc: &Value) -> bool {
        match self {
            Prepared::Ids(ids) => ids.contains(id),
            Prepared::Nested { path, query } => nested_elements(doc, path)
                .iter()
                .any(|element| query.matches(id, element)),
            Prepared::Bool {
                must,
                filter,
                must_not,
                should,
                required_should,
            } => {
                must.iter().all(|e| e.matches(id, doc))
                    && filter.iter().all(|e| e.matches(id, doc))
                    && !must_not.iter().any(|e| e.matches(id, doc))
                    && (*required_should == 0
                        || should.iter().filter(|e| e.matches(id, doc)).count() >= *required_should)
            }
            Prepared::Leaf(expr) => matches_leaf(expr, id, doc),
        }
    }
}

fn prepare_all(exprs: &[Expr]) -> Vec<Prepared<'_>> {
    exprs.iter().map(Prepared::new).collect()
}

fn matches_leaf(expr: &Expr, id: &str, doc: &Value) -> bool {
    match expr {
        Expr::MatchAll => true,
        Expr::MatchNone => false,
        Expr::Term { field, value } => field_values(doc, field)
            .into_iter()
            .any(|candidate| scalar_eq(candidate, value)),
        Expr::Terms { field, values } => {
            let candidates = field_values(doc, field);
            values
                .iter()
                .any(|value| candidates.iter().any(|c| scalar_eq(c, value)))
        }
        Expr::Match {
            field,
            text,
            operator,
        } => {
            let wanted = words(&normalize_text(text));
            if wanted.is_empty() {
                return false;
            }
            // stored text may be decomposed; words compare in NFC
            let present: BTreeSet<String> = field_values(doc, field)
                .into_iter()
                .filter_map(Value::as_str)
                .flat_map(|s| words(&normalize_text(s)))
                .collect();
            match operator {
                MatchOperator::And => wanted.iter().all(|w| present.contains(w)),
                MatchOperator::Or => wanted.iter().any(|w| present.contains(w)),
            }
        }
        Expr::Prefix { field, prefix } => {
            let prefix = normalize_text(prefix).to_lowercase();
            field_values(doc, field)
                .into_iter()
                .filter_map(Value::as_str)
                .any(|s| normalize_text(s).to_lowercase().starts_with(&prefix))
        }
        Expr::Range { field, gte, lte } => field_values(doc, field).into_iter().any(|v| {
            // bounds of a different scalar type never match
            let lower_ok = gte.as_ref().map_or(true, |g| {
                matches!(compare_scalars(v, g), Some(Ordering::Greater | Ordering::Equal))
            });
            let upper_ok = lte.as_ref().map_or(true, |l| {
                matches!(compare_scalars(v, l), Some(Ordering::Less | Ordering::Equal))
            });
            lower_ok && upper_ok
        }),
        Expr::Exists { field } => field_values(doc, field)
            .into_iter()
            .any(|v| !v.is_null()),
        Expr::Ids(_) | Expr::Nested { .. } | Expr::Bool(_) => Prepared::new(expr).matches(id, doc),
    }
}

/// Terms aggregation: buckets ordered by count (desc) then key, cut at `size`
pub fn aggregate<'a, I>(spec: &AggregationSpec, documents: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut count_unit = |unit: &Value| {
        let keys: BTreeSet<String> = field_values(unit, &spec.field)
            .into_iter()
            .filter_map(bucket_key)
            .collect();
        for key in keys {
            *counts.entry(key).or_insert(0) += 1;
        }
    };
    for doc in documents {
        match &spec.nested_path {
            Some(path) => {
                for element in nested_elements(doc, path) {
                    count_unit(&element);
                }
            }
            None => count_unit(doc),
        }
    }
    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(key, doc_count)| Bucket { key, doc_count })
        .collect();
    buckets.sort_by(|a, b| b.doc_count.cmp(&a.doc_count).then_with(|| a.key.cmp(&b.key)));
    buckets.truncate(spec.size);
    buckets
}

/// All values reachable under a dotted path; arrays are flattened at every level
pub fn field_values<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current: Vec<&Value> = vec![doc];
    for key in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            collect_member(value, key, &mut next);
        }
        current = next;
    }
    let mut flattened = Vec::new();
    for value in current {
        flatten_into(value, &mut flattened);
    }
    flattened
}

fn collect_member<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if let Some(member) = map.get(key) {
                out.push(member);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_member(item, key, out);
            }
        }
        _ => {}
    }
}

fn flatten_into<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        other => out.push(other),
    }
}

/// Each object under `path`, re-rooted so full dotted field names still resolve
fn nested_elements(doc: &Value, path: &str) -> Vec<Value> {
    field_values(doc, path)
        .into_iter()
        .filter(|v| v.is_object())
        .map(|element| wrap_at_path(path, element.clone()))
        .collect()
}

fn wrap_at_path(path: &str, element: Value) -> Value {
    path.rsplit('.').fold(element, |inner, key| {
        let mut map = Map::new();
        map.insert(key.to_string(), inner);
        Value::Object(map)
    })
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn bucket_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_eq(candidate: &Value, wanted: &Value) -> bool {
    if candidate == wanted {
        return true;
    }
    match (bucket_key(candidate), bucket_key(wanted)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_by(sort: &[SortSpec], a: &Value, b: &Value) -> Ordering {
    for spec in sort {
        let left = field_values(a, &spec.field).into_iter().find(|v| !v.is_null());
        let right = field_values(b, &spec.field).into_iter().find(|v| !v.is_null());
        let ordering = match (left, right) {
            (Some(l), Some(r)) => {
                let ord = compare_scalars(l, r).unwrap_or(Ordering::Equal);
                match spec.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            }
            // missing values sort last in either direction
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
