//! News search tool backed by newsdata.io
//!
//! Searches the `/news` endpoint and normalizes the loosely shaped article
//! records into a stable set of fields before handing them to the model.
//! Requires an API key; without one the tool reports failure on every call.

use async_trait::async_trait;
use colloquy_core::tools::{BoxError, ToolHandler};
use colloquy_core::types::{FieldType, InputSchema, ToolDeclaration};
use serde_json::{json, Value};

const DEFAULT_LIMIT: i64 = 5;

/// Keyword search over newsdata.io articles
pub struct NewsTool {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsTool {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Declaration advertised to the model
    pub fn declaration() -> ToolDeclaration {
        ToolDeclaration::new(
            "news_tool",
            "Search news articles by query and optional filters.",
            InputSchema::new()
                .required("q", FieldType::String)
                .optional("language", FieldType::String)
                .optional("from_date", FieldType::String)
                .optional("to_date", FieldType::String)
                .optional("limit", FieldType::Integer),
        )
    }
}

#[async_trait]
impl ToolHandler for NewsTool {
    async fn call(&self, arguments: Value) -> Result<Value, BoxError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or("NEWSDATA_API_KEY is not configured")?;
        let q = arguments
            .get("q")
            .and_then(Value::as_str)
            .ok_or("missing required argument `q`")?;
        let limit = arguments
            .get("limit")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_LIMIT)
            .max(0) as usize;

        let mut params: Vec<(&str, String)> = vec![("q", q.to_string())];
        for (param, field) in [("language", "language"), ("from", "from_date"), ("to", "to_date")] {
            if let Some(value) = arguments.get(field).and_then(Value::as_str) {
                params.push((param, value.to_string()));
            }
        }
        params.push(("apikey", api_key.to_string()));

        let url = format!("{}/news", self.base_url.trim_end_matches('/'));
        let payload: Value = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Value::Array(normalize_articles(&payload, limit)))
    }
}

/// Pull the article list out of either envelope key and normalize it
fn normalize_articles(payload: &Value, limit: usize) -> Vec<Value> {
    payload
        .get("results")
        .or_else(|| payload.get("articles"))
        .and_then(Value::as_array)
        .map(|articles| articles.iter().take(limit).map(normalize_article).collect())
        .unwrap_or_default()
}

fn normalize_article(article: &Value) -> Value {
    // a source may be a plain name or an object carrying one
    let source = match article.get("source") {
        Some(Value::Object(map)) => map.get("name").cloned().unwrap_or(Value::Null),
        Some(other) => other.clone(),
        None => Value::Null,
    };

    json!({
        "title": article.get("title").cloned().unwrap_or(Value::Null),
        "description": article.get("description").cloned().unwrap_or(Value::Null),
        "link": non_empty(article, "link")
            .or_else(|| non_empty(article, "url"))
            .cloned()
            .unwrap_or(Value::Null),
        "source": source,
        "pubDate": non_empty(article, "pubDate")
            .or_else(|| non_empty(article, "pubDateISO"))
            .or_else(|| non_empty(article, "published_at"))
            .cloned()
            .unwrap_or(Value::Null),
        "language": article.get("language").cloned().unwrap_or(Value::Null),
    })
}

/// A null or empty-string field counts as absent for fallback purposes
fn non_empty<'a>(article: &'a Value, key: &str) -> Option<&'a Value> {
    match article.get(key) {
        Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        other => other,
    }
}
