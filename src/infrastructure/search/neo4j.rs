//! Neo4j graph search over the HTTP transactional endpoint

use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::retrieval::{GraphRow, GraphSearchBackend};
use crate::domain::DomainError;

/// Vector index over interface nodes
pub const INTERFACE_INDEX: &str = "interface_embeddings";

const GRAPH_QUERY: &str = "\
CALL db.index.vector.queryNodes($index_name, $num_neighbors, $query_embedding) \
YIELD node AS similarNode, score \
MATCH (similarNode)-[r:REFERENCES]->(relatedNode) \
WHERE score >= $threshold \
RETURN similarNode.name AS name, similarNode.summary AS summary, relatedNode.name AS related_name, score";

/// Neo4j connection settings
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub timeout: Duration,
}

impl Neo4jConfig {
    pub fn new(
        uri: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            database: "neo4j".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }
}

/// Blocking Neo4j client.
///
/// The underlying HTTP client is created on first use, on the calling
/// (blocking) thread.
#[derive(Debug)]
pub struct Neo4jGraphBackend {
    config: Neo4jConfig,
    client: OnceCell<reqwest::blocking::Client>,
}

impl Neo4jGraphBackend {
    pub fn new(config: Neo4jConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, DomainError> {
        self.client.get_or_try_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(self.config.timeout)
                .build()
                .map_err(|e| DomainError::configuration(format!("Failed to build Neo4j client: {}", e)))
        })
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/db/{}/tx/commit",
            self.config.uri.trim_end_matches('/'),
            self.config.database
        )
    }

    fn parse_rows(response: Neo4jResponse) -> Result<Vec<GraphRow>, DomainError> {
        if let Some(error) = response.errors.into_iter().next() {
            return Err(DomainError::provider(
                "neo4j",
                format!("{}: {}", error.code, error.message),
            ));
        }

        let mut rows = Vec::new();
        for result in response.results {
            for record in result.data {
                rows.push(parse_row(&record.row)?);
            }
        }

        Ok(rows)
    }
}

fn parse_row(row: &[Value]) -> Result<GraphRow, DomainError> {
    let text = |idx: usize| -> String {
        match row.get(idx) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    };

    let score = row
        .get(3)
        .and_then(Value::as_f64)
        .ok_or_else(|| DomainError::provider("neo4j", "Row is missing a numeric score"))?;

    Ok(GraphRow {
        name: text(0),
        summary: text(1),
        related_name: text(2),
        score,
    })
}

impl GraphSearchBackend for Neo4jGraphBackend {
    fn graph_search(
        &self,
        vector: &[f32],
        threshold: f64,
        top_k: u32,
    ) -> Result<Vec<GraphRow>, DomainError> {
        let body = json!({
            "statements": [{
                "statement": GRAPH_QUERY,
                "parameters": {
                    "index_name": INTERFACE_INDEX,
                    "num_neighbors": top_k,
                    "query_embedding": vector,
                    "threshold": threshold,
                }
            }]
        });

        let response = self
            .client()?
            .post(self.commit_url())
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&body)
            .send()
            .map_err(|e| DomainError::provider("neo4j", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().unwrap_or_default();
            return Err(DomainError::provider(
                "neo4j",
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        let parsed: Neo4jResponse = response
            .json()
            .map_err(|e| DomainError::provider("neo4j", format!("Failed to parse response: {}", e)))?;

        let rows = Self::parse_rows(parsed)?;
        debug!(rows = rows.len(), "Graph search completed");

        Ok(rows)
    }
}

#[derive(Debug, Deserialize)]
struct Neo4jResponse {
    #[serde(default)]
    results: Vec<Neo4jResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct Neo4jResult {
    #[serde(default)]
    data: Vec<Neo4jRecord>,
}

#[derive(Debug, Deserialize)]
struct Neo4jRecord {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn search(server: &MockServer) -> Result<Vec<GraphRow>, DomainError> {
        let backend = Arc::new(Neo4jGraphBackend::new(Neo4jConfig::new(
            server.uri(),
            "neo4j",
            "secret",
        )));

        tokio::task::spawn_blocking(move || backend.graph_search(&[0.1, 0.2], 0.5, 5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_graph_search_parses_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/db/neo4j/tx/commit"))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({
                "statements": [{"parameters": {"num_neighbors": 5, "threshold": 0.5}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "columns": ["name", "summary", "related_name", "score"],
                    "data": [
                        {"row": ["IOrder", "Order contract", "ICustomer", 0.87], "meta": []},
                        {"row": ["IOrder", null, "IInvoice", 0.61], "meta": []}
                    ]
                }],
                "errors": []
            })))
            .mount(&server)
            .await;

        let rows = search(&server).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].related_name, "ICustomer");
        assert_eq!(rows[1].summary, "");
        assert_eq!(rows[1].score, 0.61);
    }

    #[tokio::test]
    async fn test_graph_search_surfaces_cypher_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [],
                "errors": [{"code": "Neo.ClientError.Procedure.ProcedureCallFailed", "message": "no such index"}]
            })))
            .mount(&server)
            .await;

        let err = search(&server).await.unwrap_err();
        assert!(err.to_string().contains("no such index"));
    }
}
