//! Document retrieval from vector and graph backends

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::retrieval::{
    GraphRow, GraphSearchBackend, RetrievalStrategy, RetrieverDescriptor, RetrieverKind,
    SearchResult, SearchRow, VectorSearchBackend, VectorSearchRequest, SEARCH_SCORE_FIELD,
    VECTOR_FIELD,
};
use crate::domain::DomainError;

/// Fallback name for rows without a `name` mapping
const UNNAMED: &str = "N/A";

/// Backends available to retrieval strategies
#[derive(Debug, Clone)]
pub struct RetrievalBackends {
    vector: Option<Arc<dyn VectorSearchBackend>>,
    graph: Option<Arc<dyn GraphSearchBackend>>,
    graph_permits: Arc<Semaphore>,
}

impl RetrievalBackends {
    /// `graph_concurrency` bounds blocking graph calls in flight
    pub fn new(graph_concurrency: usize) -> Self {
        Self {
            vector: None,
            graph: None,
            graph_permits: Arc::new(Semaphore::new(graph_concurrency.max(1))),
        }
    }

    pub fn with_vector(mut self, backend: Arc<dyn VectorSearchBackend>) -> Self {
        self.vector = Some(backend);
        self
    }

    pub fn with_graph(mut self, backend: Arc<dyn GraphSearchBackend>) -> Self {
        self.graph = Some(backend);
        self
    }
}

/// Nearest-neighbour search on a vector index, projected through the
/// retriever's field mappings
#[derive(Debug)]
pub struct VectorDatabase {
    backend: Arc<dyn VectorSearchBackend>,
    descriptor: RetrieverDescriptor,
}

impl VectorDatabase {
    pub fn new(backend: Arc<dyn VectorSearchBackend>, descriptor: RetrieverDescriptor) -> Self {
        Self {
            backend,
            descriptor,
        }
    }
}

#[async_trait]
impl RetrievalStrategy for VectorDatabase {
    async fn execute_async(
        &self,
        vector: &[f32],
        threshold: f64,
        top_k: u32,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let index = self.descriptor.index_name().ok_or_else(|| {
            DomainError::configuration(format!(
                "Retriever '{}' has no index name",
                self.descriptor.name()
            ))
        })?;

        let request = VectorSearchRequest {
            index: index.to_string(),
            vector: vector.to_vec(),
            select: self.descriptor.select_fields().to_vec(),
            top_k,
            field: VECTOR_FIELD,
        };

        let rows = self.backend.vector_search(&request).await?;
        let total = rows.len();
        let results: Vec<SearchResult> = rows
            .iter()
            .filter_map(|row| map_row(row, self.descriptor.field_mappings(), threshold))
            .collect();

        debug!(
            retriever = self.descriptor.name(),
            hits = total,
            kept = results.len(),
            threshold,
            "Vector retrieval completed"
        );

        Ok(results)
    }

    fn kind(&self) -> RetrieverKind {
        RetrieverKind::Vector
    }
}

/// Project a backend row onto a search result.
///
/// Rows without a score, or scoring below the threshold, are dropped.
fn map_row(
    row: &SearchRow,
    mappings: &BTreeMap<String, String>,
    threshold: f64,
) -> Option<SearchResult> {
    let score = row.get(SEARCH_SCORE_FIELD)?.as_f64()?;

    if score < threshold {
        return None;
    }

    let field = |target: &str| -> Option<String> {
        mappings.get(target).map(|path| {
            nested_value(row, path)
                .filter(|v| !v.is_empty())
                .or_else(|| row.get(path.as_str()).map(value_to_string))
                .unwrap_or_default()
        })
    };

    Some(SearchResult::new(
        field("name").unwrap_or_else(|| UNNAMED.to_string()),
        field("summary").unwrap_or_default(),
        field("content").unwrap_or_default(),
        score,
        RetrieverKind::Vector,
    ))
}

/// Resolve a dotted path through nested objects
fn nested_value(row: &SearchRow, path: &str) -> Option<String> {
    let mut parts = path.split('.');
    let mut current = row.get(parts.next()?)?;

    for part in parts {
        current = current.as_object()?.get(part)?;
    }

    Some(value_to_string(current))
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Graph traversal from similar nodes to the nodes they reference.
///
/// The graph client is blocking: the async entry point runs it on the
/// blocking pool, bounded by a shared semaphore.
#[derive(Debug)]
pub struct GraphDatabase {
    backend: Arc<dyn GraphSearchBackend>,
    permits: Arc<Semaphore>,
}

impl GraphDatabase {
    pub fn new(backend: Arc<dyn GraphSearchBackend>, permits: Arc<Semaphore>) -> Self {
        Self { backend, permits }
    }
}

fn graph_results(rows: Vec<GraphRow>, threshold: f64) -> Vec<SearchResult> {
    rows.into_iter()
        .filter(|r| r.score >= threshold)
        .map(|r| {
            let content = format!("{} ({}) references {}", r.name, r.summary, r.related_name);
            SearchResult::new(r.name, r.summary, content, r.score, RetrieverKind::Graph)
        })
        .collect()
}

#[async_trait]
impl RetrievalStrategy for GraphDatabase {
    async fn execute_async(
        &self,
        vector: &[f32],
        threshold: f64,
        top_k: u32,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DomainError::internal(format!("Graph worker pool closed: {}", e)))?;

        let backend = self.backend.clone();
        let vector = vector.to_vec();

        let rows = tokio::task::spawn_blocking(move || backend.graph_search(&vector, threshold, top_k))
            .await
            .map_err(|e| DomainError::internal(format!("Graph search task failed: {}", e)))??;

        debug!(rows = rows.len(), threshold, "Graph retrieval completed");
        Ok(graph_results(rows, threshold))
    }

    fn execute(
        &self,
        vector: &[f32],
        threshold: f64,
        top_k: u32,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let rows = self.backend.graph_search(vector, threshold, top_k)?;
        Ok(graph_results(rows, threshold))
    }

    fn kind(&self) -> RetrieverKind {
        RetrieverKind::Graph
    }
}

/// Factory for retrieval strategies.
///
/// Fails fast when the retriever's backend is not configured.
#[derive(Debug)]
pub struct RetrievalFactory;

impl RetrievalFactory {
    pub fn create(
        descriptor: &RetrieverDescriptor,
        backends: &RetrievalBackends,
    ) -> Result<Arc<dyn RetrievalStrategy>, DomainError> {
        match descriptor.kind() {
            RetrieverKind::Vector => {
                let backend = backends.vector.clone().ok_or_else(|| {
                    DomainError::configuration("Vector search backend is not configured")
                })?;
                Ok(Arc::new(VectorDatabase::new(backend, descriptor.clone())))
            }
            RetrieverKind::Graph => {
                let backend = backends.graph.clone().ok_or_else(|| {
                    DomainError::configuration("Graph database backend is not configured")
                })?;
                Ok(Arc::new(GraphDatabase::new(
                    backend,
                    backends.graph_permits.clone(),
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::retrieval::{MockGraphSearchBackend, MockVectorSearchBackend};
    use crate::domain::EmbeddingModel;
    use serde_json::json;
    use std::time::Duration;

    fn descriptor(mappings: &[(&str, &str)]) -> RetrieverDescriptor {
        RetrieverDescriptor::vector(
            "docs",
            "docs-index",
            EmbeddingModel::default(),
            vec!["name".to_string(), "content".to_string()],
            mappings
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .unwrap()
    }

    fn backend_with_scores(scores: &[f64]) -> MockVectorSearchBackend {
        scores.iter().enumerate().fold(MockVectorSearchBackend::new(), |b, (i, s)| {
            b.with_row(json!({"@search.score": s, "name": format!("doc-{}", i), "content": "text"}))
        })
    }

    #[tokio::test]
    async fn test_vector_threshold_filtering() {
        let backend = Arc::new(backend_with_scores(&[0.9, 0.4, 0.6]));
        let strategy = VectorDatabase::new(
            backend.clone(),
            descriptor(&[("name", "name"), ("content", "content")]),
        );

        let results = strategy.execute_async(&[0.1, 0.2], 0.5, 5).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score >= 0.5));
        assert!(results.iter().all(|r| r.kind == RetrieverKind::Vector));

        let request = &backend.requests()[0];
        assert_eq!(request.index, "docs-index");
        assert_eq!(request.top_k, 5);
        assert_eq!(request.field, "embedding");
    }

    #[tokio::test]
    async fn test_rows_without_score_are_dropped() {
        let backend = Arc::new(
            MockVectorSearchBackend::new()
                .with_row(json!({"name": "no-score", "content": "x"}))
                .with_row(json!({"@search.score": 0.8, "name": "scored", "content": "y"})),
        );
        let strategy = VectorDatabase::new(backend, descriptor(&[("name", "name")]));

        let results = strategy.execute_async(&[0.0], 0.0, 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "scored");
    }

    #[test]
    fn test_field_mapping_nested_flat_and_defaults() {
        let row = json!({
            "@search.score": 0.7,
            "metadata": {"function_name": "SUMIF"},
            "chunk": "Sums cells by condition",
            "meta.flat": "flat value"
        });
        let row = row.as_object().unwrap();

        let mappings: BTreeMap<String, String> = [
            ("name", "metadata.function_name"),
            ("content", "chunk"),
            ("summary", "meta.flat"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let result = map_row(row, &mappings, 0.5).unwrap();
        assert_eq!(result.name, "SUMIF");
        assert_eq!(result.content, "Sums cells by condition");
        assert_eq!(result.summary, "flat value");

        let only_content: BTreeMap<String, String> =
            [("content".to_string(), "chunk".to_string())].into_iter().collect();
        let result = map_row(row, &only_content, 0.5).unwrap();
        assert_eq!(result.name, "N/A");
        assert_eq!(result.summary, "");

        let missing: BTreeMap<String, String> =
            [("name".to_string(), "does.not.exist".to_string())].into_iter().collect();
        assert_eq!(map_row(row, &missing, 0.5).unwrap().name, "");
    }

    #[tokio::test]
    async fn test_graph_content_format() {
        let backend = Arc::new(
            MockGraphSearchBackend::new()
                .with_row("IOrder", "Order contract", "ICustomer", 0.9)
                .with_row("IStock", "Stock levels", "IWarehouse", 0.3),
        );
        let strategy = GraphDatabase::new(backend, Arc::new(Semaphore::new(2)));

        let results = strategy.execute_async(&[0.1], 0.5, 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "IOrder (Order contract) references ICustomer");
        assert_eq!(results[0].kind, RetrieverKind::Graph);
    }

    #[test]
    fn test_graph_blocking_entry_point() {
        let backend = Arc::new(MockGraphSearchBackend::new().with_row("A", "a", "B", 0.8));
        let strategy = GraphDatabase::new(backend, Arc::new(Semaphore::new(1)));

        let results = strategy.execute(&[0.1], 0.5, 5).unwrap();
        assert_eq!(results[0].content, "A (a) references B");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_graph_offload_is_bounded() {
        let backend = Arc::new(
            MockGraphSearchBackend::new()
                .with_row("A", "a", "B", 0.8)
                .with_delay(Duration::from_millis(50)),
        );
        let strategy = Arc::new(GraphDatabase::new(backend.clone(), Arc::new(Semaphore::new(2))));

        let calls = (0..6).map(|_| {
            let strategy = strategy.clone();
            async move { strategy.execute_async(&[0.1], 0.5, 5).await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert!(backend.max_in_flight() <= 2);
    }

    #[test]
    fn test_factory_fails_fast_without_backend() {
        let backends = RetrievalBackends::new(4);
        let graph = RetrieverDescriptor::graph("g", EmbeddingModel::default()).unwrap();

        let result = RetrievalFactory::create(&graph, &backends);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));

        let vector = descriptor(&[("name", "name")]);
        let result = RetrievalFactory::create(&vector, &backends);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_factory_selects_by_kind() {
        let backends = RetrievalBackends::new(4)
            .with_vector(Arc::new(MockVectorSearchBackend::new()))
            .with_graph(Arc::new(MockGraphSearchBackend::new()));

        let graph = RetrieverDescriptor::graph("g", EmbeddingModel::default()).unwrap();
        assert_eq!(
            RetrievalFactory::create(&graph, &backends).unwrap().kind(),
            RetrieverKind::Graph
        );
        assert_eq!(
            RetrievalFactory::create(&descriptor(&[("name", "name")]), &backends)
                .unwrap()
                .kind(),
            RetrieverKind::Vector
        );
    }
}
