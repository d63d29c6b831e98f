//! Search backend implementations

mod azure_search;
mod neo4j;

pub use azure_search::{AzureSearchBackend, AzureSearchConfig, DEFAULT_SEARCH_API_VERSION};
pub use neo4j::{Neo4jConfig, Neo4jGraphBackend, INTERFACE_INDEX};
