//! Retrieval strategy implementations and the per-step runner

mod post_retrieval;
mod pre_retrieval;
#[allow(clippy::module_inception)]
mod retrieval;
mod step;

pub use post_retrieval::{DefaultPostRetrieval, PostRetrievalFactory};
pub use pre_retrieval::{
    DefaultPreRetrieval, Hyde, PreRetrievalFactory, QueryExpansion, RephraseAndRespond,
    RewriteRetrieveRead, StepBackPrompting, TransformationLlm,
};
pub use retrieval::{GraphDatabase, RetrievalBackends, RetrievalFactory, VectorDatabase};
pub use step::RetrievalStep;
pub(crate) use step::elapsed_ms;
