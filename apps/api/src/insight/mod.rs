//! The extraction pipeline: chunking, indexing, schema-guided querying,
//! validation, and skill relevance scoring.

pub mod chunker;
pub mod handlers;
pub mod index;
pub mod prompts;
pub mod query_engine;
pub mod schema;
pub mod session;
pub mod skill_matcher;
pub mod validator;
