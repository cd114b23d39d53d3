pub mod index_query;
pub mod web_retrieval;
