// Application generation: prompt templates, the three-stage orchestrator and
// the score/analysis parser. All model calls go through llm_client.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod score_parser;
