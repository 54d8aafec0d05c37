pub mod llm;
pub mod quiz_generator;
pub mod quiz_session;
