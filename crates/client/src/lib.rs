//! Promptify API client and template execution.
//!
//! This crate talks to the Promptify template service:
//! - `TemplateApi`: the API seam, with a reqwest implementation
//! - SSE decoding of the execution stream
//! - `ExecutionHandler`: drives one execution from submission to artifact
//!
//! # Example
//! ```no_run
//! use promptify_client::{create_client, ExecutionHandler, TemplateApi};
//! use promptify_core::AppConfig;
//! use promptify_template::FieldValues;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let api = create_client(&config)?;
//! let schema = api.get_template(12).await?.fields();
//!
//! let mut values = FieldValues::new();
//! values.insert("topic".into(), "tides".into());
//!
//! let generated = ExecutionHandler::new(api).execute(12, &schema, &values).await?;
//! println!("{}", generated.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod execution;
pub mod factory;
pub mod http;
pub mod payload;
pub mod sse;

#[cfg(test)]
mod tests;

// Re-export main types
pub use client::{
    EventStream, Execution, ExecutionRequest, ExecutionStream, PromptExecution, ServerEvent,
    TemplateApi,
};
pub use execution::{clean_output, ExecutionHandler, ExecutionState, GeneratedContent, Phase};
pub use factory::create_client;
pub use http::HttpTemplateApi;
