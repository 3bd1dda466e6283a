//! Command handlers for the Promptify CLI.

pub mod auth;
pub mod fields;
pub mod run;
pub mod templates;

// Re-export command types for convenience
pub use auth::AuthCommand;
pub use fields::FieldsCommand;
pub use run::RunCommand;
pub use templates::TemplatesCommand;
