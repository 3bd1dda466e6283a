//! Tests against a mock Promptify server.

mod http_execution;
