//! # Wharf Connector
//!
//! The boundary between a workflow host and connector plugins.
//!
//! A connector receives an operation id plus two case-insensitive parameter
//! maps (connection and request) and always answers with a [`Response`]:
//! a JSON body and an HTTP status code. Failures are mapped onto status codes
//! here and never travel back to the host as errors.
//!
//! ## Core types
//!
//! - [`Connector`]: trait implemented by each plugin
//! - [`Parameters`]: case-insensitive JSON parameter map
//! - [`Response`]: body + status envelope
//! - [`ConnectorError`]: error taxonomy with status mapping
//! - [`ConnectorRegistry`]: service id → connector lookup

pub mod connector;
pub mod error;
pub mod parameters;
pub mod registry;
pub mod response;

pub use connector::{Connector, OperationDescriptor};
pub use error::ConnectorError;
pub use parameters::Parameters;
pub use registry::ConnectorRegistry;
pub use response::{Response, content_envelope};
