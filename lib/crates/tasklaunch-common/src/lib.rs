//! Core of the task-launch-request transform.
//!
//! Turns a static [`TransformConfig`] plus an inbound message into a
//! [`LaunchRequest`]. Pure and free of I/O; the processor service and the
//! CLI supply the channels around it.

pub mod builder;
pub mod channels;
pub mod config;
pub mod error;
pub mod message;
pub mod properties;
pub mod request;

pub use builder::{LaunchRequestBuilder, build_launch_request, transform};
pub use channels::validate_channel_key;
pub use config::TransformConfig;
pub use error::{BuildError, PropertyParseError};
pub use message::{APPLICATION_JSON, Headers, IncomingMessage, OutgoingMessage};
pub use properties::{parse_properties, split_command_line};
pub use request::{LaunchRequest, generate_application_name};
