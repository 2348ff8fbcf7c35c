//! Prompt gateway for GemelliFix's assistant features.
//!
//! Callers never talk to a model directly. They pick a [`PromptId`], hand a
//! JSON input to a [`PromptGateway`] and get JSON back; [`run_flow`] wraps
//! that in typed input/output structs. The production gateway is
//! [`HttpGateway`]; tests use [`StaticGateway`].

pub mod error;
pub mod flows;
pub mod gateway;
pub mod http;
pub mod prompt;

pub use error::AiError;
pub use flows::{run_flow, Flow};
pub use gateway::{DisabledGateway, PromptGateway, StaticGateway};
pub use http::{HttpGateway, HttpGatewayConfig};
pub use prompt::PromptId;
