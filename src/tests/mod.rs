//! Cross-module tests exercising the full analytics flow with stub
//! collaborators behind the production traits.

mod engine;
pub(crate) mod support;
