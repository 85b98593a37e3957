//! # CMake Fragment Generation
//!
//! Emitters for the generated build script: the generic library
//! declaration block and the proto translation core.

pub mod emit;
pub mod proto;

pub use proto::{btc_protobuf, generate_proto_library_target, PluginProfile};
