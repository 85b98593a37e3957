//! # proto2cmake
//!
//! Translates Bazel-style `proto_library` / `cc_proto_library` dependency
//! graphs into CMake script fragments that compile protocol-buffer schemas
//! with the `btc_protobuf` helper and link them into libraries.
//!
//! Generated targets carry canonical names derived from their source
//! identity, so cross-project dependencies can "blind" link to them by
//! convention even when the foreign graph is only partially known.
//! Well-known schema references are never regenerated; they redirect to the
//! shared protobuf runtime.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use proto2cmake::translate_json;
//!
//! let translation = translate_json(r#"{
//!     "repository": "main",
//!     "project": "CMakeProject",
//!     "mappings": [
//!         {"label": "@com_google_protobuf//:protoc", "cmake": ["protobuf::protoc"]},
//!         {"label": "@com_google_protobuf//:protobuf", "cmake": ["protobuf::libprotobuf"]}
//!     ],
//!     "packages": [{
//!         "package": "//tensor/proto",
//!         "proto_libraries": [{"name": "schema_proto", "srcs": ["schema.proto"]}],
//!         "cc_proto_libraries": [{"name": "schema_cc_proto", "deps": [":schema_proto"]}]
//!     }]
//! }"#)?;
//!
//! std::fs::write("generated.cmake", translation.script)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! Translation runs as a single-threaded, depth-first pipeline:
//!
//! 1. **Registration** - Resolve every declared label and populate the
//!    evaluation state with provider facets
//! 2. **Rule Queueing** - Record `cc_proto_library` declarations as
//!    deferred rules
//! 3. **Evaluation** - Each rule recursively resolves its proto
//!    dependencies, memoized per generated identity
//! 4. **Emission** - Library declarations and `btc_protobuf` invocations
//!    accumulate on the shared script builder in traversal order

pub mod builder;
pub mod codegen;
pub mod compiler;
pub mod context;
pub mod error;
pub mod evaluation;
pub mod label;
pub mod provider;
pub mod rules;
pub mod workspace;

// Re-export the main translation API
pub use compiler::{translate, translate_json, Translation};

pub use error::Error;
pub use evaluation::{Diagnostic, EvaluationState};
pub use label::{PackageId, RepositoryId, TargetId};
pub use provider::{
    CMakeLibraryProvider, CMakeTarget, CMakeTargetPair, FilesProvider, ProtoLibraryProvider,
    TargetInfo,
};
pub use workspace::{
    CcProtoLibraryDecl, FileEntry, PackageDescription, ProtoLibraryDecl, RepositoryProject,
    TargetMapping, WorkspaceDescription,
};
