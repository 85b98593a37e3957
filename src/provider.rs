//! # Provider Facets
//!
//! Typed metadata attached to graph nodes. A node may or may not expose each
//! facet; resolution logic branches explicitly on which facets are present
//! rather than on dynamic type inspection.

use std::fmt;

use crate::label::TargetId;

/// The name of a target in the generated build system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CMakeTarget(String);

impl CMakeTarget {
    pub fn new(name: impl Into<String>) -> Self {
        CMakeTarget(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CMakeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CMakeTarget {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CMakeTarget {
    fn from(name: &str) -> Self {
        CMakeTarget(name.to_string())
    }
}

impl From<String> for CMakeTarget {
    fn from(name: String) -> Self {
        CMakeTarget(name)
    }
}

/// The canonical name pair for one identity: the target name used to declare
/// the library and the namespaced alias other projects link against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMakeTargetPair {
    pub target: CMakeTarget,
    pub alias: CMakeTarget,
}

impl CMakeTargetPair {
    pub fn new(target: impl Into<CMakeTarget>, alias: impl Into<CMakeTarget>) -> Self {
        CMakeTargetPair {
            target: target.into(),
            alias: alias.into(),
        }
    }

    /// The name dependents link against.
    pub fn dep(&self) -> &CMakeTarget {
        &self.alias
    }
}

/// Compilation-unit facet: a node bundling schema source files, declared
/// dependencies, and an optional import-prefix-stripping rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoLibraryProvider {
    pub srcs: Vec<TargetId>,
    pub deps: Vec<TargetId>,
    pub strip_import_prefix: Option<String>,
}

/// Library-reference facet: the node already corresponds to a build-system
/// library construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMakeLibraryProvider {
    pub pair: CMakeTargetPair,
}

/// Files facet: the node stands for concrete file paths. Generated files
/// also carry the build-system dependencies that produce them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilesProvider {
    pub paths: Vec<String>,
    pub deps: Vec<CMakeTarget>,
}

/// Per-node facet record stored by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetInfo {
    pub proto: Option<ProtoLibraryProvider>,
    pub library: Option<CMakeLibraryProvider>,
    pub files: Option<FilesProvider>,
}

impl TargetInfo {
    /// A record exposing only the library-reference facet for `pair`.
    pub fn from_pair(pair: CMakeTargetPair) -> Self {
        TargetInfo {
            library: Some(CMakeLibraryProvider { pair }),
            ..TargetInfo::default()
        }
    }

    /// A record exposing only the files facet.
    pub fn from_files(files: FilesProvider) -> Self {
        TargetInfo {
            files: Some(files),
            ..TargetInfo::default()
        }
    }
}
