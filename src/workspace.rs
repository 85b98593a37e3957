//! # Workspace Description
//!
//! The loader-boundary input: a serde-serializable value describing the
//! source dependency graph for one repository. Host tooling produces it
//! (or tests build it programmatically); registration resolves every label
//! against its declaring package and populates the evaluation state.

use serde::{Deserialize, Serialize};

use crate::context::TranslationContext;
use crate::error::Error;
use crate::label::{PackageId, RepositoryId};
use crate::provider::{
    CMakeLibraryProvider, CMakeTarget, FilesProvider, ProtoLibraryProvider, TargetInfo,
};
use crate::rules;

/// Everything known about the repository being translated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceDescription {
    /// The repository whose declarations are translated. Its targets must
    /// exist; foreign targets may be absent.
    pub repository: String,
    /// CMake project prefix used when deriving canonical target names.
    pub project: String,
    /// Project prefixes of foreign repositories, for blind-linking their
    /// targets by convention.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<RepositoryProject>,
    /// Persisted mappings to pre-existing CMake targets,
    /// e.g. `@com_google_protobuf//:protoc` => `protobuf::protoc`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<TargetMapping>,
    /// Package blocks in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryProject {
    pub repository: String,
    pub project: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetMapping {
    pub label: String,
    pub cmake: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageDescription {
    /// Package spec, e.g. `//tensor/proto` or a bare path.
    pub package: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proto_libraries: Vec<ProtoLibraryDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc_proto_libraries: Vec<CcProtoLibraryDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileEntry>,
}

/// One `proto_library` declaration: a schema-compilation unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtoLibraryDecl {
    pub name: String,
    #[serde(default)]
    pub srcs: Vec<String>,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_import_prefix: Option<String>,
}

/// One `cc_proto_library` declaration: the aggregate rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CcProtoLibraryDecl {
    pub name: String,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub extra_deps: Vec<String>,
    #[serde(default)]
    pub visibility: Vec<String>,
}

/// A node standing for concrete files, e.g. generated schema sources, with
/// the CMake targets that produce them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileEntry {
    pub label: String,
    pub paths: Vec<String>,
    #[serde(default)]
    pub deps: Vec<String>,
}

impl WorkspaceDescription {
    pub fn new(repository: impl Into<String>, project: impl Into<String>) -> Self {
        WorkspaceDescription {
            repository: repository.into(),
            project: project.into(),
            ..WorkspaceDescription::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn repository_id(&self) -> RepositoryId {
        RepositoryId::new(&self.repository)
    }

    /// Register every declared target into the evaluation state. Each
    /// `proto_library` gets its compilation-unit facet plus its canonical
    /// library facet; file entries get a files facet.
    pub(crate) fn register_targets(&self, ctx: &mut TranslationContext) -> Result<(), Error> {
        let repo = self.repository_id();
        let root = repo.root_package();

        for entry in &self.repositories {
            ctx.state
                .add_repository_project(&entry.repository, &entry.project);
        }

        for mapping in &self.mappings {
            let target = root.parse_label(&mapping.label)?;
            ctx.state.add_target_mapping(
                target,
                mapping.cmake.iter().map(CMakeTarget::new).collect(),
            );
        }

        for package_desc in &self.packages {
            let package = PackageId::parse(&repo, &package_desc.package)?;

            for decl in &package_desc.proto_libraries {
                let target = package.parse_target(&decl.name)?;
                let srcs = decl
                    .srcs
                    .iter()
                    .map(|label| package.parse_label(label))
                    .collect::<Result<Vec<_>, _>>()?;
                let deps = decl
                    .deps
                    .iter()
                    .map(|label| package.parse_label(label))
                    .collect::<Result<Vec<_>, _>>()?;
                let pair = ctx.state.generate_cmake_target_pair(&target);
                ctx.state.add_analyzed_target(
                    target,
                    TargetInfo {
                        proto: Some(ProtoLibraryProvider {
                            srcs,
                            deps,
                            strip_import_prefix: decl.strip_import_prefix.clone(),
                        }),
                        library: Some(CMakeLibraryProvider { pair }),
                        files: None,
                    },
                );
            }

            for entry in &package_desc.files {
                let target = package.parse_label(&entry.label)?;
                ctx.state.add_analyzed_target(
                    target,
                    TargetInfo::from_files(FilesProvider {
                        paths: entry.paths.clone(),
                        deps: entry.deps.iter().map(CMakeTarget::new).collect(),
                    }),
                );
            }
        }
        Ok(())
    }

    /// Queue every declared aggregate rule, in declaration order.
    pub(crate) fn queue_rules(&self, ctx: &mut TranslationContext) -> Result<(), Error> {
        let repo = self.repository_id();
        for package_desc in &self.packages {
            let package = PackageId::parse(&repo, &package_desc.package)?;
            ctx.set_caller_package(package);
            for decl in &package_desc.cc_proto_libraries {
                rules::cc_proto_library(
                    ctx,
                    &decl.name,
                    decl.deps.clone(),
                    decl.extra_deps.clone(),
                    decl.visibility.clone(),
                )?;
            }
        }
        Ok(())
    }
}
