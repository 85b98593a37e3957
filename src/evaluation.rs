//! # Evaluation State
//!
//! Per-pass provider store and memoization cache, plus the lookup services
//! the emitters depend on: dependency-name resolution, file-path resolution,
//! canonical name-pair generation, and the structured diagnostic channel for
//! tolerated degradations.
//!
//! The store is written once per identity: `add_analyzed_target` never
//! overwrites, so an already-recorded result is authoritative. This is the
//! sole mechanism preventing duplicate generation when multiple translation
//! paths reach the same node.

use std::collections::HashMap;
use std::fmt;

use crate::error::Error;
use crate::label::{PackageId, RepositoryId, TargetId};
use crate::provider::{CMakeTarget, CMakeTargetPair, TargetInfo};

/// A tolerated degradation recorded during resolution. Diagnostics never
/// change the outcome of the pass; they exist so callers and tests can
/// observe degraded resolutions without parsing console text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A cross-repository compilation unit could not be found. A stand-in
    /// identity was produced on the assumption that the foreign build
    /// declares the generated library under the canonical name.
    BlindReference { target: TargetId, caller: PackageId },
    /// A node is neither a compilation unit nor an existing library. A
    /// stand-in identity was produced and no text was generated for it.
    AssumedReference { target: TargetId, caller: PackageId },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::BlindReference { target, caller } => {
                write!(f, "blind reference to {} from {}", target.as_label(), caller)
            }
            Diagnostic::AssumedReference { target, caller } => {
                write!(f, "assumed reference to {} from {}", target.as_label(), caller)
            }
        }
    }
}

/// The evaluation engine for one translation pass.
#[derive(Debug)]
pub struct EvaluationState {
    repository: RepositoryId,
    project: String,
    repository_projects: HashMap<String, String>,
    targets: HashMap<TargetId, TargetInfo>,
    mappings: HashMap<TargetId, Vec<CMakeTarget>>,
    diagnostics: Vec<Diagnostic>,
}

impl EvaluationState {
    /// New state for translating `repository` under the CMake `project`
    /// prefix.
    pub fn new(repository: RepositoryId, project: impl Into<String>) -> Self {
        EvaluationState {
            repository,
            project: project.into(),
            repository_projects: HashMap::new(),
            targets: HashMap::new(),
            mappings: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// The repository this pass translates; absence of its targets is fatal
    /// while foreign absence degrades to a blind reference.
    pub fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    /// Persist a mapping from a source identity to one or more pre-existing
    /// CMake targets (e.g. `@com_google_protobuf//:protoc` →
    /// `protobuf::protoc`).
    pub fn add_target_mapping(&mut self, target: TargetId, names: Vec<CMakeTarget>) {
        self.mappings.insert(target, names);
    }

    /// Record the CMake project prefix of a foreign repository, used when
    /// deriving canonical names for its targets.
    pub fn add_repository_project(
        &mut self,
        repository: impl Into<String>,
        project: impl Into<String>,
    ) {
        self.repository_projects
            .insert(repository.into(), project.into());
    }

    /// Required provider lookup; absence is a fatal error.
    pub fn get_target_info(&self, target: &TargetId) -> Result<&TargetInfo, Error> {
        self.targets
            .get(target)
            .ok_or_else(|| Error::TargetNotFound(target.as_label().to_string()))
    }

    /// Optional provider lookup. Doubles as the memoization query for
    /// generated identities.
    pub fn get_optional_target_info(&self, target: &TargetId) -> Option<&TargetInfo> {
        self.targets.get(target)
    }

    /// Register an analyzed result. First write wins; re-registration of the
    /// same identity is ignored.
    pub fn add_analyzed_target(&mut self, target: TargetId, info: TargetInfo) {
        self.targets.entry(target).or_insert(info);
    }

    /// Map one source identity to the CMake names dependents link against.
    ///
    /// Resolution order: persisted mapping, then the analyzed record's
    /// library facet, then nothing for a known node without a library. An
    /// unknown node falls back to its canonical name pair so cross-project
    /// references can blind-link by convention.
    pub fn get_dep(&self, target: &TargetId) -> Vec<CMakeTarget> {
        if let Some(mapped) = self.mappings.get(target) {
            return mapped.clone();
        }
        if let Some(info) = self.targets.get(target) {
            if let Some(library) = &info.library {
                return vec![library.pair.dep().clone()];
            }
            return Vec::new();
        }
        vec![self.generate_cmake_target_pair(target).alias]
    }

    /// One-to-many form of [`get_dep`](EvaluationState::get_dep).
    pub fn get_deps(&self, targets: &[TargetId]) -> Vec<CMakeTarget> {
        targets.iter().flat_map(|t| self.get_dep(t)).collect()
    }

    /// Resolve a source-file reference to concrete paths. A registered files
    /// facet contributes its paths and pushes its generating CMake targets
    /// into `cmake_deps`; anything else resolves by the source-tree
    /// convention.
    pub fn get_file_paths(&self, src: &TargetId, cmake_deps: &mut Vec<CMakeTarget>) -> Vec<String> {
        if let Some(info) = self.targets.get(src) {
            if let Some(files) = &info.files {
                cmake_deps.extend(files.deps.iter().cloned());
                return files.paths.clone();
            }
        }
        let package = src.package_name();
        if package.is_empty() {
            vec![format!("${{PROJECT_SOURCE_DIR}}/{}", src.target_name())]
        } else {
            vec![format!(
                "${{PROJECT_SOURCE_DIR}}/{}/{}",
                package,
                src.target_name()
            )]
        }
    }

    /// Derive the canonical CMake name pair for an identity. The derivation
    /// is deterministic, so independent translations of the same graph agree
    /// on names without coordination.
    pub fn generate_cmake_target_pair(&self, target: &TargetId) -> CMakeTargetPair {
        let prefix = self.project_for(target.repository_name());
        let mangled = mangle_target_path(target.package_name(), target.target_name());
        CMakeTargetPair::new(
            format!("{prefix}_{mangled}"),
            format!("{prefix}::{mangled}"),
        )
    }

    fn project_for<'a>(&'a self, repository: &'a str) -> &'a str {
        if repository == self.repository.name() {
            return &self.project;
        }
        self.repository_projects
            .get(repository)
            .map(String::as_str)
            .unwrap_or(repository)
    }

    /// Record a tolerated degradation.
    pub fn diagnostic(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("[proto2cmake] {diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Diagnostics recorded so far, in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the diagnostics recorded during the pass.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

/// Join package path components and target name components with `_`,
/// sanitizing characters CMake identifiers cannot carry. A target named
/// after the last package component is not repeated (`//foo/bar:bar` →
/// `foo_bar`).
fn mangle_target_path(package: &str, name: &str) -> String {
    let package_parts: Vec<&str> = package.split('/').filter(|p| !p.is_empty()).collect();
    let name_parts: Vec<&str> = name.split('/').filter(|p| !p.is_empty()).collect();

    let mut parts = package_parts;
    for (i, part) in name_parts.iter().enumerate() {
        if i == 0 && parts.last() == Some(part) {
            continue;
        }
        parts.push(part);
    }

    parts
        .iter()
        .map(|part| sanitize_component(part))
        .collect::<Vec<_>>()
        .join("_")
}

fn sanitize_component(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{CMakeLibraryProvider, FilesProvider};

    fn state() -> EvaluationState {
        EvaluationState::new(RepositoryId::new("main"), "CMakeProject")
    }

    fn target(label: &str) -> TargetId {
        RepositoryId::new("main")
            .root_package()
            .parse_label(label)
            .unwrap()
    }

    #[test]
    fn name_pair_for_nested_package() {
        let pair = state().generate_cmake_target_pair(&target("//tensor/proto:schema_proto"));
        assert_eq!(pair.target.as_str(), "CMakeProject_tensor_proto_schema_proto");
        assert_eq!(pair.alias.as_str(), "CMakeProject::tensor_proto_schema_proto");
    }

    #[test]
    fn name_pair_for_root_package() {
        let pair = state().generate_cmake_target_pair(&target("//:protobuf"));
        assert_eq!(pair.target.as_str(), "CMakeProject_protobuf");
    }

    #[test]
    fn repeated_component_is_not_duplicated() {
        let pair = state().generate_cmake_target_pair(&target("//foo/bar:bar"));
        assert_eq!(pair.target.as_str(), "CMakeProject_foo_bar");
    }

    #[test]
    fn name_components_are_sanitized() {
        let pair = state().generate_cmake_target_pair(&target("//pkg:foo.proto"));
        assert_eq!(pair.target.as_str(), "CMakeProject_pkg_foo_proto");
    }

    #[test]
    fn foreign_repository_uses_its_project_prefix() {
        let mut s = state();
        s.add_repository_project("dep", "DepProject");
        let t = RepositoryId::new("dep").package("util").target("lib");
        assert_eq!(s.generate_cmake_target_pair(&t).alias.as_str(), "DepProject::util_lib");
        // Unmapped repositories fall back to the repository name.
        let t = RepositoryId::new("other").root_package().target("x");
        assert_eq!(s.generate_cmake_target_pair(&t).alias.as_str(), "other::x");
    }

    #[test]
    fn dep_resolution_prefers_persisted_mappings() {
        let mut s = state();
        let t = target("//:runtime");
        s.add_target_mapping(t.clone(), vec![CMakeTarget::new("protobuf::libprotobuf")]);
        let pair = s.generate_cmake_target_pair(&t);
        s.add_analyzed_target(t.clone(), TargetInfo::from_pair(pair));
        assert_eq!(s.get_dep(&t), vec![CMakeTarget::new("protobuf::libprotobuf")]);
    }

    #[test]
    fn dep_resolution_uses_the_library_facet() {
        let mut s = state();
        let t = target("//pkg:lib");
        let pair = s.generate_cmake_target_pair(&t);
        s.add_analyzed_target(t.clone(), TargetInfo::from_pair(pair));
        assert_eq!(s.get_dep(&t), vec![CMakeTarget::new("CMakeProject::pkg_lib")]);
    }

    #[test]
    fn known_node_without_library_facet_resolves_to_nothing() {
        let mut s = state();
        let t = target("//pkg:files_only");
        s.add_analyzed_target(t.clone(), TargetInfo::from_files(FilesProvider::default()));
        assert!(s.get_dep(&t).is_empty());
    }

    #[test]
    fn unknown_node_blind_links_by_convention() {
        let s = state();
        let t = target("//pkg:ghost");
        assert_eq!(s.get_dep(&t), vec![CMakeTarget::new("CMakeProject::pkg_ghost")]);
    }

    #[test]
    fn first_write_wins() {
        let mut s = state();
        let t = target("//pkg:x");
        let first = CMakeTargetPair::new("A_x", "A::x");
        s.add_analyzed_target(t.clone(), TargetInfo::from_pair(first.clone()));
        s.add_analyzed_target(t.clone(), TargetInfo::from_pair(CMakeTargetPair::new("B_x", "B::x")));
        let info = s.get_target_info(&t).unwrap();
        assert_eq!(
            info.library,
            Some(CMakeLibraryProvider { pair: first })
        );
    }

    #[test]
    fn file_paths_follow_the_source_tree_convention() {
        let s = state();
        let mut deps = Vec::new();
        assert_eq!(
            s.get_file_paths(&target("//pkg:foo.proto"), &mut deps),
            vec!["${PROJECT_SOURCE_DIR}/pkg/foo.proto".to_string()]
        );
        assert_eq!(
            s.get_file_paths(&target("//:root.proto"), &mut deps),
            vec!["${PROJECT_SOURCE_DIR}/root.proto".to_string()]
        );
        assert!(deps.is_empty());
    }

    #[test]
    fn files_facet_contributes_paths_and_generating_deps() {
        let mut s = state();
        let t = target("//pkg:gen.proto");
        s.add_analyzed_target(
            t.clone(),
            TargetInfo::from_files(FilesProvider {
                paths: vec!["${PROJECT_BINARY_DIR}/pkg/gen.proto".to_string()],
                deps: vec![CMakeTarget::new("CMakeProject_pkg_gen")],
            }),
        );
        let mut deps = Vec::new();
        let paths = s.get_file_paths(&t, &mut deps);
        assert_eq!(paths, vec!["${PROJECT_BINARY_DIR}/pkg/gen.proto".to_string()]);
        assert_eq!(deps, vec![CMakeTarget::new("CMakeProject_pkg_gen")]);
    }

    #[test]
    fn diagnostics_are_recorded_in_order() {
        let mut s = state();
        let caller = RepositoryId::new("main").package("pkg");
        s.diagnostic(Diagnostic::BlindReference {
            target: target("//pkg:a"),
            caller: caller.clone(),
        });
        s.diagnostic(Diagnostic::AssumedReference {
            target: target("//pkg:b"),
            caller,
        });
        assert_eq!(s.diagnostics().len(), 2);
        assert!(matches!(s.diagnostics()[0], Diagnostic::BlindReference { .. }));
        let drained = s.take_diagnostics();
        assert_eq!(drained.len(), 2);
        assert!(s.diagnostics().is_empty());
    }
}
