//! # Proto Translation Core
//!
//! Turns `proto_library` compilation units into generated CMake libraries.
//!
//! The generated targets have common names derived from the proto_library
//! identity, so cross-project dependencies can "blind" link to them by
//! convention when the foreign graph is not fully known. Well-known schema
//! references are never generated; they redirect to the shared protobuf
//! runtime through the profile's substitution table.
//!
//! This generator assumes that appropriate mappings between source and CMake
//! targets have been configured, e.g.:
//!   `@com_google_protobuf//:protobuf` => `protobuf::libprotobuf`
//!   `@com_google_protobuf//:protoc`   => `protobuf::protoc`

use std::collections::HashMap;

use crate::builder::quote_list;
use crate::codegen::emit::emit_library;
use crate::context::TranslationContext;
use crate::error::Error;
use crate::evaluation::Diagnostic;
use crate::label::{PackageId, RepositoryId, TargetId};
use crate::provider::{CMakeTarget, TargetInfo};

/// One target-language binding for schema compilation. Immutable; built by
/// an explicit constructor, one instance per language.
#[derive(Debug, Clone)]
pub struct PluginProfile {
    pub name: String,
    pub plugin: Option<TargetId>,
    pub exts: Vec<String>,
    pub runtime: Vec<TargetId>,
    /// Redirect table checked both for the source identity and for the
    /// identity the generation would produce. `None` means "no generated
    /// library": callers link the existing runtime directly.
    pub replacement_targets: HashMap<TargetId, Option<TargetId>>,
    pub language: Option<String>,
}

fn proto_repo() -> RepositoryId {
    RepositoryId::new("com_google_protobuf")
}

fn proto_compiler() -> TargetId {
    proto_repo().root_package().target("protoc")
}

fn proto_runtime() -> TargetId {
    proto_repo().root_package().target("protobuf")
}

const WELL_KNOWN_TYPES: &[&str] = &[
    "any",
    "api",
    "duration",
    "empty",
    "field_mask",
    "source_context",
    "struct",
    "timestamp",
    "type",
    "wrappers",
    // descriptor.proto isn't formally "well known" but ships with the
    // runtime all the same.
    "descriptor",
];

/// The fixed substitution table shared by every profile: generating code
/// for a well-known schema is skipped and the runtime is linked instead.
fn well_known_replacements() -> HashMap<TargetId, Option<TargetId>> {
    let repo = proto_repo();
    let runtime = proto_runtime();
    let wkt_package = repo.package("src/google/protobuf");

    let mut table = HashMap::new();
    for name in WELL_KNOWN_TYPES {
        let target_name = format!("{name}_proto");
        table.insert(wkt_package.target(target_name.clone()), Some(runtime.clone()));
        table.insert(repo.root_package().target(target_name), Some(runtime.clone()));
    }
    table.insert(
        repo.package("src/google/protobuf/compiler").target("plugin"),
        Some(repo.package("src/google/protobuf/compiler").target("code_generator")),
    );
    table
}

impl PluginProfile {
    /// The C++ binding: `protoc --cpp_out`, linking the protobuf runtime.
    pub fn cc() -> PluginProfile {
        PluginProfile {
            name: "cpp".to_string(),
            plugin: None,
            exts: vec![".pb.h".to_string(), ".pb.cc".to_string()],
            runtime: vec![proto_runtime()],
            replacement_targets: well_known_replacements(),
            language: None,
        }
    }

    fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(&self.name)
    }

    /// Derive the generated-library identity for a source identity. The
    /// naming convention is deterministic, so independent traversals agree.
    fn library_target(&self, target: &TargetId) -> TargetId {
        target.sibling(format!("{}__{}_library", target.target_name(), self.name))
    }
}

/// Construct the output path for the proto compiler. This is typically a
/// path under `${PROJECT_BINARY_DIR}` where the compiler writes generated
/// sources; it doubles as the include directory for them.
fn proto_output_dir(caller_package: &PackageId, strip_import_prefix: Option<&str>) -> String {
    let Some(prefix) = strip_import_prefix else {
        return "${PROJECT_BINARY_DIR}".to_string();
    };
    let mut include_path = posix_join(caller_package.package_name(), prefix);
    if let Some(stripped) = include_path.strip_prefix('/') {
        include_path = stripped.to_string();
    }
    if include_path.is_empty() {
        return "${PROJECT_BINARY_DIR}".to_string();
    }
    format!("${{PROJECT_BINARY_DIR}}/{include_path}")
}

/// POSIX join: an absolute second component replaces the first; `.` and
/// empty components drop.
fn posix_join(base: &str, path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    if !absolute {
        parts.extend(base.split('/').filter(|p| !p.is_empty() && *p != "."));
    }
    parts.extend(path.split('/').filter(|p| !p.is_empty() && *p != "."));
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Generate the text of one `btc_protobuf` invocation: the directive that
/// runs the schema compiler for `proto_library_target` and attaches the
/// outputs to `cmake_name`.
pub fn btc_protobuf(
    ctx: &TranslationContext,
    cmake_name: &CMakeTarget,
    proto_library_target: &TargetId,
    profile: &PluginProfile,
    cmake_deps: Vec<CMakeTarget>,
    flags: &[String],
) -> Result<String, Error> {
    let target_info = ctx.state.get_target_info(proto_library_target)?;

    let proto_cmake_target = target_info
        .library
        .as_ref()
        .map(|library| library.pair.target.clone())
        .ok_or_else(|| Error::MissingProvider {
            target: proto_library_target.as_label().to_string(),
            provider: "CMakeLibraryProvider",
        })?;

    // Reaching the emitter without the compilation-unit facet is an
    // internal invariant violation, not a user error.
    let proto_info = target_info.proto.as_ref().ok_or_else(|| Error::MissingProvider {
        target: proto_library_target.as_label().to_string(),
        provider: "ProtoLibraryProvider",
    })?;

    let mut cmake_deps = cmake_deps;
    cmake_deps.extend(ctx.state.get_dep(&proto_compiler()));
    cmake_deps.sort_unstable();
    cmake_deps.dedup();

    let language = profile.language();

    let mut plugin = String::new();
    if let Some(plugin_target) = &profile.plugin {
        let plugin_name = ctx.state.get_dep(plugin_target);
        if plugin_name.len() != 1 {
            return Err(Error::PluginResolution {
                plugin: plugin_target.as_label().to_string(),
                resolved: plugin_name.iter().map(|n| n.as_str().to_string()).collect(),
            });
        }
        cmake_deps.push(plugin_name[0].clone());
        plugin = format!(
            "\n    PLUGIN protoc-gen-{language}=$<TARGET_FILE:{}>",
            plugin_name[0]
        );
    }

    let output_dir = proto_output_dir(
        ctx.caller_package(),
        proto_info.strip_import_prefix.as_deref(),
    );

    let mut plugin_flags = String::new();
    if !flags.is_empty() {
        plugin_flags = format!("\n    PLUGIN_OPTIONS {}", quote_list(flags));
    }

    Ok(format!(
        "\nbtc_protobuf(\n    TARGET {cmake_name}\n    PROTO_TARGET {proto_cmake_target}\n    LANGUAGE {language}\n    GENERATE_EXTENSIONS {}\n    PROTOC_OPTIONS --experimental_allow_proto3_optional\n    PROTOC_OUT_DIR {output_dir}{plugin}{plugin_flags}\n    DEPENDENCIES {}\n)\n",
        quote_list(&profile.exts),
        quote_list(&cmake_deps),
    ))
}

/// Resolve a source compilation-unit identity to the identity of its
/// generated library, emitting the library declaration and compiler
/// invocation on first visit. Returns `None` when the substitution table
/// redirects the node to "no generated library".
pub fn generate_proto_library_target(
    ctx: &mut TranslationContext,
    profile: &PluginProfile,
    target: &TargetId,
) -> Result<Option<TargetId>, Error> {
    let mut resolving = Vec::new();
    generate_inner(ctx, profile, target, &mut resolving)
}

fn generate_inner(
    ctx: &mut TranslationContext,
    profile: &PluginProfile,
    target: &TargetId,
    resolving: &mut Vec<TargetId>,
) -> Result<Option<TargetId>, Error> {
    // A reference to a proto where code generation is excluded: link the
    // replacement target instead.
    if let Some(replacement) = profile.replacement_targets.get(target) {
        return Ok(replacement.clone());
    }

    let library_target = profile.library_target(target);

    // The library could already have been constructed.
    if ctx.state.get_optional_target_info(&library_target).is_some() {
        return Ok(Some(library_target));
    }

    // What this node would generate may itself be replaced.
    if let Some(replacement) = profile.replacement_targets.get(&library_target) {
        return Ok(replacement.clone());
    }

    if resolving.contains(target) {
        let mut path: Vec<&str> = resolving.iter().map(|t| t.as_label()).collect();
        path.push(target.as_label());
        return Err(Error::DependencyCycle(path.join(" -> ")));
    }
    resolving.push(target.clone());
    let result = generate_unvisited(ctx, profile, target, &library_target, resolving);
    resolving.pop();
    result
}

fn generate_unvisited(
    ctx: &mut TranslationContext,
    profile: &PluginProfile,
    target: &TargetId,
    library_target: &TargetId,
    resolving: &mut Vec<TargetId>,
) -> Result<Option<TargetId>, Error> {
    tracing::debug!("[proto2cmake] resolving {}", target.as_label());

    // First-party proto references must exist; foreign ones degrade.
    let target_info = if ctx.caller_package().repository_name() == target.repository_name() {
        Some(ctx.state.get_target_info(target)?.clone())
    } else {
        ctx.state.get_optional_target_info(target).cloned()
    };

    let Some(target_info) = target_info else {
        // Not available: construct an ephemeral reference and assume the
        // foreign build declares the generated library by convention.
        ctx.state.diagnostic(Diagnostic::BlindReference {
            target: target.clone(),
            caller: ctx.caller_package().clone(),
        });
        return Ok(Some(library_target.clone()));
    };

    let mut cc_deps: Vec<CMakeTarget> = Vec::new();
    let mut import_target: Option<CMakeTarget> = None;
    let mut cmake_deps: Vec<CMakeTarget> = ctx.state.get_dep(&proto_compiler());
    let mut proto_src_files: Vec<String> = Vec::new();
    let mut include_dirs: Vec<String> = Vec::new();

    let mut done = false;
    if let Some(proto_info) = &target_info.proto {
        let mut sub_targets: Vec<TargetId> = Vec::new();
        for dep in &proto_info.deps {
            if let Some(sub_target_id) = generate_inner(ctx, profile, dep, resolving)? {
                sub_targets.push(sub_target_id);
            }
        }
        sub_targets.sort_unstable();
        sub_targets.dedup();
        cc_deps.extend(ctx.state.get_deps(&sub_targets));

        for src in &proto_info.srcs {
            proto_src_files.extend(ctx.state.get_file_paths(src, &mut cmake_deps));
        }

        include_dirs.push(proto_output_dir(
            ctx.caller_package(),
            proto_info.strip_import_prefix.as_deref(),
        ));
        import_target = target_info
            .library
            .as_ref()
            .map(|library| library.pair.target.clone());
        done = true;
    }

    if !done {
        if let Some(provider) = &target_info.library {
            import_target = Some(provider.pair.target.clone());
            done = true;
        }
    }

    if !done {
        ctx.state.diagnostic(Diagnostic::AssumedReference {
            target: target.clone(),
            caller: ctx.caller_package().clone(),
        });
        return Ok(Some(library_target.clone()));
    }

    // Proto libraries need aliases so other source trees can reference
    // them; derive the canonical pair for the generated identity.
    let cmake_target_pair = ctx.state.generate_cmake_target_pair(library_target);
    proto_src_files.sort_unstable();
    proto_src_files.dedup();

    if proto_src_files.is_empty() && cc_deps.is_empty() && import_target.is_none() {
        return Err(Error::NoInputs {
            target: target.as_label().to_string(),
            library: library_target.as_label().to_string(),
        });
    }

    for dep in &profile.runtime {
        cc_deps.extend(ctx.state.get_dep(dep));
    }

    let header_only = proto_src_files.is_empty();

    ctx.builder
        .addtext(&format!("\n# {}", library_target.as_label()));
    emit_library(
        &mut ctx.builder,
        &cmake_target_pair,
        &Vec::<String>::new(),
        &cc_deps,
        &include_dirs,
        Some(header_only),
    );

    if !proto_src_files.is_empty() {
        let text = btc_protobuf(
            ctx,
            &cmake_target_pair.target,
            target,
            profile,
            cmake_deps,
            &[],
        )?;
        ctx.builder.addtext(&text);
    }

    ctx.state
        .add_analyzed_target(library_target.clone(), TargetInfo::from_pair(cmake_target_pair));
    Ok(Some(library_target.clone()))
}

/// Evaluate one aggregate rule: resolve every proto dependency to its
/// generated library and emit a single umbrella library depending on the
/// union of the results plus any direct extras.
pub fn cc_proto_library_impl(
    ctx: &mut TranslationContext,
    target: &TargetId,
    profiles: &[PluginProfile],
    deps: &[String],
    extra_deps: &[String],
) -> Result<(), Error> {
    let resolved_deps = ctx.resolve_target_or_label_list(deps)?;
    let resolved_extra = ctx.resolve_target_or_label_list(extra_deps)?;

    let cmake_target_pair = ctx.state.generate_cmake_target_pair(target);

    let mut library_deps: Vec<CMakeTarget> = ctx.state.get_deps(&resolved_extra);

    // Typically there is a single proto dep per aggregate; multiple are
    // supported, so each resolves through the full translation.
    for profile in profiles {
        for dep_target in &resolved_deps {
            if let Some(lib_target) = generate_proto_library_target(ctx, profile, dep_target)? {
                library_deps.extend(ctx.state.get_dep(&lib_target));
            }
        }
    }

    ctx.builder
        .addtext(&format!("\n# cc_proto_library({})", target.as_label()));
    emit_library(
        &mut ctx.builder,
        &cmake_target_pair,
        &Vec::<String>::new(),
        &library_deps,
        &[],
        None,
    );
    ctx.state
        .add_analyzed_target(target.clone(), TargetInfo::from_pair(cmake_target_pair));
    Ok(())
}
