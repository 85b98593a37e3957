//! # Library Declaration Emitter
//!
//! Appends the standard `add_library` block for one name pair: sources,
//! include directories, compile features, link dependencies, and the alias
//! line. Header-only libraries are declared INTERFACE and switch their usage
//! requirements from PUBLIC to INTERFACE scope.
//!
//! All list arguments are sorted and deduplicated before emission so the
//! fragment is byte-stable for a given input.

use crate::builder::{quote_list_sep, ScriptBuilder};
use crate::provider::CMakeTargetPair;

const SEP: &str = "\n        ";

/// Append one library declaration block to `out`.
///
/// `header_only` defaults to "no sources were given". Note the sources here
/// are compiled sources attached directly to the library; generated-code
/// rules typically pass none and let their generation directive attach
/// outputs to the target instead.
pub fn emit_library<S: AsRef<str>, D: AsRef<str>>(
    out: &mut ScriptBuilder,
    pair: &CMakeTargetPair,
    srcs: &[S],
    deps: &[D],
    includes: &[String],
    header_only: Option<bool>,
) {
    let header_only = header_only.unwrap_or_else(|| srcs.is_empty());
    let target = pair.target.as_str();
    let scope = if header_only { "INTERFACE" } else { "PUBLIC" };

    if header_only {
        out.addtext(&format!("\nadd_library({target} INTERFACE)\n"));
    } else {
        out.addtext(&format!("\nadd_library({target})\n"));
    }

    if !header_only && !srcs.is_empty() {
        out.addtext(&format!(
            "target_sources({target} PRIVATE{SEP}{})\n",
            quote_list_sep(sorted_unique(srcs), SEP)
        ));
    }

    if !includes.is_empty() {
        let dirs: Vec<String> = sorted_unique(includes)
            .into_iter()
            .map(|dir| format!("$<BUILD_INTERFACE:{dir}>"))
            .collect();
        out.addtext(&format!(
            "target_include_directories({target} {scope}{SEP}{})\n",
            quote_list_sep(&dirs, SEP)
        ));
    }

    out.addtext(&format!(
        "target_compile_features({target} {scope} cxx_std_17)\n"
    ));

    if !deps.is_empty() {
        out.addtext(&format!(
            "target_link_libraries({target} {scope}{SEP}{})\n",
            quote_list_sep(sorted_unique(deps), SEP)
        ));
    }

    out.addtext(&format!(
        "add_library({} ALIAS {target})\n",
        pair.alias.as_str()
    ));
}

fn sorted_unique<S: AsRef<str>>(items: &[S]) -> Vec<&str> {
    let mut v: Vec<&str> = items.iter().map(|item| item.as_ref()).collect();
    v.sort_unstable();
    v.dedup();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CMakeTarget;

    fn pair() -> CMakeTargetPair {
        CMakeTargetPair::new("CMakeProject_pkg_lib", "CMakeProject::pkg_lib")
    }

    #[test]
    fn emits_a_full_library_block() {
        let mut out = ScriptBuilder::new();
        emit_library(
            &mut out,
            &pair(),
            &["b.cc", "a.cc"],
            &[CMakeTarget::new("Z::z"), CMakeTarget::new("A::a")],
            &["${PROJECT_BINARY_DIR}".to_string()],
            None,
        );
        assert_eq!(
            out.build(),
            "\nadd_library(CMakeProject_pkg_lib)\n\
             target_sources(CMakeProject_pkg_lib PRIVATE\n        \"a.cc\"\n        \"b.cc\")\n\
             target_include_directories(CMakeProject_pkg_lib PUBLIC\n        \"$<BUILD_INTERFACE:${PROJECT_BINARY_DIR}>\")\n\
             target_compile_features(CMakeProject_pkg_lib PUBLIC cxx_std_17)\n\
             target_link_libraries(CMakeProject_pkg_lib PUBLIC\n        \"A::a\"\n        \"Z::z\")\n\
             add_library(CMakeProject::pkg_lib ALIAS CMakeProject_pkg_lib)\n"
        );
    }

    #[test]
    fn header_only_switches_to_interface() {
        let mut out = ScriptBuilder::new();
        emit_library(
            &mut out,
            &pair(),
            &Vec::<String>::new(),
            &[CMakeTarget::new("dep::dep")],
            &[],
            None,
        );
        let text = out.build();
        assert!(text.starts_with("\nadd_library(CMakeProject_pkg_lib INTERFACE)\n"));
        assert!(text.contains("target_compile_features(CMakeProject_pkg_lib INTERFACE cxx_std_17)"));
        assert!(text.contains("target_link_libraries(CMakeProject_pkg_lib INTERFACE\n        \"dep::dep\")"));
        assert!(!text.contains("target_sources"));
    }

    #[test]
    fn explicit_header_only_suppresses_sources() {
        let mut out = ScriptBuilder::new();
        emit_library(
            &mut out,
            &pair(),
            &["a.cc"],
            &Vec::<CMakeTarget>::new(),
            &[],
            Some(true),
        );
        let text = out.build();
        assert!(text.contains("INTERFACE)"));
        assert!(!text.contains("target_sources"));
        assert!(!text.contains("target_link_libraries"));
    }

    #[test]
    fn dependency_lists_are_sorted_and_deduplicated() {
        let mut out = ScriptBuilder::new();
        emit_library(
            &mut out,
            &pair(),
            &Vec::<String>::new(),
            &[
                CMakeTarget::new("b::b"),
                CMakeTarget::new("a::a"),
                CMakeTarget::new("b::b"),
            ],
            &[],
            None,
        );
        assert!(out
            .as_str()
            .contains("target_link_libraries(CMakeProject_pkg_lib INTERFACE\n        \"a::a\"\n        \"b::b\")"));
    }
}
