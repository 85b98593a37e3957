//! # Target Labels
//!
//! A target identity is the globally unique key for a node in either the
//! source dependency graph or the generated one. Identities have the
//! canonical form `@repository//package/path:target_name`; the canonical
//! label string defines equality, hashing, and ordering, and an identity is
//! never mutated after creation.
//!
//! Label strings written in build declarations resolve against the package
//! that declares them:
//!
//! - `@repo//pkg:name` — fully qualified
//! - `@repo//pkg` — target name defaults to the last package path component
//! - `@repo` — shorthand for `@repo//:repo`
//! - `//pkg:name`, `//pkg` — absolute within the declaring repository
//! - `:name`, `name` — sibling target in the declaring package

use std::fmt;

use crate::error::Error;

/// An interned repository name, e.g. `com_google_protobuf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryId {
    name: String,
}

impl RepositoryId {
    pub fn new(name: impl Into<String>) -> Self {
        RepositoryId { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The package at `path` within this repository.
    pub fn package(&self, path: impl Into<String>) -> PackageId {
        PackageId::new(self.clone(), path)
    }

    /// The repository's root package (empty package path).
    pub fn root_package(&self) -> PackageId {
        PackageId::new(self.clone(), "")
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}

/// A package within a repository: `@repo//some/pkg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    repository: RepositoryId,
    package: String,
}

impl PackageId {
    pub fn new(repository: RepositoryId, package: impl Into<String>) -> Self {
        PackageId {
            repository,
            package: package.into(),
        }
    }

    /// Parse a package spec: `@repo//pkg`, `@repo`, `//pkg`, or a bare path
    /// (resolved against `default_repository`).
    pub fn parse(default_repository: &RepositoryId, spec: &str) -> Result<PackageId, Error> {
        if let Some(rest) = spec.strip_prefix('@') {
            let Some(idx) = rest.find("//") else {
                validate_repository(spec, rest)?;
                return Ok(RepositoryId::new(rest).root_package());
            };
            let (repo, package) = (&rest[..idx], &rest[idx + 2..]);
            validate_repository(spec, repo)?;
            validate_package(spec, package)?;
            return Ok(PackageId::new(RepositoryId::new(repo), package));
        }
        let package = spec.strip_prefix("//").unwrap_or(spec);
        validate_package(spec, package)?;
        Ok(PackageId::new(default_repository.clone(), package))
    }

    pub fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    pub fn repository_name(&self) -> &str {
        self.repository.name()
    }

    /// Package path within the repository; empty for the root package.
    pub fn package_name(&self) -> &str {
        &self.package
    }

    /// A target in this package. The name is trusted; use [`parse_target`]
    /// for user-supplied names.
    ///
    /// [`parse_target`]: PackageId::parse_target
    pub fn target(&self, name: impl Into<String>) -> TargetId {
        TargetId::assemble(self.repository.name(), &self.package, &name.into())
    }

    /// A target in this package from a user-supplied rule name.
    pub fn parse_target(&self, name: &str) -> Result<TargetId, Error> {
        validate_target_name(name, name)?;
        Ok(self.target(name))
    }

    /// Resolve a label string relative to this package (see module docs for
    /// the accepted grammar).
    pub fn parse_label(&self, label: &str) -> Result<TargetId, Error> {
        if label.is_empty() {
            return Err(Error::label_syntax(label, "empty label"));
        }
        if let Some(rest) = label.strip_prefix('@') {
            let (repo, absolute) = match rest.find("//") {
                Some(idx) => (&rest[..idx], &rest[idx..]),
                None => (rest, ""),
            };
            validate_repository(label, repo)?;
            let repository = RepositoryId::new(repo);
            if absolute.is_empty() {
                // "@repo" is shorthand for "@repo//:repo".
                return Ok(repository.root_package().target(repo.to_string()));
            }
            return parse_absolute(&repository, label, absolute);
        }
        if label.starts_with("//") {
            return parse_absolute(&self.repository, label, label);
        }
        if let Some(name) = label.strip_prefix(':') {
            validate_target_name(label, name)?;
            return Ok(self.target(name.to_string()));
        }
        if label.contains(':') {
            return Err(Error::label_syntax(label, "relative labels cannot contain ':'"));
        }
        validate_target_name(label, label)?;
        Ok(self.target(label.to_string()))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}//{}", self.repository.name(), self.package)
    }
}

/// The globally unique identity of one target node, stored in canonical
/// label form `@repo//pkg:name`. Ordering follows the canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId {
    label: String,
    package_offset: usize,
    name_offset: usize,
}

impl TargetId {
    fn assemble(repository: &str, package: &str, name: &str) -> TargetId {
        let label = format!("@{repository}//{package}:{name}");
        let package_offset = repository.len() + 3;
        let name_offset = package_offset + package.len() + 1;
        TargetId {
            label,
            package_offset,
            name_offset,
        }
    }

    /// Canonical label string.
    pub fn as_label(&self) -> &str {
        &self.label
    }

    pub fn repository_name(&self) -> &str {
        &self.label[1..self.package_offset - 2]
    }

    pub fn package_name(&self) -> &str {
        &self.label[self.package_offset..self.name_offset - 1]
    }

    pub fn target_name(&self) -> &str {
        &self.label[self.name_offset..]
    }

    pub fn package_id(&self) -> PackageId {
        PackageId::new(
            RepositoryId::new(self.repository_name()),
            self.package_name(),
        )
    }

    /// Another target in the same package. Used to derive generated-library
    /// identities from their source identity.
    pub fn sibling(&self, name: impl Into<String>) -> TargetId {
        TargetId::assemble(self.repository_name(), self.package_name(), &name.into())
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn parse_absolute(
    repository: &RepositoryId,
    label: &str,
    absolute: &str,
) -> Result<TargetId, Error> {
    let rest = &absolute[2..];
    let (package, name) = match rest.find(':') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        // "//some/pkg" names the target after the last path component.
        None => (rest, rest.rsplit('/').next().unwrap_or("")),
    };
    validate_package(label, package)?;
    validate_target_name(label, name)?;
    Ok(PackageId::new(repository.clone(), package).target(name))
}

fn validate_repository(label: &str, name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::label_syntax(label, "empty repository name"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(Error::label_syntax(label, "invalid character in repository name"));
    }
    Ok(())
}

fn validate_package(label: &str, package: &str) -> Result<(), Error> {
    if package.is_empty() {
        return Ok(());
    }
    if package.starts_with('/') || package.ends_with('/') || package.contains("//") {
        return Err(Error::label_syntax(label, "malformed package path"));
    }
    if !package
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.'))
    {
        return Err(Error::label_syntax(label, "invalid character in package path"));
    }
    Ok(())
}

fn validate_target_name(label: &str, name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::label_syntax(label, "empty target name"));
    }
    if name.starts_with('/') {
        return Err(Error::label_syntax(label, "target name cannot start with '/'"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.' | '+'))
    {
        return Err(Error::label_syntax(label, "invalid character in target name"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(repo: &str, path: &str) -> PackageId {
        RepositoryId::new(repo).package(path)
    }

    #[test]
    fn parses_fully_qualified_labels() {
        let base = pkg("main", "some/pkg");
        let t = base.parse_label("@com_google_protobuf//src/google/protobuf:any_proto").unwrap();
        assert_eq!(t.as_label(), "@com_google_protobuf//src/google/protobuf:any_proto");
        assert_eq!(t.repository_name(), "com_google_protobuf");
        assert_eq!(t.package_name(), "src/google/protobuf");
        assert_eq!(t.target_name(), "any_proto");
    }

    #[test]
    fn target_name_defaults_to_last_package_component() {
        let base = pkg("main", "");
        let t = base.parse_label("//third_party/nasm").unwrap();
        assert_eq!(t.as_label(), "@main//third_party/nasm:nasm");

        let t = base.parse_label("@protobuf//upb").unwrap();
        assert_eq!(t.as_label(), "@protobuf//upb:upb");
    }

    #[test]
    fn bare_repository_names_its_root_target() {
        let base = pkg("main", "pkg");
        let t = base.parse_label("@zlib").unwrap();
        assert_eq!(t.as_label(), "@zlib//:zlib");
    }

    #[test]
    fn relative_labels_resolve_against_the_declaring_package() {
        let base = pkg("main", "tensor/proto");
        assert_eq!(
            base.parse_label(":schema_proto").unwrap().as_label(),
            "@main//tensor/proto:schema_proto"
        );
        assert_eq!(
            base.parse_label("schema_proto").unwrap().as_label(),
            "@main//tensor/proto:schema_proto"
        );
        assert_eq!(
            base.parse_label("//other:lib").unwrap().as_label(),
            "@main//other:lib"
        );
    }

    #[test]
    fn root_package_labels() {
        let base = pkg("main", "pkg");
        assert_eq!(base.parse_label("//:protobuf").unwrap().as_label(), "@main//:protobuf");
    }

    #[test]
    fn rejects_malformed_labels() {
        let base = pkg("main", "pkg");
        assert!(base.parse_label("").is_err());
        assert!(base.parse_label("//").is_err());
        assert!(base.parse_label("@//pkg:x").is_err());
        assert!(base.parse_label("a:b").is_err());
        assert!(base.parse_label("//pkg//sub:x").is_err());
        assert!(base.parse_label("//pkg:").is_err());
        assert!(base.parse_label(":with space").is_err());
    }

    #[test]
    fn sibling_stays_in_the_same_package() {
        let base = pkg("main", "pkg");
        let t = base.target("foo_proto");
        let lib = t.sibling("foo_proto__cpp_library");
        assert_eq!(lib.as_label(), "@main//pkg:foo_proto__cpp_library");
        assert_eq!(lib.package_name(), "pkg");
    }

    #[test]
    fn ordering_follows_the_canonical_label_string() {
        let base = pkg("a", "");
        let deep = base.parse_label("//b/x:c").unwrap();
        let flat = base.parse_label("//b:c").unwrap();
        // '/' sorts before ':' in the canonical form.
        assert!(deep < flat);
        assert_eq!(deep.as_label().cmp(flat.as_label()), std::cmp::Ordering::Less);
    }

    #[test]
    fn package_spec_forms() {
        let main = RepositoryId::new("main");
        assert_eq!(PackageId::parse(&main, "//pkg").unwrap().to_string(), "@main//pkg");
        assert_eq!(PackageId::parse(&main, "pkg/sub").unwrap().to_string(), "@main//pkg/sub");
        assert_eq!(PackageId::parse(&main, "").unwrap().to_string(), "@main//");
        assert_eq!(
            PackageId::parse(&main, "@dep//util").unwrap().to_string(),
            "@dep//util"
        );
        assert_eq!(PackageId::parse(&main, "@dep").unwrap().to_string(), "@dep//");
        assert!(PackageId::parse(&main, "//bad//path").is_err());
    }
}
