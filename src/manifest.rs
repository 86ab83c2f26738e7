//! # Manifest Resolution
//!
//! A manifest describes one snapshot of a multi-repository workspace: which
//! repositories exist and which revision each one is at. The rest of the
//! crate only needs the resolved mapping of repository path to revision, so
//! parsing sits behind the `ManifestResolver` trait.
//!
//! `XmlManifestResolver` reads the repo-tool XML format:
//!
//! ```xml
//! <manifest>
//!   <default revision="main"/>
//!   <project name="platform/core" path="core" revision="v1"/>
//!   <project name="platform/net"/>
//!   <include name="extras.xml"/>
//!   <remove-project name="platform/legacy"/>
//! </manifest>
//! ```
//!
//! - `path` defaults to `name`.
//! - `revision` defaults to the nearest `<default revision>`; a project with
//!   neither is an error.
//! - `<include>` is resolved relative to the including manifest's directory.
//! - `<remove-project>` drops every project previously declared under `name`.
//!
//! Other elements (`remote`, `copyfile`, ...) are ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use xot::{NameId, Node, Xot};

use crate::error::{Error, Result};

/// Maximum `<include>` nesting before the manifest is rejected as cyclic
const MAX_INCLUDE_DEPTH: usize = 16;

/// One repository of a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub repo_path: String,
    pub revision: String,
}

/// A resolved snapshot: repository path to revision, ordered by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    projects: BTreeMap<String, String>,
}

impl Manifest {
    /// Build a manifest from `(repo path, revision)` pairs. Later pairs win.
    pub fn from_pairs<I, P, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        Self {
            projects: pairs
                .into_iter()
                .map(|(p, r)| (p.into(), r.into()))
                .collect(),
        }
    }

    /// Revision of the repository at `repo_path`, if present
    pub fn revision(&self, repo_path: &str) -> Option<&str> {
        self.projects.get(repo_path).map(String::as_str)
    }

    /// Iterate over entries in path order
    pub fn entries(&self) -> impl Iterator<Item = ManifestEntry> + '_ {
        self.projects.iter().map(|(path, rev)| ManifestEntry {
            repo_path: path.clone(),
            revision: rev.clone(),
        })
    }

    /// Repository paths in path order
    pub fn repo_paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.projects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Trait for turning a manifest document into a `Manifest`
pub trait ManifestResolver: Send + Sync {
    fn resolve(&self, source: &Path) -> Result<Manifest>;
}

/// Resolves repo-tool XML manifests from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlManifestResolver;

impl ManifestResolver for XmlManifestResolver {
    fn resolve(&self, source: &Path) -> Result<Manifest> {
        let mut parser = Parser::new();
        let mut declared = Vec::new();
        parser.load_file(source, None, 0, &mut declared)?;
        Ok(Manifest::from_pairs(
            declared.into_iter().map(|p| (p.entry.repo_path, p.entry.revision)),
        ))
    }
}

/// Parse manifest text that includes no other documents.
///
/// `origin` is used for error messages and include resolution.
pub fn parse_str(text: &str, origin: &Path) -> Result<Manifest> {
    let mut parser = Parser::new();
    let mut declared = Vec::new();
    parser.load_text(text, origin, None, 0, &mut declared)?;
    Ok(Manifest::from_pairs(
        declared.into_iter().map(|p| (p.entry.repo_path, p.entry.revision)),
    ))
}

struct Declared {
    name: String,
    entry: ManifestEntry,
}

struct Names {
    project: NameId,
    default: NameId,
    include: NameId,
    remove_project: NameId,
    name: NameId,
    path: NameId,
    revision: NameId,
}

struct Parser {
    xot: Xot,
    names: Names,
}

impl Parser {
    fn new() -> Self {
        let mut xot = Xot::new();
        let names = Names {
            project: xot.add_name("project"),
            default: xot.add_name("default"),
            include: xot.add_name("include"),
            remove_project: xot.add_name("remove-project"),
            name: xot.add_name("name"),
            path: xot.add_name("path"),
            revision: xot.add_name("revision"),
        };
        Self { xot, names }
    }

    fn load_file(
        &mut self,
        source: &Path,
        inherited_default: Option<&str>,
        depth: usize,
        declared: &mut Vec<Declared>,
    ) -> Result<()> {
        let text = fs::read_to_string(source).map_err(|e| Error::ManifestParse {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        self.load_text(&text, source, inherited_default, depth, declared)
    }

    fn load_text(
        &mut self,
        text: &str,
        origin: &Path,
        inherited_default: Option<&str>,
        depth: usize,
        declared: &mut Vec<Declared>,
    ) -> Result<()> {
        let fail = |message: String| Error::ManifestParse {
            path: origin.to_path_buf(),
            message,
        };

        if depth > MAX_INCLUDE_DEPTH {
            return Err(fail(format!(
                "includes nested deeper than {}",
                MAX_INCLUDE_DEPTH
            )));
        }

        let doc = self.xot.parse(text).map_err(|e| fail(e.to_string()))?;
        let root = self
            .xot
            .document_element(doc)
            .map_err(|e| fail(e.to_string()))?;

        let children: Vec<Node> = self
            .xot
            .children(root)
            .filter(|&n| self.xot.element(n).is_some())
            .collect();

        // The default applies to every project of this document regardless
        // of where the <default> element appears.
        let local_default = children
            .iter()
            .filter(|&&n| self.is(n, self.names.default))
            .find_map(|&n| self.attr(n, self.names.revision));
        let default = local_default.or_else(|| inherited_default.map(str::to_string));

        let base_dir = origin.parent().map(Path::to_path_buf).unwrap_or_default();

        for node in children {
            if self.is(node, self.names.project) {
                let name = self
                    .attr(node, self.names.name)
                    .ok_or_else(|| fail("project without a name".to_string()))?;
                let repo_path = self
                    .attr(node, self.names.path)
                    .unwrap_or_else(|| name.clone());
                let revision = self
                    .attr(node, self.names.revision)
                    .or_else(|| default.clone())
                    .ok_or_else(|| fail(format!("project {} has no revision", name)))?;
                declared.push(Declared {
                    name,
                    entry: ManifestEntry {
                        repo_path,
                        revision,
                    },
                });
            } else if self.is(node, self.names.remove_project) {
                let name = self
                    .attr(node, self.names.name)
                    .ok_or_else(|| fail("remove-project without a name".to_string()))?;
                declared.retain(|d| d.name != name);
            } else if self.is(node, self.names.include) {
                let name = self
                    .attr(node, self.names.name)
                    .ok_or_else(|| fail("include without a name".to_string()))?;
                let included: PathBuf = base_dir.join(name);
                self.load_file(&included, default.as_deref(), depth + 1, declared)?;
            }
        }

        Ok(())
    }

    fn is(&self, node: Node, name: NameId) -> bool {
        self.xot
            .element(node)
            .map(|e| e.name() == name)
            .unwrap_or(false)
    }

    fn attr(&self, node: Node, name: NameId) -> Option<String> {
        self.xot.get_attribute(node, name).map(str::to_string)
    }
}
