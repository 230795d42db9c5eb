use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::ParsedOption;

// ─── Data Types ────────────────────────────────────────────────────

/// One requested package, as declared to the build tool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PackageDeclaration {
    pub id: String,
    /// Requested version or range. `None` floats to the latest release.
    pub version: Option<String>,
    /// Extra item metadata carried onto the package reference
    /// (e.g. `privateassets=all`).
    pub metadata: BTreeMap<String, String>,
}

/// A whole reference spec, grouped by package.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PackageRequest {
    pub packages: Vec<PackageDeclaration>,
    /// Target framework override given inline (`framework=net8.0`).
    pub target_framework: Option<String>,
}

impl PackageDeclaration {
    pub fn new(id: impl Into<String>) -> Self {
        PackageDeclaration {
            id: id.into(),
            version: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    fn apply(&mut self, name: &str, value: Option<String>) {
        match (name, value) {
            ("version", Some(version)) => self.version = Some(version),
            (name, None) if is_reserved(name) => {
                warn!(option = name, package = %self.id, "ignoring option without a value");
            }
            (name, value) => {
                let value = value.unwrap_or_else(|| "true".to_string());
                self.metadata.insert(name.to_string(), value);
            }
        }
    }
}

// ─── Grouping ──────────────────────────────────────────────────────

impl PackageRequest {
    /// Parse and group a reference spec in one step.
    pub fn from_spec(spec: &str) -> Self {
        Self::from_options(super::parse(spec))
    }

    /// Fold parsed options into package declarations, in input order.
    ///
    /// A bare value starts a new package, unless it looks like a version and
    /// either directly follows the current package's id or that package has
    /// no version yet. Naming a package again selects its earlier
    /// declaration, so a version after the repeat replaces the old one.
    ///
    /// `include=`/`package=`/`id=` always start a package; `framework=` sets
    /// the target framework; every other named option attaches to the
    /// current package.
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ParsedOption>,
    {
        let mut request = PackageRequest::default();
        // Declaration that later named options attach to.
        let mut current: Option<usize> = None;
        // Set while the previous token was the current package's id.
        let mut after_id = false;

        for ParsedOption { name, value } in options {
            let named = after_id;
            after_id = false;
            match (name.as_deref(), value) {
                (None, None) => {}
                (None, Some(value)) => {
                    let pending_version = current
                        .filter(|&i| named || request.packages[i].version.is_none())
                        .filter(|_| looks_like_version(&value));
                    match pending_version {
                        Some(i) => request.packages[i].version = Some(value),
                        None => {
                            current = Some(request.start_package(value));
                            after_id = true;
                        }
                    }
                }
                (Some(name), Some(value)) if is_package_key(name) => {
                    current = Some(request.start_package(value));
                    after_id = true;
                }
                (Some(name), Some(value)) if is_framework_key(name) => {
                    request.target_framework = Some(value);
                }
                (Some(name), value) => match current {
                    Some(i) => request.packages[i].apply(name, value),
                    None => warn!(option = name, "ignoring option before any package"),
                },
            }
        }

        request
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Index of the declaration for `id`, creating it if needed.
    /// Package ids compare case-insensitively, as NuGet does.
    fn start_package(&mut self, id: String) -> usize {
        if let Some(i) = self
            .packages
            .iter()
            .position(|p| p.id.eq_ignore_ascii_case(&id))
        {
            return i;
        }
        self.packages.push(PackageDeclaration::new(id));
        self.packages.len() - 1
    }
}

fn is_package_key(name: &str) -> bool {
    matches!(name, "include" | "package" | "id")
}

fn is_framework_key(name: &str) -> bool {
    matches!(name, "framework" | "targetframework" | "tfm")
}

fn is_reserved(name: &str) -> bool {
    name == "version" || is_package_key(name) || is_framework_key(name)
}

/// Versions and ranges start with a digit, a range bracket, or a float `*`.
fn looks_like_version(value: &str) -> bool {
    value
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '[' | '(' | '*'))
}
