//! Ephemeral MSBuild project synthesis.
//!
//! Each resolution request gets a throwaway project directory:
//!
//! ```text
//! <root>/<request hash>/
//! ├── Project.fsproj        build description (package references + target)
//! ├── Library.fs            placeholder source
//! └── Project.fsproj.fsx    directives, written by the ScriptDependencies target
//! ```
//!
//! Rendering is a pure function of the template and the declarations, so
//! files are only rewritten when their content actually changes. That keeps
//! MSBuild's incremental restore from redoing work for a repeated request.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::options::PackageDeclaration;

mod template;

pub use template::substitute;
use template::{PACKAGE_REFERENCES_SLOT, PROJECT_TEMPLATE, SOURCE_TEMPLATE, TARGET_FRAMEWORK_SLOT};


/// File name of the build description inside a request directory.
pub const PROJECT_FILE_NAME: &str = "Project.fsproj";
/// File name of the placeholder source, next to the description.
pub const SOURCE_FILE_NAME: &str = "Library.fs";
/// Appended to the description path to name the directive file.
pub const DIRECTIVES_EXTENSION: &str = ".fsx";
/// Custom target embedded in the template.
pub const TARGET_NAME: &str = "ScriptDependencies";

/// Version written for packages that did not ask for one.
const FLOATING_VERSION: &str = "*";

/// Item attributes MSBuild interprets itself; never emitted as metadata.
const RESERVED_ATTRIBUTES: &[&str] = &[
    "include",
    "exclude",
    "remove",
    "update",
    "condition",
    "version",
    "keepmetadata",
    "removemetadata",
    "keepduplicates",
    "matchonmetadata",
    "matchonmetadataoptions",
];

// ─── Rendering ─────────────────────────────────────────────────────

/// A rendered build description and its companion source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EphemeralProject {
    pub description: String,
    pub source_file: String,
}

/// Which files [`EphemeralProject::write`] actually touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub description: bool,
    pub source_file: bool,
}

impl WriteReport {
    pub fn any(&self) -> bool {
        self.description || self.source_file
    }
}

/// Render the project for `target_framework` declaring `declarations`.
pub fn render(target_framework: &str, declarations: &[PackageDeclaration]) -> EphemeralProject {
    let references: Vec<String> = declarations.iter().map(package_reference_line).collect();

    let mut slots = BTreeMap::new();
    slots.insert(
        TARGET_FRAMEWORK_SLOT,
        xml_escape(&msbuild_escape(target_framework, false)),
    );
    slots.insert(PACKAGE_REFERENCES_SLOT, references.join("\n"));

    EphemeralProject {
        description: substitute(PROJECT_TEMPLATE, &slots),
        source_file: SOURCE_TEMPLATE.to_string(),
    }
}

/// One `<PackageReference .. />` line for a declaration.
fn package_reference_line(declaration: &PackageDeclaration) -> String {
    let version = declaration.version.as_deref().unwrap_or(FLOATING_VERSION);
    let mut line = format!(
        "    <PackageReference Include=\"{}\" Version=\"{}\"",
        xml_escape(&msbuild_escape(&declaration.id, true)),
        xml_escape(&msbuild_escape(version, false)),
    );
    for (key, value) in &declaration.metadata {
        if !is_metadata_name(key) {
            warn!(package = %declaration.id, metadata = %key, "dropping metadata that is not a valid item attribute");
            continue;
        }
        line.push_str(&format!(
            " {}=\"{}\"",
            key,
            xml_escape(&msbuild_escape(value, false))
        ));
    }
    line.push_str(" />");
    line
}

/// Metadata names must be plain identifiers and must not shadow the
/// attributes MSBuild interprets on items.
fn is_metadata_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_ATTRIBUTES.contains(&name.to_ascii_lowercase().as_str())
}

/// Keep MSBuild from evaluating `$(..)`, `@(..)` and `%(..)` or splitting
/// on `;`. In an `Include`, wildcards are escaped too.
fn msbuild_escape(s: &str, include: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '$' => out.push_str("%24"),
            '@' => out.push_str("%40"),
            ';' => out.push_str("%3B"),
            '*' if include => out.push_str("%2A"),
            '?' if include => out.push_str("%3F"),
            _ => out.push(c),
        }
    }
    out
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// ─── Writing ───────────────────────────────────────────────────────

impl EphemeralProject {
    /// Write the description to `description_path` and the placeholder
    /// source next to it, creating the directory. Files whose on-disk
    /// content already matches are left untouched.
    pub fn write(&self, description_path: &Path) -> io::Result<WriteReport> {
        let dir = description_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;

        let report = WriteReport {
            description: write_if_different(description_path, &self.description)?,
            source_file: write_if_different(&dir.join(SOURCE_FILE_NAME), &self.source_file)?,
        };
        debug!(
            path = %description_path.display(),
            description_written = report.description,
            source_written = report.source_file,
            "wrote project"
        );
        Ok(report)
    }
}

/// Write `content` to `path` unless the file already holds exactly that.
/// Returns whether a write happened.
pub fn write_if_different(path: &Path, content: &str) -> io::Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::write(path, content)?;
    Ok(true)
}

/// Where the build writes its directives for a given description.
pub fn directives_path(description_path: &Path) -> PathBuf {
    let mut path = OsString::from(description_path.as_os_str());
    path.push(DIRECTIVES_EXTENSION);
    PathBuf::from(path)
}
