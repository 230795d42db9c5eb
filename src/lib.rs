//! Inline package references for .NET scripting sessions.
//!
//! A session asks for `"Newtonsoft.Json, 13.0.3"`; scriptdeps writes a
//! throwaway MSBuild project declaring it, runs a restore through the
//! `dotnet` host (or a Visual Studio `MSBuild.exe`), and hands back the
//! `#r` / `#load` directives the build emitted. Package resolution itself
//! is entirely MSBuild's job.

pub mod build;
pub mod options;
pub mod project;
pub mod resolver;
pub mod toolchain;

// Re-exports: the whole pipeline from the crate root.
pub use build::{execute, BuildInvocation, BuildOutcome, ProcessRunner, SystemRunner};
pub use options::{parse, PackageDeclaration, PackageRequest, ParsedOption};
pub use project::{render, EphemeralProject};
pub use resolver::{
    prepare, CleanupPolicy, Directive, PreparedProject, ResolutionContext, ResolutionResult,
    ResolveError, Resolver,
};
pub use toolchain::{locate, Environment, ResolvedTool, RuntimeFlavor, ToolLocator};
