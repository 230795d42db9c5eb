use std::collections::BTreeMap;

/// Delimiter around slot names in templates: `$$NAME$$`.
///
/// MSBuild uses `$(..)`, `@(..)` and `%(..)`, so `$$` never collides.
const MARKER: &str = "$$";

pub(super) const TARGET_FRAMEWORK_SLOT: &str = "TARGETFRAMEWORK";
pub(super) const PACKAGE_REFERENCES_SLOT: &str = "PACKAGEREFERENCES";

/// The build description. `ScriptDependencies` restores the declared
/// packages, drops the host's own runtime assemblies, and writes `#r` and
/// `#load` directives for what is left to `<project>.fsx`.
pub(super) const PROJECT_TEMPLATE: &str = r##"<Project Sdk="Microsoft.NET.Sdk">

  <PropertyGroup>
    <TargetFramework>$$TARGETFRAMEWORK$$</TargetFramework>
    <IsPackable>false</IsPackable>
    <DisableImplicitFSharpCoreReference>true</DisableImplicitFSharpCoreReference>
    <DisableImplicitNuGetFallbackFolder>true</DisableImplicitNuGetFallbackFolder>
    <ScriptDirectivesFile>$(MSBuildProjectFullPath).fsx</ScriptDirectivesFile>
  </PropertyGroup>

  <ItemGroup>
    <Compile Include="Library.fs" />
  </ItemGroup>

  <ItemGroup>
$$PACKAGEREFERENCES$$
  </ItemGroup>

  <Target Name="ScriptDependencies" DependsOnTargets="ResolvePackageAssets">
    <PropertyGroup>
      <ScriptPackageRoot>$([MSBuild]::EnsureTrailingSlash('$(NuGetPackageRoot)'))</ScriptPackageRoot>
    </PropertyGroup>
    <ItemGroup>
      <ResolvedAsset Include="@(RuntimeCopyLocalItems)"
                     Condition="'%(RuntimeCopyLocalItems.AssetType)' == 'runtime' and '%(RuntimeCopyLocalItems.Filename)' != 'FSharp.Core' and '%(RuntimeCopyLocalItems.Filename)' != 'System.ValueTuple'" />
      <ReferenceDirective Include="#r @&quot;%(ResolvedAsset.FullPath)&quot;"
                          Condition="Exists('%(ResolvedAsset.FullPath)')" />
      <LoadCandidate Include="$(ScriptPackageRoot)$([MSBuild]::ValueOrDefault('%(ResolvedAsset.NuGetPackageId)', '').ToLowerInvariant())/$([MSBuild]::ValueOrDefault('%(ResolvedAsset.NuGetPackageVersion)', '').ToLowerInvariant())/content/%(ResolvedAsset.Filename)%(ResolvedAsset.Extension).fsx"
                     Condition="'%(ResolvedAsset.NuGetPackageId)' != ''" />
      <LoadDirective Include="#load @&quot;%(LoadCandidate.FullPath)&quot;"
                     Condition="Exists('%(LoadCandidate.FullPath)')" />
      <HeaderLine Include="// Generated by scriptdeps. Do not edit." />
      <HeaderLine Include="// Host: $(DOTNET_HOST_PATH)" />
      <HeaderLine Include="// SDK search paths: $(MSBuildSDKsPath)" />
    </ItemGroup>
    <WriteLinesToFile File="$(ScriptDirectivesFile)"
                      Lines="@(HeaderLine);@(ReferenceDirective);@(LoadDirective)"
                      Overwrite="true"
                      WriteOnlyWhenDifferent="true" />
  </Target>

</Project>
"##;

/// Placeholder source so the SDK has something to compile.
pub(super) const SOURCE_TEMPLATE: &str = r#"namespace ScriptDependencies

module Placeholder =
    let value = 0
"#;

/// Replace every `$$NAME$$` whose name is in `slots`.
///
/// Unknown names, and a lone `$$` with no closing marker, are copied
/// through unchanged.
pub fn substitute(template: &str, slots: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(MARKER) {
        let after = &rest[start + MARKER.len()..];
        let slot = after
            .find(MARKER)
            .and_then(|end| slots.get(&after[..end]).map(|value| (end, value)));
        match slot {
            Some((end, value)) => {
                out.push_str(&rest[..start]);
                out.push_str(value);
                rest = &after[end + MARKER.len()..];
            }
            None => {
                out.push_str(&rest[..start + MARKER.len()]);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
