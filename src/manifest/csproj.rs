//! .NET project file parser
//!
//! Handles SDK-style `*.csproj` / `*.fsproj` / `*.vbproj` files and
//! central package management `Directory.Packages.props`:
//! - `<PackageReference Include="Name" Version="1.2.3" />`
//! - `<PackageReference Include="Name"><Version>1.2.3</Version></PackageReference>`
//! - `<PackageVersion Include="Name" Version="1.2.3" />`
//!
//! A reference without any version (managed centrally elsewhere) is skipped;
//! MSBuild property versions such as `$(SerilogVersion)` are kept verbatim so
//! the registry filter rejects them.

use crate::domain::Ecosystem;
use crate::error::ManifestError;
use crate::manifest::{DependencyMap, ManifestParser};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const MANIFEST: &str = "project file";
const REFERENCE_ELEMENTS: [&str; 2] = ["PackageReference", "PackageVersion"];

/// Parser for .NET project files
pub struct CsprojParser;

/// A reference element whose end tag has not been read yet
struct OpenReference {
    name: String,
    version: Option<String>,
}

impl ManifestParser for CsprojParser {
    fn parse(&self, content: &str) -> Result<DependencyMap, ManifestError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut dependencies = DependencyMap::new();
        let mut buf = Vec::new();
        let mut open: Option<OpenReference> = None;
        let mut in_version_element = false;

        loop {
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| ManifestError::invalid_xml(MANIFEST, e.to_string()))?
            {
                Event::Empty(ref e) => {
                    if let Some(reference) = read_reference(e) {
                        insert_reference(reference, &mut dependencies);
                    }
                }
                Event::Start(ref e) => {
                    let tag = local_name(e);
                    if REFERENCE_ELEMENTS.contains(&tag.as_str()) {
                        open = read_reference(e);
                    } else if tag == "Version" && open.is_some() {
                        in_version_element = true;
                    }
                }
                Event::Text(ref t) if in_version_element => {
                    if let Some(reference) = open.as_mut() {
                        let text = t
                            .unescape()
                            .map_err(|e| ManifestError::invalid_xml(MANIFEST, e.to_string()))?;
                        reference.version = Some(text.trim().to_string());
                    }
                }
                Event::End(ref e) => {
                    let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if tag == "Version" {
                        in_version_element = false;
                    } else if REFERENCE_ELEMENTS.contains(&tag.as_str()) {
                        if let Some(reference) = open.take() {
                            insert_reference(reference, &mut dependencies);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(dependencies)
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::DotNet
    }
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Reads `Include`/`Update` and `Version`/`VersionOverride` from a reference
/// element; `None` for any other element
fn read_reference(e: &BytesStart) -> Option<OpenReference> {
    if !REFERENCE_ELEMENTS.contains(&local_name(e).as_str()) {
        return None;
    }

    let mut name = None;
    let mut version = None;
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().unwrap_or_default().trim().to_string();
        match key.as_str() {
            "Include" | "Update" => name = Some(value),
            "Version" | "VersionOverride" => version = Some(value),
            _ => {}
        }
    }

    Some(OpenReference {
        name: name.filter(|n| !n.is_empty())?,
        version,
    })
}

fn insert_reference(reference: OpenReference, output: &mut DependencyMap) {
    if let Some(version) = reference.version {
        output.insert(reference.name, version);
    }
}
