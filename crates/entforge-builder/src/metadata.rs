/// Package metadata stamping
///
/// The metadata template is loaded once per invocation (a missing template
/// is fatal before any project compiles) and re-parsed fresh for each
/// project, so one project's identity never bleeds into the next package.
/// Stamping rewrites the attributes of the package element and streams every
/// other event through untouched.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::config::{BuildOptions, PackageIdentity};
use crate::error::{BuildError, Result};

/// Fallback when neither the build options nor the package identity declare
/// a minimum platform version.
const DEFAULT_PLATFORM_VERSION: &str = "9.0.0";

const PACKAGE_ELEMENT: &[u8] = b"ExtensionPackage";

pub const METADATA_FILE: &str = "metadata.xml";

#[derive(Debug)]
pub struct MetadataWriter {
    template: String,
}

impl MetadataWriter {
    /// Load the template. Failure here aborts the whole invocation: the
    /// template sits outside any per-project boundary.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BuildError::FileNotFound(path.to_path_buf()));
        }
        Ok(Self {
            template: fs::read_to_string(path)?,
        })
    }

    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Stamp the template for one project and write it to the project's
    /// output directory.
    pub fn write(
        &self,
        out_dir: &Path,
        identity: &PackageIdentity,
        options: &BuildOptions,
        project_name: &str,
        suffix_project: bool,
    ) -> Result<PathBuf> {
        let document = self.stamp(identity, options, project_name, suffix_project)?;
        let path = out_dir.join(METADATA_FILE);
        fs::write(&path, document)?;
        Ok(path)
    }

    /// Parse the template and rewrite the package element's identity
    /// attributes. Pure with respect to the filesystem.
    pub fn stamp(
        &self,
        identity: &PackageIdentity,
        options: &BuildOptions,
        project_name: &str,
        suffix_project: bool,
    ) -> Result<String> {
        let mut reader = Reader::from_str(&self.template);
        let mut writer = Writer::new(Vec::new());

        loop {
            match reader.read_event()? {
                Event::Eof => break,
                Event::Start(e) if e.name().as_ref() == PACKAGE_ELEMENT => {
                    let stamped =
                        self.stamped_package(&e, identity, options, project_name, suffix_project)?;
                    writer.write_event(Event::Start(stamped))?;
                }
                Event::Empty(e) if e.name().as_ref() == PACKAGE_ELEMENT => {
                    let stamped =
                        self.stamped_package(&e, identity, options, project_name, suffix_project)?;
                    writer.write_event(Event::Empty(stamped))?;
                }
                event => writer.write_event(event)?,
            }
        }

        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    fn stamped_package(
        &self,
        element: &BytesStart<'_>,
        identity: &PackageIdentity,
        options: &BuildOptions,
        project_name: &str,
        suffix_project: bool,
    ) -> Result<BytesStart<'static>> {
        // Attributes replaced below; the template's vendor survives when no
        // author is configured.
        let mut replaced = vec![
            "name",
            "minimumPlatformVersion",
            "packageVersion",
            "description",
            "buildNumber",
        ];
        if identity.author.is_some() {
            replaced.push("vendor");
        }

        let mut stamped = BytesStart::new("ExtensionPackage");
        for attribute in element.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            if replaced.contains(&key.as_str()) {
                continue;
            }
            let value = attribute.unescape_value()?;
            stamped.push_attribute((key.as_str(), value.as_ref()));
        }

        // In separate multi-project mode the project name disambiguates
        // sibling packages sharing one repository.
        let package_name = if suffix_project {
            format!("{}-{}", identity.name, project_name)
        } else {
            identity.name.clone()
        };
        stamped.push_attribute(("name", package_name.as_str()));

        if let Some(author) = &identity.author {
            stamped.push_attribute(("vendor", author.as_str()));
        }

        let platform_version = options
            .minimum_platform_version
            .as_deref()
            .or(identity.minimum_platform_version.as_deref())
            .unwrap_or(DEFAULT_PLATFORM_VERSION);
        stamped.push_attribute(("minimumPlatformVersion", platform_version));

        stamped.push_attribute(("packageVersion", base_version(&identity.version)));
        stamped.push_attribute(("description", identity.description.as_deref().unwrap_or("")));
        stamped.push_attribute(("buildNumber", build_fingerprint(identity).as_str()));

        Ok(stamped)
    }
}

/// Package version with any pre-release suffix stripped.
fn base_version(version: &str) -> &str {
    version.split('-').next().unwrap_or(version)
}

/// Serialized payload carrying the source-repository reference, empty when
/// unset.
fn build_fingerprint(identity: &PackageIdentity) -> String {
    let url = identity
        .auto_update
        .as_ref()
        .and_then(|u| u.github_url.clone())
        .unwrap_or_default();
    serde_json::json!({ "gitHubURL": url }).to_string()
}
