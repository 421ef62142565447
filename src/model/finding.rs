use serde::{Serialize, Serializer};
use std::fmt;

/// The `package.json` field a dependency was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyCategory {
    Dependencies,
    DevDependencies,
    PeerDependencies,
    OptionalDependencies,
    BundledDependencies,
}

impl DependencyCategory {
    /// The exact JSON field name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyCategory::Dependencies => "dependencies",
            DependencyCategory::DevDependencies => "devDependencies",
            DependencyCategory::PeerDependencies => "peerDependencies",
            DependencyCategory::OptionalDependencies => "optionalDependencies",
            DependencyCategory::BundledDependencies => "bundledDependencies",
        }
    }
}

impl fmt::Display for DependencyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vulnerable dependency found in one manifest or lockfile.
///
/// `version` is `None` only for bundled dependencies, which carry no version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub package: String,
    pub version: Option<String>,
    pub file: String,
    pub category: Option<DependencyCategory>,
}

impl Finding {
    pub fn new(
        package: impl Into<String>,
        version: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            version: Some(version.into()),
            file: file.into(),
            category: None,
        }
    }

    /// A bundled dependency whose installed version cannot be known.
    pub fn bundled(package: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: None,
            file: file.into(),
            category: Some(DependencyCategory::BundledDependencies),
        }
    }

    pub fn with_category(mut self, category: DependencyCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// The human-readable finding line.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => {
                write!(
                    f,
                    "Found vulnerable package {} with version {} in {}",
                    self.package, version, self.file
                )?;
                if let Some(category) = self.category {
                    write!(f, " ({})", category)?;
                }
                Ok(())
            }
            None => write!(
                f,
                "Found vulnerable package {} in {} ({}) - version unknown, check manually",
                self.package,
                self.file,
                self.category
                    .unwrap_or(DependencyCategory::BundledDependencies)
            ),
        }
    }
}

impl Serialize for Finding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Finding", 5)?;
        state.serialize_field("package", &self.package)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("file", &self.file)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}
