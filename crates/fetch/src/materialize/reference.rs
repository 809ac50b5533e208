//! `resource://<namespace>/<category>/<file>` references

use mlit_core::{Error, Result, Validate, RESOURCE_SCHEME};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Opaque handle to a payload in the file tier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceReference {
    namespace: String,
    category: String,
    file_name: String,
}

impl ResourceReference {
    pub fn new(
        namespace: impl Into<String>,
        category: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Result<Self> {
        let reference = Self {
            namespace: namespace.into(),
            category: category.into(),
            file_name: file_name.into(),
        };
        reference.validate()?;
        Ok(reference)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn validate(&self) -> Result<()> {
        Validate::slug(&self.namespace, "namespace")?;
        Validate::slug(&self.category, "category")?;
        Validate::not_blank(&self.file_name, "file name")?;
        if self.file_name.contains(['/', '\\']) || self.file_name.starts_with('.') {
            return Err(Error::invalid_parameter(
                "uri",
                format!("'{}' is not a valid resource file name", self.file_name),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{RESOURCE_SCHEME}{}/{}/{}",
            self.namespace, self.category, self.file_name
        )
    }
}

impl FromStr for ResourceReference {
    type Err = Error;

    fn from_str(uri: &str) -> Result<Self> {
        let malformed = || {
            Error::invalid_parameter(
                "uri",
                format!("'{uri}' is not of the form {RESOURCE_SCHEME}<namespace>/<category>/<file>"),
            )
        };

        let rest = uri.strip_prefix(RESOURCE_SCHEME).ok_or_else(malformed)?;
        let mut segments = rest.split('/');
        let (Some(namespace), Some(category), Some(file_name), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(malformed());
        };

        Self::new(namespace, category, file_name)
    }
}

impl Serialize for ResourceReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
