use std::fmt;
use std::str::FromStr;

use crate::error::BindingError;

/// Identity key of an XML element or attribute declaration: a namespace URI
/// plus a local name.
///
/// Displays in Clark notation (`{urn:x}Run`), and parses back from it.
///
/// # Examples
///
/// ```
/// use xml_binding_rs::core::name::QualifiedName;
///
/// let name = QualifiedName::new("urn:x", "Run");
/// assert_eq!(name.to_string(), "{urn:x}Run");
/// assert_eq!("{urn:x}Run".parse::<QualifiedName>().unwrap(), name);
///
/// let bare = QualifiedName::unqualified("id");
/// assert_eq!(bare.namespace(), None);
/// assert_eq!(bare.to_string(), "id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    namespace: Option<String>,
    local_name: String,
}

impl QualifiedName {
    /// Creates a name in the given namespace.
    pub fn new<N: Into<String>, L: Into<String>>(namespace: N, local_name: L) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Creates a name that belongs to no namespace.
    pub fn unqualified<L: Into<String>>(local_name: L) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    pub(crate) fn from_parts(namespace: Option<String>, local_name: String) -> Self {
        Self {
            namespace,
            local_name,
        }
    }

    /// The namespace URI, `None` for an unqualified name.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The name without its namespace.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns the same local name placed in `namespace`.
    pub fn with_namespace<N: Into<String>>(&self, namespace: N) -> Self {
        Self::new(namespace, self.local_name.clone())
    }

    /// Checks that the local name is usable as an XML local name.
    pub fn validate(&self) -> Result<(), BindingError> {
        validate_local_name(&self.local_name)?;
        if self
            .namespace
            .as_deref()
            .is_some_and(|ns| ns.contains(|c: char| c == '{' || c == '}'))
        {
            return Err(BindingError::InvalidName(format!(
                "namespace of '{}' contains a brace",
                self.local_name
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_local_name(local_name: &str) -> Result<(), BindingError> {
    if local_name.is_empty() {
        return Err(BindingError::InvalidName("empty local name".to_string()));
    }
    if local_name
        .chars()
        .any(|c| c == ':' || c == '{' || c == '}' || c.is_whitespace())
    {
        return Err(BindingError::InvalidName(format!(
            "'{}' is not a valid local name",
            local_name
        )));
    }
    if local_name.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') {
        return Err(BindingError::InvalidName(format!(
            "'{}' must not start with a digit, '-' or '.'",
            local_name
        )));
    }
    Ok(())
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{}}}{}", namespace, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

impl FromStr for QualifiedName {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = match s.strip_prefix('{') {
            Some(rest) => {
                let (namespace, local_name) = rest.split_once('}').ok_or_else(|| {
                    BindingError::InvalidName(format!("unterminated namespace in '{}'", s))
                })?;
                QualifiedName::new(namespace, local_name)
            }
            None => QualifiedName::unqualified(s),
        };
        name.validate()?;
        Ok(name)
    }
}
