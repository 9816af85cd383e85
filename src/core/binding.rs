use std::any::Any;
use std::fmt;

use log::{debug, warn};

use super::descriptor::{Content, TypeDescriptor};
use super::name::QualifiedName;
use crate::dom::dom_writer::{self, NamespaceMode};
use crate::dom::{Document, Element};
use crate::error::BindingError;

/// Association of one qualified element name with one type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBinding {
    name: QualifiedName,
    descriptor: TypeDescriptor,
}

impl ElementBinding {
    pub fn new(name: QualifiedName, descriptor: TypeDescriptor) -> Self {
        Self { name, descriptor }
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Populates an instance of the bound type from `element`.
    ///
    /// The element's own name is not checked against the binding; callers
    /// resolve it first. Descendant elements must be unqualified or in the
    /// binding's namespace, anything else is a [`BindingError::SchemaViolation`].
    /// Attributes of other namespaces, such as `xsi:type`, are not part of the
    /// content and are skipped.
    pub fn create_from_element(&self, element: &Element) -> Result<BoundInstance, BindingError> {
        let local = element.localized(self.name.namespace()).map_err(|foreign| {
            warn!("Unexpected element {} inside {}", foreign, self.name);
            BindingError::SchemaViolation {
                element: self.name.clone(),
                message: format!("unexpected element {}", foreign),
            }
        })?;
        let xml = dom_writer::element_to_string(&local, NamespaceMode::Strip)?;
        debug!(
            "Creating {} as {} from: {}",
            self.name,
            self.descriptor.name(),
            xml
        );

        let value = self
            .descriptor
            .decode(&xml)
            .map_err(|message| BindingError::SchemaViolation {
                element: self.name.clone(),
                message,
            })?;

        Ok(BoundInstance {
            binding: self.clone(),
            value,
        })
    }
}

/// A populated data instance together with the binding that produced it.
///
/// # Examples
///
/// ```
/// use xml_binding_rs::core::descriptor::TypeDescriptor;
/// use xml_binding_rs::core::registry::NamespaceRegistryBuilder;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Deserialize, Serialize, PartialEq)]
/// struct PipelineRun {
///     id: u64,
/// }
///
/// let mut builder = NamespaceRegistryBuilder::new("urn:x");
/// builder.register("Run", TypeDescriptor::of::<PipelineRun>("pipelineRun")).unwrap();
/// let registry = builder.build();
///
/// let instance = registry
///     .create_from_text(r#"<Run xmlns="urn:x"><id>7</id></Run>"#, None, None)
///     .unwrap();
///
/// assert!(instance.is::<PipelineRun>());
/// assert_eq!(instance.downcast_ref::<PipelineRun>(), Some(&PipelineRun { id: 7 }));
/// assert_eq!(instance.to_xml().unwrap(), r#"<Run xmlns="urn:x"><id>7</id></Run>"#);
///
/// let run: PipelineRun = instance.downcast().unwrap();
/// assert_eq!(run.id, 7);
/// ```
pub struct BoundInstance {
    binding: ElementBinding,
    value: Box<dyn Content>,
}

impl BoundInstance {
    pub fn binding(&self) -> &ElementBinding {
        &self.binding
    }

    pub fn element_name(&self) -> &QualifiedName {
        self.binding.name()
    }

    pub fn type_descriptor(&self) -> &TypeDescriptor {
        self.binding.type_descriptor()
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.value).as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.value).as_any().downcast_ref::<T>()
    }

    /// Takes the value out, or gives the instance back if it is not a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.value.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            // `is::<T>()` held, the downcast cannot fail
            Err(_) => unreachable!("value type checked before downcast"),
        }
    }

    /// Renders the instance as the root element of the binding, in the
    /// binding's namespace.
    pub fn to_element(&self) -> Result<Element, BindingError> {
        let xml = self
            .binding
            .descriptor
            .encode((*self.value).as_any(), self.binding.name.local_name())
            .map_err(BindingError::Serialization)?;
        let mut root = Document::parse(&xml)?.into_root();
        if let Some(namespace) = self.binding.name.namespace() {
            root.qualify(namespace);
        }
        Ok(root)
    }

    /// Renders the instance as an XML fragment, see [`BoundInstance::to_element`].
    pub fn to_xml(&self) -> Result<String, BindingError> {
        self.to_element()?.to_xml()
    }

    /// Renders the instance as a complete document with an XML declaration.
    pub fn to_document(&self) -> Result<Document, BindingError> {
        self.to_element().map(Document::new)
    }
}

impl fmt::Debug for BoundInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundInstance")
            .field("element", &self.binding.name)
            .field("type", &self.binding.descriptor.name())
            .field("value", &self.value)
            .finish()
    }
}
