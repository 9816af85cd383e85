use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use log::{debug, error, warn};

use super::binding::{BoundInstance, ElementBinding};
use super::descriptor::TypeDescriptor;
use super::generation::GenerationId;
use super::name::QualifiedName;
use crate::dom::{Document, DocumentOptions, Element};
use crate::error::BindingError;

/// Bindings of one namespace, keyed by qualified element name.
#[derive(Debug, Clone)]
struct BindingTable {
    namespace: String,
    bindings: HashMap<QualifiedName, ElementBinding>,
}

impl BindingTable {
    fn insert(
        &mut self,
        name: QualifiedName,
        descriptor: TypeDescriptor,
    ) -> Result<ElementBinding, BindingError> {
        name.validate()?;
        if name.namespace() != Some(self.namespace.as_str()) {
            return Err(BindingError::NamespaceMismatch {
                expected: self.namespace.clone(),
                found: name,
            });
        }
        if self.bindings.contains_key(&name) {
            return Err(BindingError::DuplicateBinding(name));
        }

        debug!("Binding element {} to type {}", name, descriptor.name());
        let binding = ElementBinding::new(name.clone(), descriptor);
        self.bindings.insert(name, binding.clone());
        Ok(binding)
    }

    fn lookup(&self, name: &QualifiedName) -> Result<&ElementBinding, BindingError> {
        self.bindings.get(name).ok_or_else(|| {
            warn!("No element binding for {}", name);
            BindingError::UnknownElement(name.clone())
        })
    }
}

/// Initialization phase of a [`NamespaceRegistry`].
///
/// Elements are registered here, each exactly once; [`build`] then freezes
/// the bindings into an immutable registry that can be shared freely.
///
/// [`build`]: NamespaceRegistryBuilder::build
///
/// # Examples
///
/// ```
/// use xml_binding_rs::core::descriptor::TypeDescriptor;
/// use xml_binding_rs::core::name::QualifiedName;
/// use xml_binding_rs::core::registry::NamespaceRegistryBuilder;
/// use xml_binding_rs::error::BindingError;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Deserialize, Serialize)]
/// struct PipelineRun {
///     id: u64,
/// }
///
/// let run = TypeDescriptor::of::<PipelineRun>("pipelineRun");
///
/// let mut builder = NamespaceRegistryBuilder::new("urn:x").fallback_namespace("urn:x");
/// let binding = builder
///     .register_element(QualifiedName::new("urn:x", "Run"), run.clone())
///     .unwrap();
/// assert_eq!(binding.type_descriptor(), &run);
///
/// // Each name is bound once
/// let duplicate = builder.register("Run", run.clone());
/// assert!(matches!(duplicate, Err(BindingError::DuplicateBinding(_))));
///
/// let registry = builder.build();
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug)]
pub struct NamespaceRegistryBuilder {
    table: BindingTable,
    fallback_namespace: Option<String>,
    generation: Option<GenerationId>,
    options: DocumentOptions,
}

impl NamespaceRegistryBuilder {
    /// Starts a registry for the target namespace `namespace`.
    pub fn new<N: Into<String>>(namespace: N) -> Self {
        Self {
            table: BindingTable {
                namespace: namespace.into(),
                bindings: HashMap::new(),
            },
            fallback_namespace: None,
            generation: None,
            options: DocumentOptions::default(),
        }
    }

    /// Sets the namespace assumed for an unqualified root element when the
    /// caller supplies no default namespace.
    pub fn fallback_namespace<N: Into<String>>(mut self, namespace: N) -> Self {
        self.fallback_namespace = Some(namespace.into());
        self
    }

    /// Stamps the registry with a generation identifier. A random one is
    /// minted when none is given.
    pub fn generation(mut self, generation: GenerationId) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Sets the options used to parse documents.
    pub fn options(mut self, options: DocumentOptions) -> Self {
        self.options = options;
        self
    }

    /// Binds `name` to `descriptor`.
    ///
    /// Fails with [`BindingError::DuplicateBinding`] if the name is already
    /// bound, and with [`BindingError::NamespaceMismatch`] if it is outside
    /// the target namespace. A failed call leaves the builder unchanged.
    pub fn register_element(
        &mut self,
        name: QualifiedName,
        descriptor: TypeDescriptor,
    ) -> Result<ElementBinding, BindingError> {
        self.table.insert(name, descriptor)
    }

    /// Binds `local_name`, qualified with the target namespace, to `descriptor`.
    pub fn register<L: Into<String>>(
        &mut self,
        local_name: L,
        descriptor: TypeDescriptor,
    ) -> Result<ElementBinding, BindingError> {
        let name = QualifiedName::new(self.table.namespace.clone(), local_name);
        self.table.insert(name, descriptor)
    }

    /// Exact-match lookup among the bindings registered so far.
    pub fn lookup_element(&self, name: &QualifiedName) -> Result<&ElementBinding, BindingError> {
        self.table.lookup(name)
    }

    /// The target namespace.
    pub fn namespace(&self) -> &str {
        &self.table.namespace
    }

    /// Ends the initialization phase.
    pub fn build(self) -> NamespaceRegistry {
        let generation = self.generation.unwrap_or_default();
        debug!(
            "Built registry for '{}' with {} bindings, generation {}",
            self.table.namespace,
            self.table.bindings.len(),
            generation
        );
        NamespaceRegistry {
            table: self.table,
            fallback_namespace: self.fallback_namespace,
            generation,
            options: self.options,
        }
    }
}

/// Immutable map from qualified element names to type descriptors for one
/// namespace, with the two document factories built on top of it.
///
/// A registry is built once, through [`NamespaceRegistryBuilder`], and then
/// only read. It is `Send + Sync`; share it by reference or `Arc`.
///
/// # Examples
///
/// ```
/// use xml_binding_rs::core::descriptor::TypeDescriptor;
/// use xml_binding_rs::core::registry::NamespaceRegistryBuilder;
/// use xml_binding_rs::error::BindingError;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Deserialize, Serialize)]
/// struct PipelineRun {
///     id: u64,
/// }
///
/// let mut builder = NamespaceRegistryBuilder::new("urn:x");
/// builder.register("Run", TypeDescriptor::of::<PipelineRun>("pipelineRun")).unwrap();
/// let registry = builder.build();
///
/// let run = registry
///     .create_from_text(r#"<Run xmlns="urn:x"><id>7</id></Run>"#, None, None)
///     .unwrap();
/// assert_eq!(run.downcast_ref::<PipelineRun>().unwrap().id, 7);
///
/// let unknown = registry.create_from_text(r#"<Unknown xmlns="urn:x"/>"#, None, None);
/// assert!(matches!(unknown, Err(BindingError::UnknownElement(_))));
///
/// let invalid = registry.create_from_text(
///     r#"<Run xmlns="urn:x"><id>not-a-number</id></Run>"#,
///     None,
///     None,
/// );
/// assert!(matches!(invalid, Err(BindingError::SchemaViolation { .. })));
/// ```
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    table: BindingTable,
    fallback_namespace: Option<String>,
    generation: GenerationId,
    options: DocumentOptions,
}

impl NamespaceRegistry {
    /// The target namespace every binding belongs to.
    pub fn namespace(&self) -> &str {
        &self.table.namespace
    }

    /// Namespace assumed for an unqualified root when no default is given.
    pub fn fallback_namespace(&self) -> Option<&str> {
        self.fallback_namespace.as_deref()
    }

    /// Identifier stamped on the registry when it was built.
    pub fn generation(&self) -> GenerationId {
        self.generation
    }

    /// Options used to parse documents.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Number of element bindings.
    pub fn len(&self) -> usize {
        self.table.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.bindings.is_empty()
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.table.bindings.contains_key(name)
    }

    /// All bindings, in no particular order.
    pub fn bindings(&self) -> impl Iterator<Item = &ElementBinding> {
        self.table.bindings.values()
    }

    /// Exact-match lookup; fails with [`BindingError::UnknownElement`].
    pub fn lookup_element(&self, name: &QualifiedName) -> Result<&ElementBinding, BindingError> {
        self.table.lookup(name)
    }

    /// Exact-match lookup returning `None` when nothing is bound.
    pub fn get(&self, name: &QualifiedName) -> Option<&ElementBinding> {
        self.table.bindings.get(name)
    }

    /// Parses `xml_text` and creates an instance from its document element.
    ///
    /// `default_namespace` applies only when the document element carries no
    /// namespace of its own; without it the registry's fallback namespace is
    /// used. `location_base`, typically a file name, prefixes the position of
    /// parse errors.
    pub fn create_from_text(
        &self,
        xml_text: &str,
        default_namespace: Option<&str>,
        location_base: Option<&str>,
    ) -> Result<BoundInstance, BindingError> {
        let document = Document::parse_with(xml_text, &self.options, location_base)?;
        self.create_from_node(document.root(), default_namespace)
    }

    /// Creates an instance from an already parsed element.
    ///
    /// The element's name must be bound in this registry. It may sit anywhere
    /// in a larger tree. Prefer [`NamespaceRegistry::create_from_text`] when
    /// starting from text.
    pub fn create_from_node(
        &self,
        node: &Element,
        default_namespace: Option<&str>,
    ) -> Result<BoundInstance, BindingError> {
        let name = self.resolve_name(node, default_namespace)?;
        let binding = self.lookup_element(&name)?;
        binding.create_from_element(node)
    }

    /// Parses raw XML bytes and creates an instance from their document
    /// element. The encoding comes from a byte order mark or the XML
    /// declaration, UTF-8 otherwise.
    pub fn create_from_bytes(
        &self,
        xml_bytes: &[u8],
        default_namespace: Option<&str>,
        location_base: Option<&str>,
    ) -> Result<BoundInstance, BindingError> {
        let document = Document::parse_bytes(xml_bytes, &self.options, location_base)?;
        self.create_from_node(document.root(), default_namespace)
    }

    /// Reads the whole of `reader` and creates an instance from it.
    pub fn create_from_reader<R: Read>(
        &self,
        mut reader: R,
        default_namespace: Option<&str>,
    ) -> Result<BoundInstance, BindingError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|e| {
            error!("Failed to read XML document: {}", e);
            BindingError::Io(format!("Failed to read XML document: {}", e))
        })?;
        self.create_from_bytes(&bytes, default_namespace, None)
    }

    /// Reads the file at `path` and creates an instance from it. Parse errors
    /// report positions relative to the path.
    pub fn create_from_path<P: AsRef<Path>>(
        &self,
        path: P,
        default_namespace: Option<&str>,
    ) -> Result<BoundInstance, BindingError> {
        let file_path = path.as_ref();
        let bytes = fs::read(file_path).map_err(|e| {
            error!("Failed to read XML file {}: {}", file_path.display(), e);
            BindingError::Io(format!(
                "Failed to read XML file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let location_base = file_path.display().to_string();
        self.create_from_bytes(&bytes, default_namespace, Some(&location_base))
    }

    /// Determines the qualified name an element is looked up under.
    fn resolve_name(
        &self,
        node: &Element,
        default_namespace: Option<&str>,
    ) -> Result<QualifiedName, BindingError> {
        if node.namespace().is_some() {
            return Ok(node.name().clone());
        }

        let namespace = default_namespace
            .or(self.fallback_namespace.as_deref())
            .ok_or_else(|| BindingError::UnresolvedNamespace(node.local_name().to_string()))?;
        debug!(
            "Element '{}' has no namespace, resolving it in '{}'",
            node.local_name(),
            namespace
        );
        Ok(node.name().with_namespace(namespace))
    }
}
