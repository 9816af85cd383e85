use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A value that a [`TypeDescriptor`] produced, with its concrete type erased.
pub trait Content: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + fmt::Debug + Send + Sync> Content for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

type DecodeFn = fn(&str) -> Result<Box<dyn Content>, String>;
type EncodeFn = fn(&dyn Any, &str) -> Result<String, String>;

struct Descriptor {
    name: String,
    rust_type: &'static str,
    type_id: TypeId,
    decode: DecodeFn,
    encode: EncodeFn,
}

/// Shared handle to a data shape that can be populated from XML content.
///
/// A descriptor is created once, ahead of any parsing, from a Rust type that
/// implements serde's `Deserialize` and `Serialize`. Element names map to
/// XML child elements, `@`-prefixed names to attributes and `$text` to the
/// text content, as usual with `quick-xml`.
///
/// Cloning is cheap and clones compare equal: equality is identity of the
/// handle, so two descriptors built separately for the same Rust type are
/// distinct.
///
/// # Examples
///
/// ```
/// use xml_binding_rs::core::descriptor::TypeDescriptor;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Deserialize, Serialize)]
/// struct PipelineRun {
///     id: u64,
/// }
///
/// let descriptor = TypeDescriptor::of::<PipelineRun>("pipelineRun");
/// assert_eq!(descriptor.name(), "pipelineRun");
/// assert!(descriptor.is::<PipelineRun>());
/// assert_eq!(descriptor.clone(), descriptor);
/// assert_ne!(TypeDescriptor::of::<PipelineRun>("pipelineRun"), descriptor);
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
    inner: Arc<Descriptor>,
}

impl TypeDescriptor {
    /// Describes `T` under the schema type name `name`.
    pub fn of<T>(name: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Descriptor {
                name: name.into(),
                rust_type: type_name::<T>(),
                type_id: TypeId::of::<T>(),
                decode: decode_with::<T>,
                encode: encode_with::<T>,
            }),
        }
    }

    /// The schema type name, e.g. `pipelineRun`.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The Rust type the descriptor populates.
    pub fn rust_type(&self) -> &'static str {
        self.inner.rust_type
    }

    /// `TypeId` of the described Rust type.
    pub fn type_id(&self) -> TypeId {
        self.inner.type_id
    }

    /// Returns `true` if the descriptor populates values of type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.type_id == TypeId::of::<T>()
    }

    /// Whether both handles point to the same descriptor.
    pub fn ptr_eq(&self, other: &TypeDescriptor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Decodes a namespace-free XML fragment whose root is the element to
    /// populate.
    pub(crate) fn decode(&self, xml: &str) -> Result<Box<dyn Content>, String> {
        (self.inner.decode)(xml)
    }

    /// Encodes `value` as an element named `root`.
    pub(crate) fn encode(&self, value: &dyn Any, root: &str) -> Result<String, String> {
        (self.inner.encode)(value, root)
    }
}

fn decode_with<T>(xml: &str) -> Result<Box<dyn Content>, String>
where
    T: DeserializeOwned + Content,
{
    quick_xml::de::from_str::<T>(xml)
        .map(|value| Box::new(value) as Box<dyn Content>)
        .map_err(|e| e.to_string())
}

fn encode_with<T>(value: &dyn Any, root: &str) -> Result<String, String>
where
    T: Serialize + 'static,
{
    let value = value
        .downcast_ref::<T>()
        .ok_or_else(|| format!("value is not a {}", type_name::<T>()))?;
    quick_xml::se::to_string_with_root(root, value).map_err(|e| e.to_string())
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.inner.name)
            .field("rust_type", &self.inner.rust_type)
            .finish()
    }
}
