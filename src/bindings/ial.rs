//! Bindings for the `ial-schema` namespace of the Euclid system data model:
//! pipeline runs, task runs, processing orders and the configuration of the
//! infrastructure abstraction layer (IAL).
//!
//! | Element         | Schema type            | Rust type                  |
//! |-----------------|------------------------|----------------------------|
//! | `PPO`           | `sgsProcessingOrder`   | [`SgsProcessingOrder`]     |
//! | `ClusterConfig` | `clusterConfiguration` | [`ClusterConfiguration`]   |
//! | `TriggerData`   | `triggeringData`       | [`TriggeringData`]         |
//! | `Run`           | `pipelineRun`          | [`PipelineRun`]            |
//! | `TaskRun`       | `pipelineTaskRun`      | [`PipelineTaskRun`]        |
//! | `IalConfig`     | `ialConfiguration`     | [`IalConfiguration`]       |
//! | `TaskProducts`  | `taskProductList`      | [`TaskProductList`]        |
//!
//! ```
//! use xml_binding_rs::bindings::ial::{self, PipelineRun};
//!
//! let xml = r#"
//! <Run xmlns="http://euclid.esa.org/schema/sys/ial-schema">
//!   <id>7</id>
//!   <pipelineName>VIS_Processing</pipelineName>
//! </Run>
//! "#;
//!
//! let run = ial::create_from_document(xml, None, None).unwrap();
//! let run = run.downcast_ref::<PipelineRun>().unwrap();
//! assert_eq!(run.id, 7);
//! assert_eq!(run.pipeline_name, "VIS_Processing");
//! ```

use std::sync::{LazyLock, OnceLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::binding::BoundInstance;
use crate::core::descriptor::TypeDescriptor;
use crate::core::generation::GenerationId;
use crate::core::registry::{NamespaceRegistry, NamespaceRegistryBuilder};
use crate::dom::Element;
use crate::error::BindingError;

/// Target namespace of the schema.
pub const NAMESPACE: &str = "http://euclid.esa.org/schema/sys/ial-schema";

/// Generation the bindings were produced in.
pub const GENERATION: GenerationId =
    GenerationId::from_uuid(Uuid::from_u128(0xb4ece584_ab54_11e3_bd08_c4d98710dc86));

/// Processing order sent by the science ground segment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SgsProcessingOrder {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "pipelineName")]
    pub pipeline_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggeringData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterConfiguration {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "node", default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<ClusterNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterNode {
    #[serde(rename = "@host")]
    pub host: String,
    #[serde(rename = "@cores")]
    pub cores: u32,
}

/// What caused a pipeline run to start.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TriggeringData {
    #[serde(rename = "@source")]
    pub source: String,
    #[serde(rename = "parameter", default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TriggerParameter>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TriggerParameter {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "$text")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineRun {
    pub id: u64,
    #[serde(rename = "pipelineName")]
    pub pipeline_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "taskRun", default, skip_serializing_if = "Vec::is_empty")]
    pub task_runs: Vec<PipelineTaskRun>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineTaskRun {
    pub id: u64,
    #[serde(rename = "taskName")]
    pub task_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "exitCode", default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<TaskProductList>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IalConfiguration {
    pub workspace: String,
    #[serde(
        rename = "maxConcurrentRuns",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_concurrent_runs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterConfiguration>,
}

/// Files produced by a task run.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TaskProductList {
    #[serde(rename = "product", default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<TaskProduct>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskProduct {
    #[serde(rename = "@type")]
    pub product_type: String,
    #[serde(rename = "$text")]
    pub file_name: String,
}

// One descriptor per schema type, shared by every registry that binds it.
pub static SGS_PROCESSING_ORDER: LazyLock<TypeDescriptor> =
    LazyLock::new(|| TypeDescriptor::of::<SgsProcessingOrder>("sgsProcessingOrder"));
pub static CLUSTER_CONFIGURATION: LazyLock<TypeDescriptor> =
    LazyLock::new(|| TypeDescriptor::of::<ClusterConfiguration>("clusterConfiguration"));
pub static TRIGGERING_DATA: LazyLock<TypeDescriptor> =
    LazyLock::new(|| TypeDescriptor::of::<TriggeringData>("triggeringData"));
pub static PIPELINE_RUN: LazyLock<TypeDescriptor> =
    LazyLock::new(|| TypeDescriptor::of::<PipelineRun>("pipelineRun"));
pub static PIPELINE_TASK_RUN: LazyLock<TypeDescriptor> =
    LazyLock::new(|| TypeDescriptor::of::<PipelineTaskRun>("pipelineTaskRun"));
pub static IAL_CONFIGURATION: LazyLock<TypeDescriptor> =
    LazyLock::new(|| TypeDescriptor::of::<IalConfiguration>("ialConfiguration"));
pub static TASK_PRODUCT_LIST: LazyLock<TypeDescriptor> =
    LazyLock::new(|| TypeDescriptor::of::<TaskProductList>("taskProductList"));

/// Element names of the namespace with the descriptor each is bound to.
pub fn element_bindings() -> [(&'static str, &'static TypeDescriptor); 7] {
    [
        ("PPO", &*SGS_PROCESSING_ORDER),
        ("ClusterConfig", &*CLUSTER_CONFIGURATION),
        ("TriggerData", &*TRIGGERING_DATA),
        ("Run", &*PIPELINE_RUN),
        ("TaskRun", &*PIPELINE_TASK_RUN),
        ("IalConfig", &*IAL_CONFIGURATION),
        ("TaskProducts", &*TASK_PRODUCT_LIST),
    ]
}

/// Builds a fresh registry holding every element of the namespace.
///
/// Unqualified document elements fall back to [`NAMESPACE`].
pub fn build_registry() -> Result<NamespaceRegistry, BindingError> {
    let mut builder = NamespaceRegistryBuilder::new(NAMESPACE)
        .fallback_namespace(NAMESPACE)
        .generation(GENERATION);
    for (element, descriptor) in element_bindings() {
        builder.register(element, descriptor.clone())?;
    }
    Ok(builder.build())
}

static REGISTRY: OnceLock<NamespaceRegistry> = OnceLock::new();

/// The process-wide registry, built on first use.
pub fn registry() -> Result<&'static NamespaceRegistry, BindingError> {
    if let Some(registry) = REGISTRY.get() {
        return Ok(registry);
    }
    let registry = build_registry()?;
    Ok(REGISTRY.get_or_init(|| registry))
}

/// Parses `xml_text` and creates an instance from its document element.
///
/// See [`NamespaceRegistry::create_from_text`].
pub fn create_from_document(
    xml_text: &str,
    default_namespace: Option<&str>,
    location_base: Option<&str>,
) -> Result<BoundInstance, BindingError> {
    registry()?.create_from_text(xml_text, default_namespace, location_base)
}

/// Creates an instance from an already parsed element.
///
/// Prefer [`create_from_document`]; see [`NamespaceRegistry::create_from_node`].
pub fn create_from_dom(
    node: &Element,
    default_namespace: Option<&str>,
) -> Result<BoundInstance, BindingError> {
    registry()?.create_from_node(node, default_namespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::name::QualifiedName;

    #[test]
    fn should_bind_every_element() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.namespace(), NAMESPACE);
        assert_eq!(registry.fallback_namespace(), Some(NAMESPACE));
        assert_eq!(registry.generation(), GENERATION);

        let run = registry
            .lookup_element(&QualifiedName::new(NAMESPACE, "Run"))
            .unwrap();
        assert!(run.type_descriptor().ptr_eq(&PIPELINE_RUN));
        assert!(run.type_descriptor().is::<PipelineRun>());
    }

    #[test]
    fn shared_registry_is_built_once() {
        let first = registry().unwrap();
        let second = registry().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn independent_registries_share_descriptors() {
        let a = build_registry().unwrap();
        let b = build_registry().unwrap();
        let name = QualifiedName::new(NAMESPACE, "TaskProducts");
        assert_eq!(
            a.lookup_element(&name).unwrap().type_descriptor(),
            b.lookup_element(&name).unwrap().type_descriptor()
        );
    }

    #[test]
    fn generation_renders_as_urn() {
        assert_eq!(
            GENERATION.to_string(),
            "urn:uuid:b4ece584-ab54-11e3-bd08-c4d98710dc86"
        );
    }
}
