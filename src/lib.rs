#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # XML Binding for Rust

 A small toolkit for turning XML documents that follow a published XML Schema into typed Rust
 values. Each XML Schema namespace gets a **registry** that maps qualified element names to
 **type descriptors**; the registry then parses documents and hands back a populated instance of
 the type bound to the document element.

 ## Core Concepts

- **QualifiedName:** A namespace URI plus a local name, the identity of an element declaration.
- **TypeDescriptor:** A shared handle to a Rust type that can be populated from XML content. Any type deriving serde's `Deserialize` and `Serialize` can be described.
- **ElementBinding:** The association of one qualified name to one type descriptor. Several elements may share a descriptor.
- **NamespaceRegistry:** The immutable set of bindings of one namespace, built once through a `NamespaceRegistryBuilder` and shared afterwards. It exposes `create_from_text` and `create_from_node`.
- **Document:** The parsed, namespace-resolved XML tree the registry works on.

 ## Features

| **Feature**   | **Description**                                                  |
|---------------|------------------------------------------------------------------|
| ial           | Enables the bindings of the Euclid `ial-schema` namespace        |
| full          | Enables all available features                                   |

 ## Getting Started

```rust
# use serde::{Deserialize, Serialize};
# use xml_binding_rs::{
#     core::{descriptor::TypeDescriptor, registry::NamespaceRegistryBuilder},
#     error::BindingError,
# };
#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct PipelineRun {
    id: u64,
    #[serde(rename = "pipelineName")]
    pipeline_name: String,
    #[serde(rename = "taskRun", default)]
    task_runs: Vec<TaskRun>,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct TaskRun {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "$text")]
    name: String,
}

fn main() -> Result<(), BindingError> {
    let mut builder = NamespaceRegistryBuilder::new("urn:pipeline").fallback_namespace("urn:pipeline");
    builder.register("Run", TypeDescriptor::of::<PipelineRun>("pipelineRun"))?;
    let registry = builder.build();

    let xml = r#"
    <Run xmlns="urn:pipeline">
      <id>7</id>
      <pipelineName>VIS</pipelineName>
      <taskRun id="1">calibrate</taskRun>
      <taskRun id="2">stack</taskRun>
    </Run>"#;

    let instance = registry.create_from_text(xml, None, None)?;
    let run = instance.downcast_ref::<PipelineRun>().unwrap();

    assert_eq!(run.id, 7);
    assert_eq!(run.task_runs.len(), 2);
    assert_eq!(run.task_runs[1].name, "stack");

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core module for element bindings and registries
pub mod core;

/// Parsed XML document trees
pub mod dom;

/// Error types for binding operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Bundled binding sets (for example: the Euclid `ial-schema` namespace)
pub mod bindings;
