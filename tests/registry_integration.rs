pub mod common;

use std::{fs, sync::Arc, thread};

use serde::{Deserialize, Serialize};
use xml_binding_rs::{
    core::{
        descriptor::TypeDescriptor,
        name::QualifiedName,
        registry::{NamespaceRegistry, NamespaceRegistryBuilder},
    },
    dom::Document,
    error::BindingError,
};

const NS: &str = "urn:x";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct RunType {
    id: u32,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct TypedRun {
    #[serde(rename = "@type", default)]
    kind: Option<String>,
    id: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Checkpoint {
    #[serde(rename = "@step")]
    step: u32,
    #[serde(rename = "$text")]
    note: String,
}

fn registry() -> NamespaceRegistry {
    let mut builder = NamespaceRegistryBuilder::new(NS);
    builder
        .register("Run", TypeDescriptor::of::<RunType>("RunType"))
        .unwrap();
    builder
        .register("Checkpoint", TypeDescriptor::of::<Checkpoint>("checkpoint"))
        .unwrap();
    builder
        .register("TypedRun", TypeDescriptor::of::<TypedRun>("typedRun"))
        .unwrap();
    builder.build()
}

#[test]
fn registered_run_is_created_from_text() {
    common::init_logger();
    let registry = registry();

    let instance = registry
        .create_from_text(r#"<Run xmlns="urn:x"><id>7</id></Run>"#, None, None)
        .unwrap();

    assert_eq!(instance.element_name(), &QualifiedName::new(NS, "Run"));
    assert_eq!(instance.type_descriptor().name(), "RunType");
    let run = instance.downcast_ref::<RunType>().unwrap();
    assert_eq!(run.id, 7);
    assert_eq!(run.label, None);
}

#[test]
fn unknown_root_fails_without_instance() {
    let registry = registry();

    let result = registry.create_from_text(r#"<Unknown xmlns="urn:x"/>"#, None, None);

    match result {
        Err(BindingError::UnknownElement(name)) => {
            assert_eq!(name, QualifiedName::new(NS, "Unknown"));
        }
        other => panic!("expected an unknown element error, got {:?}", other),
    }
}

#[test]
fn non_numeric_id_is_a_schema_violation() {
    let registry = registry();

    let result = registry.create_from_text(
        r#"<Run xmlns="urn:x"><id>not-a-number</id></Run>"#,
        None,
        None,
    );

    assert!(matches!(result, Err(BindingError::SchemaViolation { .. })));
}

#[test]
fn missing_required_field_is_a_schema_violation() {
    let registry = registry();

    let result = registry.create_from_text(
        r#"<Run xmlns="urn:x"><label>no id</label></Run>"#,
        None,
        None,
    );

    assert!(matches!(result, Err(BindingError::SchemaViolation { .. })));
}

#[test]
fn schema_instance_attributes_are_not_content() {
    let registry = registry();

    let typed = registry
        .create_from_text(
            r#"<TypedRun xmlns="urn:x" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="TypedRun"><id>7</id></TypedRun>"#,
            None,
            None,
        )
        .unwrap();
    assert_eq!(
        typed.downcast_ref::<TypedRun>(),
        Some(&TypedRun { kind: None, id: 7 })
    );

    let both = registry
        .create_from_text(
            r#"<TypedRun xmlns="urn:x" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="TypedRun" type="fast"><id>7</id></TypedRun>"#,
            None,
            None,
        )
        .unwrap();
    assert_eq!(
        both.downcast_ref::<TypedRun>().unwrap().kind.as_deref(),
        Some("fast")
    );
}

#[test]
fn attributes_of_other_namespaces_are_skipped() {
    let registry = registry();

    let instance = registry
        .create_from_text(
            r#"<TypedRun xmlns="urn:x" xmlns:o="urn:other" o:type="slow" xml:lang="en"><id>2</id></TypedRun>"#,
            None,
            None,
        )
        .unwrap();
    assert_eq!(instance.downcast_ref::<TypedRun>().unwrap().kind, None);
}

#[test]
fn children_of_another_namespace_are_a_schema_violation() {
    let registry = registry();

    let result = registry.create_from_text(
        r#"<Run xmlns="urn:x" xmlns:o="urn:other"><o:id>7</o:id></Run>"#,
        None,
        None,
    );

    match result {
        Err(BindingError::SchemaViolation { element, message }) => {
            assert_eq!(element, QualifiedName::new(NS, "Run"));
            assert!(message.contains("{urn:other}id"), "{}", message);
        }
        other => panic!("expected a schema violation, got {:?}", other),
    }
}

#[test]
fn prefixed_children_of_the_binding_namespace_are_content() {
    let registry = registry();

    let instance = registry
        .create_from_text(
            r#"<x:Run xmlns:x="urn:x"><x:id>4</x:id><label>plain</label></x:Run>"#,
            None,
            None,
        )
        .unwrap();
    assert_eq!(
        instance.downcast_ref::<RunType>(),
        Some(&RunType {
            id: 4,
            label: Some("plain".to_string()),
        })
    );
}

#[test]
fn whitespace_only_value_is_kept() {
    let registry = registry();

    let instance = registry
        .create_from_text(
            "<Run xmlns=\"urn:x\">\n  <id>7</id>\n  <label>  </label>\n</Run>",
            None,
            None,
        )
        .unwrap();
    assert_eq!(
        instance.downcast_ref::<RunType>().unwrap().label.as_deref(),
        Some("  ")
    );
}

fn latin1_run() -> Vec<u8> {
    let mut bytes = br#"<?xml version="1.0" encoding="ISO-8859-1"?>
<Run xmlns="urn:x"><id>5</id><label>caf"#
        .to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"</label></Run>");
    bytes
}

#[test]
fn declared_encoding_is_honoured() {
    let registry = registry();

    let instance = registry.create_from_reader(latin1_run().as_slice(), None).unwrap();
    assert_eq!(
        instance.downcast_ref::<RunType>().unwrap().label.as_deref(),
        Some("caf\u{e9}")
    );

    let path = common::temp_path("xml");
    fs::write(&path, latin1_run()).expect("Failed to write XML file");
    let instance = registry.create_from_path(&path, None).unwrap();
    assert_eq!(
        instance.downcast_ref::<RunType>().unwrap().label.as_deref(),
        Some("caf\u{e9}")
    );
    fs::remove_file(&path).ok();
}

#[test]
fn undecodable_bytes_are_a_parse_error() {
    let registry = registry();
    let bytes = b"<Run xmlns=\"urn:x\"><id>5</id><label>caf\xE9</label></Run>";

    let error = registry
        .create_from_bytes(bytes, None, Some("run.xml"))
        .unwrap_err();
    match error {
        BindingError::Parse { location, .. } => {
            assert!(location.starts_with("run.xml:1:"), "{}", location);
        }
        other => panic!("expected a parse error, got {:?}", other),
    }

    let error = registry.create_from_reader(&bytes[..], None).unwrap_err();
    assert!(error.is_parse(), "{:?}", error);
}

#[test]
fn malformed_text_is_a_parse_error() {
    let registry = registry();

    let result = registry.create_from_text(r#"<Run xmlns="urn:x"><id>7</Run>"#, None, None);

    assert!(result.unwrap_err().is_parse());
}

#[test]
fn parsing_twice_yields_independent_equal_instances() {
    let registry = registry();
    let xml = r#"<Run xmlns="urn:x"><id>3</id><label>first</label></Run>"#;

    let first = registry.create_from_text(xml, None, None).unwrap();
    let second = registry.create_from_text(xml, None, None).unwrap();

    let mut first: RunType = first.downcast().unwrap();
    let second: RunType = second.downcast().unwrap();
    assert_eq!(first, second);

    first.label = Some("changed".to_string());
    assert_eq!(second.label.as_deref(), Some("first"));
}

#[test]
fn default_namespace_resolves_unprefixed_root() {
    let registry = registry();
    let xml = "<Run><id>1</id></Run>";

    let instance = registry.create_from_text(xml, Some(NS), None).unwrap();
    assert!(instance.is::<RunType>());

    // No fallback configured on this registry
    let result = registry.create_from_text(xml, None, None);
    assert!(matches!(result, Err(BindingError::UnresolvedNamespace(_))));
}

#[test]
fn fallback_namespace_applies_when_no_default_is_given() {
    let mut builder = NamespaceRegistryBuilder::new(NS).fallback_namespace(NS);
    builder
        .register("Run", TypeDescriptor::of::<RunType>("RunType"))
        .unwrap();
    let registry = builder.build();

    let instance = registry
        .create_from_text("<Run><id>2</id></Run>", None, None)
        .unwrap();
    assert_eq!(instance.downcast_ref::<RunType>().unwrap().id, 2);

    // An explicit default wins over the fallback
    let result = registry.create_from_text("<Run><id>2</id></Run>", Some("urn:y"), None);
    assert!(matches!(result, Err(BindingError::UnknownElement(_))));
}

#[test]
fn prefixed_root_is_resolved_through_its_declaration() {
    let registry = registry();

    let instance = registry
        .create_from_text(
            r#"<x:Checkpoint xmlns:x="urn:x" step="4">stacked</x:Checkpoint>"#,
            None,
            None,
        )
        .unwrap();

    assert_eq!(
        instance.downcast_ref::<Checkpoint>(),
        Some(&Checkpoint {
            step: 4,
            note: "stacked".to_string(),
        })
    );
}

#[test]
fn node_nested_in_a_larger_document_is_bound() {
    let registry = registry();
    let document = Document::parse(
        r#"
        <envelope xmlns="urn:transport">
          <header>ignored</header>
          <body>
            <Run xmlns="urn:x"><id>11</id></Run>
          </body>
        </envelope>"#,
    )
    .unwrap();

    let run = document
        .root()
        .child("body")
        .and_then(|body| body.child("Run"))
        .unwrap();
    let instance = registry.create_from_node(run, None).unwrap();
    assert_eq!(instance.downcast_ref::<RunType>().unwrap().id, 11);

    // The envelope itself is not bound here
    let result = registry.create_from_node(document.root(), None);
    assert!(matches!(result, Err(BindingError::UnknownElement(_))));
}

#[test]
fn descriptor_is_shared_between_registries() {
    let shared = TypeDescriptor::of::<RunType>("RunType");

    let mut first = NamespaceRegistryBuilder::new(NS);
    first.register("Run", shared.clone()).unwrap();
    let first = first.build();

    let mut second = NamespaceRegistryBuilder::new(NS);
    second.register("Run", shared.clone()).unwrap();
    second.register("PreviousRun", shared.clone()).unwrap();
    let second = second.build();

    let name = QualifiedName::new(NS, "Run");
    assert!(first.lookup_element(&name).unwrap().type_descriptor().ptr_eq(&shared));
    assert!(second.lookup_element(&name).unwrap().type_descriptor().ptr_eq(&shared));
    assert!(second.bindings().all(|binding| binding.type_descriptor() == &shared));
    assert_ne!(first.generation(), second.generation());
}

#[test]
fn registry_is_shared_across_threads() {
    let registry = Arc::new(registry());

    let handles: Vec<_> = (0..4_u32)
        .map(|id| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let xml = format!(r#"<Run xmlns="urn:x"><id>{}</id></Run>"#, id);
                let instance = registry.create_from_text(&xml, None, None).unwrap();
                instance.downcast::<RunType>().unwrap().id
            })
        })
        .collect();

    let mut ids: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn document_is_read_from_a_file() {
    let registry = registry();
    let path = common::temp_path("xml");
    fs::write(&path, r#"<Run xmlns="urn:x"><id>5</id><label>file</label></Run>"#)
        .expect("Failed to write XML file");

    let instance = registry.create_from_path(&path, None).unwrap();
    assert_eq!(
        instance.downcast_ref::<RunType>().unwrap().label.as_deref(),
        Some("file")
    );

    fs::remove_file(&path).ok();
}

#[test]
fn instance_renders_back_to_equal_content() {
    let registry = registry();
    let instance = registry
        .create_from_text(
            r#"<Run xmlns="urn:x"><id>9</id><label>a &amp; b</label></Run>"#,
            None,
            None,
        )
        .unwrap();

    let xml = instance.to_xml().unwrap();
    let reparsed = registry.create_from_text(&xml, None, None).unwrap();

    assert_eq!(
        instance.downcast_ref::<RunType>(),
        reparsed.downcast_ref::<RunType>()
    );
}
