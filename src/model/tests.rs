use metamark_core::markers::{self, BUILTIN_MARKERS, BuiltinMarkerId};
use metamark_core::targets::TargetId;

use super::*;
use crate::resolver::{MetadataProvider, Resolver, predicates};

fn id(s: &str) -> ElementId {
    s.parse().unwrap()
}

fn leaf(value: &str) -> Instance {
    Instance::marker("Leaf").with_value(value)
}

fn leaves(values: &[&str]) -> Instance {
    Instance::marker("Leaves").with_attr(
        "value",
        AttrValue::List(
            values
                .iter()
                .map(|v| AttrValue::Instance(Box::new(leaf(v))))
                .collect(),
        ),
    )
}

fn repeatable(container: &str) -> Instance {
    Instance::marker("Repeatable").with_value(container)
}

fn target(kinds: &[&str]) -> Instance {
    Instance::marker("Target").with_attr(
        "value",
        AttrValue::List(kinds.iter().map(|k| AttrValue::Text((*k).to_string())).collect()),
    )
}

/// Marker <- Leaf (repeatable via Leaves)
fn base() -> GraphBuilder {
    MetadataGraph::builder()
        .declare_type("Marker", vec![])
        .declare_type("Leaf", vec![Instance::marker("Marker"), repeatable("Leaves")])
        .declare_type("Leaves", vec![])
}

// ============================================================================
// Built-ins
// ============================================================================

#[test]
fn test_builtins_are_seeded_and_self_annotated() {
    let graph = base().build().unwrap();
    for info in BUILTIN_MARKERS {
        let ty = TypeName::new(info.item.canonical);
        assert!(graph.has_type(&ty));
        assert_eq!(graph.type_metadata(&ty).unwrap().len(), info.meta.len());
    }
    let documented = TypeName::new(markers::as_str(BuiltinMarkerId::Documented));
    let meta = graph.type_metadata(&documented).unwrap();
    assert!(meta.iter().any(|inst| inst.ty == documented));
}

#[test]
fn test_builtin_target_value_is_marker_type() {
    let graph = base().build().unwrap();
    let meta = graph.type_metadata(&"Retention".into()).unwrap();
    let target = meta.iter().find(|inst| inst.ty.as_str() == "Target").unwrap();
    assert_eq!(target.attr("value").unwrap().texts(), vec!["ANNOTATION_TYPE"]);
    let retention = meta.iter().find(|inst| inst.ty.as_str() == "Retention").unwrap();
    assert_eq!(retention.value(), Some("RUNTIME"));
}

#[test]
fn test_builtin_cannot_be_redeclared() {
    let err = base().declare_type("Documented", vec![]).build().unwrap_err();
    assert_eq!(err, GraphError::ReservedType("Documented".into()));
}

#[test]
fn test_empty_type_name_is_rejected() {
    let err = base().declare_type("", vec![]).build().unwrap_err();
    assert_eq!(err, GraphError::EmptyTypeName);
}

// ============================================================================
// Provider contract
// ============================================================================

#[test]
fn test_unknown_element_is_an_error() {
    let graph = base().build().unwrap();
    let err = graph.element_metadata(&id("type:Ghost")).unwrap_err();
    assert_eq!(err, GraphError::UnknownElement("type:Ghost".into()));
}

#[test]
fn test_declared_element_without_metadata_is_empty() {
    let graph = base().declare_element(id("type:Bare"), None, vec![]).build().unwrap();
    assert!(graph.element_metadata(&id("type:Bare")).unwrap().is_empty());
}

#[test]
fn test_unknown_type_lookup_is_an_error() {
    let graph = base().build().unwrap();
    assert!(matches!(
        graph.type_metadata(&"Ghost".into()),
        Err(GraphError::UnknownType { .. })
    ));
}

#[test]
fn test_unknown_nested_type_is_rejected() {
    let nested = Instance::marker("Leaf").with_attr("value", AttrValue::Instance(Box::new(Instance::marker("Ghost"))));
    let err = base()
        .declare_element(id("type:W"), None, vec![nested])
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::UnknownType { name, .. } if name.as_str() == "Ghost"));
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn test_container_map_is_derived_from_repeatable() {
    let graph = base().build().unwrap();
    assert_eq!(graph.container_of(&"Leaves".into()).unwrap(), Some("Leaf".into()));
    assert_eq!(graph.container_of(&"Leaf".into()).unwrap(), None);
}

#[test]
fn test_components_in_order() {
    let graph = base().build().unwrap();
    let components = graph.components_of(&leaves(&["a", "b", "c"])).unwrap();
    let values: Vec<_> = components.iter().filter_map(Instance::value).collect();
    assert_eq!(values, vec!["a", "b", "c"]);
}

#[test]
fn test_repeatable_naming_unknown_container() {
    let err = MetadataGraph::builder()
        .declare_type("Leaf", vec![repeatable("Nowhere")])
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::UnknownType { name, .. } if name.as_str() == "Nowhere"));
}

#[test]
fn test_two_types_sharing_a_container() {
    let err = base()
        .declare_type("Other", vec![repeatable("Leaves")])
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::ConflictingContainer { .. }));
}

#[test]
fn test_container_with_wrong_component_type() {
    let bad = Instance::marker("Leaves").with_attr(
        "value",
        AttrValue::List(vec![AttrValue::Instance(Box::new(Instance::marker("Marker")))]),
    );
    let err = base()
        .declare_element(id("type:W"), None, vec![bad])
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::MalformedContainer { .. }));
}

#[test]
fn test_container_without_list() {
    let err = base()
        .declare_element(id("type:W"), None, vec![Instance::marker("Leaves")])
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::MalformedContainer { .. }));
}

#[test]
fn test_builtin_cannot_be_a_container() {
    let err = MetadataGraph::builder()
        .declare_type("Leaf", vec![repeatable("Documented")])
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::MalformedContainer { .. }));
}

fn holding(container: &str, items: Vec<Instance>) -> Instance {
    Instance::marker(container).with_attr(
        "value",
        AttrValue::List(items.into_iter().map(|i| AttrValue::Instance(Box::new(i))).collect()),
    )
}

/// `Z` carries `Marker` and packs into `X`, which itself packs into `Y`.
fn stacked_containers() -> GraphBuilder {
    MetadataGraph::builder()
        .declare_type("Marker", vec![])
        .declare_type("Z", vec![Instance::marker("Marker"), repeatable("X")])
        .declare_type("X", vec![repeatable("Y")])
        .declare_type("Y", vec![])
}

#[test]
fn test_container_of_containers_is_accepted() {
    let graph = stacked_containers()
        .declare_element(
            id("type:E"),
            None,
            vec![holding("Y", vec![holding("X", vec![Instance::marker("Z").with_value("z1")])])],
        )
        .build()
        .unwrap();
    assert_eq!(graph.repeated_type(&TypeName::new("Y")), Some(&TypeName::new("X")));
    assert_eq!(graph.repeated_type(&TypeName::new("X")), Some(&TypeName::new("Z")));
}

#[test]
fn test_malformed_inner_container_is_rejected() {
    let err = stacked_containers()
        .declare_element(
            id("type:E"),
            None,
            vec![holding("Y", vec![holding("X", vec![Instance::marker("Marker")])])],
        )
        .build()
        .unwrap_err();
    assert!(
        matches!(&err, GraphError::MalformedContainer { container, .. } if container.as_str() == "X"),
        "{err:?}"
    );
}

// ============================================================================
// Inheritance
// ============================================================================

fn inheriting() -> GraphBuilder {
    base()
        .declare_type("Tag", vec![Instance::marker("Inherited")])
        .declare_type("Plain", vec![])
}

#[test]
fn test_inherited_instances_follow_extends() {
    let graph = inheriting()
        .declare_element(
            id("type:Base"),
            None,
            vec![Instance::marker("Tag").with_value("base"), Instance::marker("Plain")],
        )
        .declare_element(id("type:Mid"), Some(id("type:Base")), vec![])
        .declare_element(id("type:Child"), Some(id("type:Mid")), vec![leaf("own")])
        .build()
        .unwrap();
    let metadata = graph.element_metadata(&id("type:Child")).unwrap();
    assert_eq!(metadata, vec![leaf("own"), Instance::marker("Tag").with_value("base")]);
}

#[test]
fn test_own_instance_overrides_inherited() {
    let graph = inheriting()
        .declare_element(id("type:Base"), None, vec![Instance::marker("Tag").with_value("base")])
        .declare_element(
            id("type:Child"),
            Some(id("type:Base")),
            vec![Instance::marker("Tag").with_value("child")],
        )
        .build()
        .unwrap();
    let metadata = graph.element_metadata(&id("type:Child")).unwrap();
    assert_eq!(metadata, vec![Instance::marker("Tag").with_value("child")]);
}

#[test]
fn test_nearest_ancestor_wins() {
    let graph = inheriting()
        .declare_element(id("type:A"), None, vec![Instance::marker("Tag").with_value("a")])
        .declare_element(id("type:B"), Some(id("type:A")), vec![Instance::marker("Tag").with_value("b")])
        .declare_element(id("type:C"), Some(id("type:B")), vec![])
        .build()
        .unwrap();
    let metadata = graph.element_metadata(&id("type:C")).unwrap();
    assert_eq!(metadata, vec![Instance::marker("Tag").with_value("b")]);
}

#[test]
fn test_inheritance_cycle_is_rejected() {
    let err = inheriting()
        .declare_element(id("type:A"), Some(id("type:B")), vec![])
        .declare_element(id("type:B"), Some(id("type:A")), vec![])
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::InheritanceCycle(_)));
}

#[test]
fn test_extends_requires_type_elements() {
    let err = inheriting()
        .declare_element(id("type:A"), None, vec![])
        .declare_element(id("field:A.x"), Some(id("type:A")), vec![])
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidExtends { .. }));

    let err = inheriting()
        .declare_element(id("type:A"), Some(id("type:Missing")), vec![])
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidExtends { .. }));
}

// ============================================================================
// Lint
// ============================================================================

#[test]
fn test_lint_reports_target_mismatch() {
    let graph = base()
        .declare_type("FieldOnly", vec![target(&["FIELD"])])
        .declare_element(id("type:W"), None, vec![Instance::marker("FieldOnly")])
        .declare_element(id("field:W.x"), None, vec![Instance::marker("FieldOnly")])
        .build()
        .unwrap();
    let warnings = graph.lint();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].attached_to, "type:W");
    assert_eq!(warnings[0].kind, TargetId::Type);
    assert_eq!(warnings[0].to_string(), "@FieldOnly on type:W (TYPE): Target allows [FIELD]");
}

#[test]
fn test_lint_checks_container_components_and_meta_metadata() {
    let graph = base()
        .declare_type("Leaf2", vec![target(&["METHOD"]), repeatable("Leaf2s")])
        .declare_type("Leaf2s", vec![])
        .declare_type("Composite", vec![Instance::marker("Leaf2")])
        .declare_element(
            id("method:W.run()"),
            None,
            vec![Instance::marker("Leaf2s").with_attr(
                "value",
                AttrValue::List(vec![
                    AttrValue::Instance(Box::new(Instance::marker("Leaf2"))),
                    AttrValue::Instance(Box::new(Instance::marker("Leaf2"))),
                ]),
            )],
        )
        .build()
        .unwrap();
    let warnings = graph.lint();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert_eq!(warnings[0].attached_to, "@Composite");
    assert_eq!(warnings[0].kind, TargetId::MarkerType);
}

#[test]
fn test_builtins_are_lint_clean() {
    assert!(base().build().unwrap().lint().is_empty());
}

#[test]
fn test_lint_looks_inside_nested_containers() {
    let graph = MetadataGraph::builder()
        .declare_type("Marker", vec![])
        .declare_type("Z", vec![repeatable("X"), target(&["FIELD"])])
        .declare_type("X", vec![repeatable("Y")])
        .declare_type("Y", vec![])
        .declare_element(
            id("type:E"),
            None,
            vec![holding("Y", vec![holding("X", vec![Instance::marker("Z")])])],
        )
        .build()
        .unwrap();
    let warnings = graph.lint();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert_eq!(warnings[0].marker.as_str(), "Z");
}

// ============================================================================
// Discovery over the graph
// ============================================================================

#[test]
fn test_discovery_flattens_nested_containers() {
    let graph = stacked_containers()
        .declare_element(
            id("type:E"),
            None,
            vec![holding(
                "Y",
                vec![holding(
                    "X",
                    vec![Instance::marker("Z").with_value("z1"), Instance::marker("Z").with_value("z2")],
                )],
            )],
        )
        .build()
        .unwrap();
    let resolver = Resolver::new(&graph).with_terminal_types(graph.builtin_types());
    let found: Vec<_> = resolver
        .discover(predicates::always(), &id("type:E"), &"Marker".into())
        .collect::<Result<_, _>>()
        .unwrap();
    let values: Vec<_> = found.iter().map(|o| o.instance().value().unwrap_or_default()).collect();
    assert_eq!(values, vec!["z1", "z2"]);
    assert!(found.iter().all(|o| o.container().map(|c| c.ty.as_str()) == Some("Y")));
}

#[test]
fn test_discovery_with_builtin_terminals() {
    let graph = base()
        .declare_type("Composite", vec![Instance::marker("Documented"), leaves(&["x", "y"])])
        .declare_element(id("type:W"), None, vec![Instance::marker("Composite"), leaf("direct")])
        .build()
        .unwrap();
    let resolver = Resolver::new(&graph).with_terminal_types(graph.builtin_types());
    let found: Vec<String> = resolver
        .discover(predicates::always(), &id("type:W"), &"Marker".into())
        .map(|occ| occ.unwrap().instance().value().unwrap_or_default().to_string())
        .collect();
    assert_eq!(found, vec!["x", "y", "direct"]);
}

#[test]
fn test_discovery_finds_inherited_markers() {
    let graph = base()
        .declare_type("Tagged", vec![Instance::marker("Inherited"), leaf("from-parent")])
        .declare_element(id("type:Base"), None, vec![Instance::marker("Tagged")])
        .declare_element(id("type:Child"), Some(id("type:Base")), vec![])
        .build()
        .unwrap();
    let resolver = Resolver::new(&graph).with_terminal_types(graph.builtin_types());
    let found: Vec<_> = resolver
        .discover(predicates::always(), &id("type:Child"), &"Marker".into())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].provenance(), "Leaf <- Tagged <- type:Child");
}

#[test]
fn test_gated_discovery_with_conditions() {
    let graph = base()
        .declare_type("Conditional", vec![])
        .declare_type(
            "Slow",
            vec![
                Instance::marker("Conditional").with_attr("flag", AttrValue::Text("slow".into())),
                leaf("slow"),
            ],
        )
        .declare_element(id("type:W"), None, vec![Instance::marker("Slow"), leaf("fast")])
        .build()
        .unwrap();
    let run = |conditions: Conditions| -> Vec<String> {
        let evaluate = move |inst: &Instance| conditions.evaluate(inst);
        Resolver::new(&graph)
            .with_terminal_types(graph.builtin_types())
            .discover(
                predicates::gated_by(TypeName::new("Conditional"), evaluate),
                &id("type:W"),
                &"Marker".into(),
            )
            .map(|occ| occ.unwrap().instance().value().unwrap_or_default().to_string())
            .collect()
    };
    assert_eq!(run(Conditions::default()), vec!["fast"]);
    assert_eq!(run(Conditions::new(["slow"])), vec!["slow", "fast"]);
}
