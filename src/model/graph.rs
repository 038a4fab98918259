//! The in-memory metadata graph.
//!
//! A [`MetadataGraph`] is built once (from a JSON document via [`super::loader`], or programmatically through
//! [`GraphBuilder`]) and is immutable afterwards. Building it:
//!
//! 1. seeds the built-in structural markers from [`metamark_core::markers`],
//! 2. checks that every referenced marker type is declared,
//! 3. derives the container map from `Repeatable` declarations and checks every container instance,
//! 4. checks `extends` links between type elements (no dangling parents, no cycles).
//!
//! Anything the resolver later asks for has therefore already been validated; lookup errors at discovery time
//! only happen for elements or types the caller made up.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use metamark_core::markers::{self, BUILTIN_MARKERS, BuiltinMarkerId, MetaValue};
use metamark_core::targets::{self, TargetId};

use super::element::ElementId;
use super::errors::GraphError;
use super::value::{AttrValue, Instance, TypeName};
use crate::resolver::MetadataProvider;

#[derive(Debug, Clone)]
struct TypeDecl {
    annotations: Vec<Instance>,
    builtin: bool,
}

#[derive(Debug, Clone)]
struct ElementDecl {
    extends: Option<ElementId>,
    annotations: Vec<Instance>,
}

/// A validated, immutable metadata graph.
#[derive(Debug, Clone)]
pub struct MetadataGraph {
    types: BTreeMap<TypeName, TypeDecl>,
    elements: BTreeMap<ElementId, ElementDecl>,
    /// container type -> repeated type
    containers: HashMap<TypeName, TypeName>,
}

/// Collects declarations before validation.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    types: Vec<(TypeName, Vec<Instance>)>,
    elements: Vec<(ElementId, Option<ElementId>, Vec<Instance>)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a marker type and the meta-metadata attached to it.
    pub fn declare_type(mut self, name: impl Into<TypeName>, annotations: Vec<Instance>) -> Self {
        self.types.push((name.into(), annotations));
        self
    }

    /// Declare a program element, optionally extending another `type:` element.
    pub fn declare_element(mut self, id: ElementId, extends: Option<ElementId>, annotations: Vec<Instance>) -> Self {
        self.elements.push((id, extends, annotations));
        self
    }

    /// Validate the declarations and build the graph.
    ///
    /// ## Errors
    /// The first structural problem found, as a [`GraphError`].
    #[tracing::instrument(skip_all, fields(types = self.types.len(), elements = self.elements.len()))]
    pub fn build(self) -> Result<MetadataGraph, GraphError> {
        let mut types = builtin_decls();
        for (name, annotations) in self.types {
            if name.as_str().trim().is_empty() {
                return Err(GraphError::EmptyTypeName);
            }
            if types.get(&name).is_some_and(|decl| decl.builtin) {
                return Err(GraphError::ReservedType(name));
            }
            types.insert(
                name,
                TypeDecl {
                    annotations,
                    builtin: false,
                },
            );
        }

        let mut elements = BTreeMap::new();
        for (id, extends, annotations) in self.elements {
            elements.insert(id, ElementDecl { extends, annotations });
        }

        let mut graph = MetadataGraph {
            types,
            elements,
            containers: HashMap::new(),
        };
        graph.check_referenced_types()?;
        graph.containers = graph.derive_containers()?;
        graph.check_container_instances()?;
        graph.check_inheritance()?;

        tracing::debug!(
            types = graph.types.len(),
            elements = graph.elements.len(),
            containers = graph.containers.len(),
            "graph built"
        );
        Ok(graph)
    }
}

fn builtin_decls() -> BTreeMap<TypeName, TypeDecl> {
    BUILTIN_MARKERS
        .iter()
        .map(|info| {
            let annotations = info
                .meta
                .iter()
                .map(|meta| {
                    let instance = Instance::marker(markers::as_str(meta.marker));
                    match meta.value {
                        MetaValue::Absent => instance,
                        MetaValue::Text(text) => instance.with_value(text),
                        MetaValue::List(items) => instance.with_attr(
                            markers::VALUE_ATTR,
                            AttrValue::List(items.iter().map(|s| AttrValue::Text((*s).to_string())).collect()),
                        ),
                    }
                })
                .collect();
            (
                TypeName::new(info.item.canonical),
                TypeDecl {
                    annotations,
                    builtin: true,
                },
            )
        })
        .collect()
}

fn builtin_name(id: BuiltinMarkerId) -> TypeName {
    TypeName::new(markers::as_str(id))
}

impl MetadataGraph {
    /// Start declaring a graph.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// The built-in structural marker types, for use as terminal types.
    pub fn builtin_types(&self) -> Vec<TypeName> {
        BUILTIN_MARKERS.iter().map(|m| TypeName::new(m.item.canonical)).collect()
    }

    pub fn has_type(&self, name: &TypeName) -> bool {
        self.types.contains_key(name)
    }

    pub fn has_element(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Declared marker types (built-ins included), sorted by name.
    pub fn types(&self) -> impl Iterator<Item = &TypeName> {
        self.types.keys()
    }

    /// Declared elements, sorted by id.
    pub fn elements(&self) -> impl Iterator<Item = &ElementId> {
        self.elements.keys()
    }

    /// The repeated type a container type holds, if it is one.
    pub fn repeated_type(&self, container: &TypeName) -> Option<&TypeName> {
        self.containers.get(container)
    }

    fn annotations_of(&self, ty: &TypeName) -> &[Instance] {
        self.types.get(ty).map(|decl| decl.annotations.as_slice()).unwrap_or(&[])
    }

    fn is_inherited(&self, ty: &TypeName) -> bool {
        let inherited = builtin_name(BuiltinMarkerId::Inherited);
        self.annotations_of(ty).iter().any(|inst| inst.ty == inherited)
    }

    /// Element kinds a type's `Target` allows, or `None` if the type has no `Target`.
    fn allowed_targets(&self, ty: &TypeName) -> Option<Vec<&str>> {
        let target = builtin_name(BuiltinMarkerId::Target);
        self.annotations_of(ty)
            .iter()
            .find(|inst| inst.ty == target)
            .map(|inst| inst.attr(markers::VALUE_ATTR).map(AttrValue::texts).unwrap_or_default())
    }

    /// Own instances plus those inherited along the `extends` chain, nearest declaration first.
    fn collect_inherited(&self, decl: &ElementDecl) -> Vec<Instance> {
        let mut out = decl.annotations.clone();
        let mut seen: HashSet<TypeName> = out.iter().map(|inst| inst.ty.clone()).collect();
        let mut parent = decl.extends.as_ref();
        while let Some(id) = parent {
            let Some(parent_decl) = self.elements.get(id) else {
                break;
            };
            for inst in &parent_decl.annotations {
                if self.is_inherited(&inst.ty) && !seen.contains(&inst.ty) {
                    out.push(inst.clone());
                }
            }
            seen.extend(parent_decl.annotations.iter().map(|inst| inst.ty.clone()));
            parent = parent_decl.extends.as_ref();
        }
        out
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn check_referenced_types(&self) -> Result<(), GraphError> {
        for (name, decl) in &self.types {
            self.check_instances(&decl.annotations, || format!("marker type `{name}`"))?;
        }
        for (id, decl) in &self.elements {
            self.check_instances(&decl.annotations, || format!("element `{id}`"))?;
        }
        Ok(())
    }

    fn check_instances(&self, instances: &[Instance], used_by: impl Fn() -> String) -> Result<(), GraphError> {
        let mut stack: Vec<&Instance> = instances.iter().collect();
        while let Some(inst) = stack.pop() {
            if !self.types.contains_key(&inst.ty) {
                return Err(GraphError::UnknownType {
                    name: inst.ty.clone(),
                    used_by: used_by(),
                });
            }
            stack.extend(inst.nested());
        }
        Ok(())
    }

    fn derive_containers(&self) -> Result<HashMap<TypeName, TypeName>, GraphError> {
        let repeatable = builtin_name(BuiltinMarkerId::Repeatable);
        let mut containers: HashMap<TypeName, TypeName> = HashMap::new();
        for (repeated, decl) in &self.types {
            for inst in decl.annotations.iter().filter(|inst| inst.ty == repeatable) {
                let Some(container) = inst.value().map(TypeName::new) else {
                    return Err(GraphError::MalformedContainer {
                        container: repeated.clone(),
                        reason: "`Repeatable` must name the container type as its value".into(),
                    });
                };
                match self.types.get(&container) {
                    None => {
                        return Err(GraphError::UnknownType {
                            name: container,
                            used_by: format!("`Repeatable` on `{repeated}`"),
                        });
                    }
                    Some(container_decl) if container_decl.builtin => {
                        return Err(GraphError::MalformedContainer {
                            container,
                            reason: "a built-in marker type cannot be a container".into(),
                        });
                    }
                    Some(_) => {}
                }
                if &container == repeated {
                    return Err(GraphError::MalformedContainer {
                        container,
                        reason: "a marker type cannot contain itself".into(),
                    });
                }
                if let Some(first) = containers.get(&container) {
                    return Err(GraphError::ConflictingContainer {
                        container: container.clone(),
                        first: first.clone(),
                        second: repeated.clone(),
                    });
                }
                containers.insert(container, repeated.clone());
            }
        }
        Ok(containers)
    }

    fn check_container_instances(&self) -> Result<(), GraphError> {
        let attached = self
            .types
            .values()
            .flat_map(|decl| decl.annotations.iter())
            .chain(self.elements.values().flat_map(|decl| decl.annotations.iter()));
        for inst in attached {
            self.check_container(inst)?;
        }
        Ok(())
    }

    /// Validate `inst` if it is a container, then every component that is a container itself.
    fn check_container(&self, inst: &Instance) -> Result<(), GraphError> {
        if self.containers.contains_key(&inst.ty) {
            for component in self.container_components(inst)? {
                self.check_container(&component)?;
            }
        }
        Ok(())
    }

    /// Push `inst`, or the leaves of the (possibly nested) container it is.
    fn flatten_into(&self, inst: &Instance, out: &mut Vec<Instance>) {
        if !self.containers.contains_key(&inst.ty) {
            out.push(inst.clone());
            return;
        }
        for component in self.container_components(inst).unwrap_or_default() {
            self.flatten_into(&component, out);
        }
    }

    fn container_components(&self, container: &Instance) -> Result<Vec<Instance>, GraphError> {
        let malformed = |reason: String| GraphError::MalformedContainer {
            container: container.ty.clone(),
            reason,
        };
        let repeated = self
            .containers
            .get(&container.ty)
            .ok_or_else(|| malformed("not a container type".into()))?;
        let Some(AttrValue::List(items)) = container.attr(markers::VALUE_ATTR) else {
            return Err(malformed("`value` is not a list".into()));
        };
        items
            .iter()
            .map(|item| match item {
                AttrValue::Instance(component) if &component.ty == repeated => Ok(component.as_ref().clone()),
                AttrValue::Instance(component) => Err(malformed(format!(
                    "holds `@{}`, expected `@{repeated}`",
                    component.ty
                ))),
                other => Err(malformed(format!("holds `{other}`, expected `@{repeated}`"))),
            })
            .collect()
    }

    fn check_inheritance(&self) -> Result<(), GraphError> {
        for (id, decl) in &self.elements {
            let Some(parent) = &decl.extends else {
                continue;
            };
            let invalid = |reason: &str| GraphError::InvalidExtends {
                element: id.to_string(),
                parent: parent.to_string(),
                reason: reason.to_string(),
            };
            if id.kind() != TargetId::Type || parent.kind() != TargetId::Type {
                return Err(invalid("only `type:` elements take part in inheritance"));
            }
            if !self.elements.contains_key(parent) {
                return Err(invalid("parent is not declared"));
            }
        }

        for id in self.elements.keys() {
            let mut seen = HashSet::new();
            let mut current = Some(id);
            while let Some(at) = current {
                if !seen.insert(at) {
                    return Err(GraphError::InheritanceCycle(at.to_string()));
                }
                current = self.elements.get(at).and_then(|decl| decl.extends.as_ref());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Lint
    // ========================================================================

    /// Report instances attached to element kinds their type's `Target` does not allow.
    ///
    /// Containers are checked through their components. Built-in types are not linted.
    pub fn lint(&self) -> Vec<LintWarning> {
        let mut warnings = Vec::new();
        for (id, decl) in &self.elements {
            self.lint_instances(&decl.annotations, id.kind(), &id.to_string(), &mut warnings);
        }
        for (name, decl) in self.types.iter().filter(|(_, decl)| !decl.builtin) {
            self.lint_instances(&decl.annotations, TargetId::MarkerType, &format!("@{name}"), &mut warnings);
        }
        warnings
    }

    fn lint_instances(&self, instances: &[Instance], kind: TargetId, at: &str, out: &mut Vec<LintWarning>) {
        for inst in instances {
            let mut components = Vec::new();
            self.flatten_into(inst, &mut components);
            for component in components {
                let Some(allowed) = self.allowed_targets(&component.ty) else {
                    continue;
                };
                if allowed.iter().any(|spelling| targets::from_str(spelling) == Some(kind)) {
                    continue;
                }
                out.push(LintWarning {
                    attached_to: at.to_string(),
                    marker: component.ty.clone(),
                    kind,
                    allowed: allowed.iter().map(|s| s.to_string()).collect(),
                });
            }
        }
    }
}

/// An instance attached somewhere its type's `Target` does not allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    pub attached_to: String,
    pub marker: TypeName,
    pub kind: TargetId,
    pub allowed: Vec<String>,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{} on {} ({}): Target allows [{}]",
            self.marker,
            self.attached_to,
            targets::as_str(self.kind),
            self.allowed.join(", ")
        )
    }
}

impl MetadataProvider for MetadataGraph {
    type Element = ElementId;
    type Type = TypeName;
    type Instance = Instance;
    type Error = GraphError;

    fn element_metadata(&self, element: &ElementId) -> Result<Vec<Instance>, GraphError> {
        let decl = self
            .elements
            .get(element)
            .ok_or_else(|| GraphError::UnknownElement(element.to_string()))?;
        Ok(self.collect_inherited(decl))
    }

    fn type_metadata(&self, ty: &TypeName) -> Result<Vec<Instance>, GraphError> {
        self.types
            .get(ty)
            .map(|decl| decl.annotations.clone())
            .ok_or_else(|| GraphError::UnknownType {
                name: ty.clone(),
                used_by: "a metadata lookup".into(),
            })
    }

    fn type_of(&self, instance: &Instance) -> TypeName {
        instance.ty.clone()
    }

    fn container_of(&self, ty: &TypeName) -> Result<Option<TypeName>, GraphError> {
        Ok(self.containers.get(ty).cloned())
    }

    fn components_of(&self, container: &Instance) -> Result<Vec<Instance>, GraphError> {
        self.container_components(container)
    }
}
