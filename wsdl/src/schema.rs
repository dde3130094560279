use std::collections::HashMap;

use crate::types::{Definition, NamespacedName};

/// The slice of XML Schema this crate models: enough to resolve message
/// parts and to interrogate wrapper elements. Anything outside that slice
/// is captured as [`TypeContent::Opaque`] / [`SequenceItem::Opaque`] rather
/// than dropped silently.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub target_namespace: String,
    pub elements: Vec<ElementDecl>,
    pub complex_types: Vec<ComplexType>,
    pub simple_types: Vec<SimpleTypeDecl>,
}

#[derive(Debug, Clone)]
pub struct ElementDecl {
    pub name: NamespacedName,
    pub ty: Option<NamespacedName>,
    pub inline: Option<ComplexType>,
    pub nillable: bool,
}

#[derive(Debug, Clone)]
pub struct ComplexType {
    pub name: Option<NamespacedName>,
    pub is_abstract: bool,
    pub attributes: Vec<AttributeDecl>,
    pub content: TypeContent,
}

#[derive(Debug, Clone)]
pub enum TypeContent {
    Empty,
    Sequence(Vec<SequenceItem>),
    Extension {
        base: NamespacedName,
        items: Vec<SequenceItem>,
    },
    Opaque,
}

#[derive(Debug, Clone)]
pub enum SequenceItem {
    Element(LocalElement),
    Ref(NamespacedName),
    Opaque,
}

#[derive(Debug, Clone)]
pub struct LocalElement {
    pub name: String,
    pub ty: Option<NamespacedName>,
    pub inline: Option<ComplexType>,
    pub nillable: bool,
}

#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub name: String,
    pub ty: Option<NamespacedName>,
}

#[derive(Debug, Clone)]
pub struct SimpleTypeDecl {
    pub name: NamespacedName,
    pub base: Option<NamespacedName>,
}

impl Default for TypeContent {
    fn default() -> Self {
        TypeContent::Empty
    }
}

impl Schema {
    pub fn new(target_namespace: String) -> Self {
        Self {
            target_namespace,
            ..Default::default()
        }
    }
}

/// Global lookup tables compiled over every schema in a definition. This is
/// the "schema extraction" result the manager caches per document.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    elements: HashMap<NamespacedName, ElementDecl>,
    complex_types: HashMap<NamespacedName, ComplexType>,
}

impl SchemaSet {
    pub fn from_definition(definition: &Definition) -> Self {
        let mut set = SchemaSet::default();

        for schema in &definition.schemas {
            for element in &schema.elements {
                set.elements.insert(element.name.clone(), element.clone());
            }

            for complex_type in &schema.complex_types {
                if let Some(name) = &complex_type.name {
                    set.complex_types.insert(name.clone(), complex_type.clone());
                }
            }
        }

        set
    }

    pub fn element(&self, name: &NamespacedName) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    pub fn complex_type(&self, name: &NamespacedName) -> Option<&ComplexType> {
        self.complex_types.get(name)
    }

    pub fn element_names(&self) -> impl Iterator<Item = &NamespacedName> {
        self.elements.keys()
    }

    /// Resolves an element declaration to its complex type, following either
    /// the inline anonymous type or the named type reference. `None` when the
    /// element is simple-typed or the named type is not a known complex type.
    pub fn element_type<'a>(&'a self, element: &'a ElementDecl) -> Option<&'a ComplexType> {
        if let Some(inline) = &element.inline {
            return Some(inline);
        }

        element.ty.as_ref().and_then(|ty| self.complex_type(ty))
    }
}
