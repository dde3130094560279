use quick_xml::{
    events::{attributes::Attributes, BytesStart, BytesText, Event},
    Reader,
};
use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
};
use url::Url;

use crate::{
    error::Error,
    locator::LocatorChain,
    schema::{
        AttributeDecl, ComplexType, ElementDecl, LocalElement, Schema, SequenceItem,
        SimpleTypeDecl, TypeContent,
    },
    types::{
        Binding, BindingFault, BindingMessage, BindingOperation, Definition, Document, Extension,
        Message, NamespacedName, Namespaces, Operation, OperationFault, OperationMessage,
        OtherExtension, Part, Port, PortType, Service, SoapAddress, SoapBinding, SoapBody,
        SoapFault, SoapHeader, SoapOperation, SoapStyle, SoapUse, SoapVersion, WSDL_NS, XSD_NS,
    },
};

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    attributes: Attributes<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                result[index] = Some(reader.decode(attribute.value.as_ref())?.to_owned());
                break;
            }
        }
    }

    Ok(result)
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    let mut split = prefixed_name.split(':');
    let first = split.next().unwrap_or("");
    let second = split.next();

    if let Some(second) = second {
        (Some(first), second)
    } else {
        (None, first)
    }
}

fn require(
    value: Option<String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, Error> {
    value.ok_or(Error::MissingAttribute { element, attribute })
}

fn attr_bool(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("true") | Some("1"))
}

fn parse_style(value: Option<String>) -> Option<SoapStyle> {
    value.as_deref().and_then(SoapStyle::parse)
}

fn parse_use(value: Option<String>) -> Option<SoapUse> {
    value.as_deref().and_then(SoapUse::parse)
}

fn is_foreign(namespace: Option<&str>) -> bool {
    match namespace {
        None => false,
        Some(ns) => ns != WSDL_NS && ns != XSD_NS,
    }
}

#[derive(Clone, Default)]
struct CurrentNamespaces {
    target: Vec<String>,
    namespaces: HashMap<Option<String>, String>,
}

pub(crate) struct Parser<'l> {
    root: Option<Url>,
    locator: &'l LocatorChain,

    definition: Definition,
    namespaces: Namespaces,
    current_namespaces: CurrentNamespaces,
}

#[derive(Debug)]
enum ParseState {
    Definitions,

    Types,
    Schema(Schema),
    Element(ElementDecl),
    ComplexType(ComplexType),
    ComplexContent {
        content: Option<TypeContent>,
        attributes: Vec<AttributeDecl>,
    },
    ComplexExtension {
        base: NamespacedName,
        items: Vec<SequenceItem>,
        attributes: Vec<AttributeDecl>,
    },
    Sequence(Vec<SequenceItem>),
    SequenceChild(SequenceItem),
    Attribute(AttributeDecl),
    SimpleType {
        name: Option<NamespacedName>,
        base: Option<NamespacedName>,
    },
    Restriction {
        base: NamespacedName,
    },

    Message(Message),
    Part(Part),

    PortType(PortType),
    Operation(Operation),
    Documentation(Option<String>),
    OperationMessage {
        output: bool,
        message: OperationMessage,
    },
    OperationFault(OperationFault),

    Binding(Binding),
    BindingOperation(BindingOperation),
    BindingInput(BindingMessage),
    BindingOutput(BindingMessage),
    BindingFault(BindingFault),

    Service(Service),
    Port(Port),

    Extension(Extension),

    Import {
        namespace: Option<String>,
    },

    Other(String),
}

impl CurrentNamespaces {
    fn push_target_namespace(&mut self, namespace: String) {
        self.target.push(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.target.pop();
    }

    fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        self.namespaces.insert(prefix, namespace.to_owned());
    }

    fn target(&self) -> Option<&str> {
        self.target.last().map(String::as_str)
    }

    fn lookup(&self, prefix: &Option<String>) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }
}

impl<'l> Parser<'l> {
    fn new(locator: &'l LocatorChain) -> Self {
        Self {
            root: None,
            locator,

            definition: Default::default(),
            namespaces: Default::default(),
            current_namespaces: Default::default(),
        }
    }

    fn into_document(self) -> Document {
        Document {
            definition: self.definition,
            namespaces: self.namespaces,
        }
    }

    fn push_target_namespace(&mut self, namespace: String) {
        self.current_namespaces.push_target_namespace(namespace);
    }

    fn pop_target_namespace(&mut self) {
        self.current_namespaces.pop_target_namespace();
    }

    fn add_namespace_prefix(&mut self, prefix: Option<String>, namespace: &str) {
        self.current_namespaces
            .add_namespace_prefix(prefix, namespace);
    }

    fn target_namespaced(&mut self, name: String) -> Result<NamespacedName, Error> {
        match self.current_namespaces.target() {
            Some(target) => {
                let target = target.to_owned();
                Ok(NamespacedName::new(&mut self.namespaces, &target, name))
            }
            None => Err(Error::MissingTargetNamespace),
        }
    }

    fn resolved_prefix(
        &mut self,
        prefix: Option<String>,
        name: String,
    ) -> Result<NamespacedName, Error> {
        match self.current_namespaces.lookup(&prefix) {
            Some(value) => {
                let value = value.to_owned();
                Ok(NamespacedName::new(&mut self.namespaces, &value, name))
            }
            None => Err(Error::UndeclaredPrefix(prefix.unwrap_or_default())),
        }
    }

    fn resolve_namespace(&mut self, prefixed_name: &str) -> Result<NamespacedName, Error> {
        let (prefix, local_name) = split_namespaced_name(prefixed_name);

        match prefix {
            Some("tns") => self.target_namespaced(local_name.to_owned()),

            Some(prefix) => self.resolved_prefix(Some(prefix.to_owned()), local_name.to_owned()),

            // An unprefixed QName resolves against the default namespace when
            // one is declared, otherwise against the target namespace.
            None => {
                if self.current_namespaces.lookup(&None).is_some() {
                    self.resolved_prefix(None, local_name.to_owned())
                } else {
                    self.target_namespaced(local_name.to_owned())
                }
            }
        }
    }

    fn import_location(&self, location: &str) -> Result<String, Error> {
        if let Ok(absolute) = Url::parse(location) {
            return Ok(absolute.to_string());
        }

        match &self.root {
            Some(root) => Ok(root.join(location)?.to_string()),
            None => Err(Error::ImportWithoutBase(location.to_owned())),
        }
    }

    fn parse_location(&mut self, location: &str) -> Result<(), Error> {
        tracing::debug!(%location, "parsing wsdl document");

        let (base, source) = self.locator.open(location)?;
        let saved = std::mem::replace(&mut self.root, base);
        let result = self.parse_reader(Reader::from_reader(BufReader::new(source)));
        self.root = saved;
        result
    }

    fn parse_reader<B: BufRead>(&mut self, mut reader: Reader<B>) -> Result<(), Error> {
        let mut stack = Vec::new();
        let mut buffer = Vec::new();
        let mut namespace_buffer = Vec::new();

        loop {
            let (namespace, event) =
                reader.read_namespaced_event(&mut buffer, &mut namespace_buffer)?;

            match event {
                Event::Decl(..) | Event::Comment(..) | Event::CData(..) | Event::PI(..)
                | Event::DocType(..) => (),

                Event::Start(start) => {
                    let namespace = namespace
                        .map(|bytes| reader.decode(bytes).map(ToOwned::to_owned))
                        .transpose()?;
                    self.handle_start(&mut stack, &reader, start, namespace.as_deref())?
                }
                Event::End(..) => self.handle_end(&mut stack)?,

                Event::Empty(start) => {
                    let namespace = namespace
                        .map(|bytes| reader.decode(bytes).map(ToOwned::to_owned))
                        .transpose()?;
                    self.handle_start(&mut stack, &reader, start, namespace.as_deref())?;
                    self.handle_end(&mut stack)?;
                }

                Event::Text(text) => self.handle_text(&mut stack, &reader, text)?,

                Event::Eof => break,
            }
        }

        Ok(())
    }

    fn parse_soap_extension<B: BufRead>(
        &mut self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
        version: SoapVersion,
        local_name: &str,
    ) -> Result<Extension, Error> {
        Ok(match local_name {
            "binding" => {
                let [transport, style] =
                    get_attributes(reader, start.attributes(), ["transport", "style"])?;

                Extension::SoapBinding(SoapBinding {
                    version,
                    transport,
                    style: parse_style(style),
                })
            }

            "operation" => {
                let [soap_action, style] =
                    get_attributes(reader, start.attributes(), ["soapAction", "style"])?;

                Extension::SoapOperation(SoapOperation {
                    version,
                    soap_action,
                    style: parse_style(style),
                })
            }

            "body" => {
                let [use_, namespace, parts] =
                    get_attributes(reader, start.attributes(), ["use", "namespace", "parts"])?;

                Extension::SoapBody(SoapBody {
                    version,
                    use_: parse_use(use_),
                    namespace,
                    parts: parts
                        .map(|parts| parts.split_whitespace().map(ToOwned::to_owned).collect())
                        .unwrap_or_default(),
                })
            }

            "fault" => {
                let [name, use_] = get_attributes(reader, start.attributes(), ["name", "use"])?;

                Extension::SoapFault(SoapFault {
                    version,
                    name,
                    use_: parse_use(use_),
                })
            }

            "header" => {
                let [message, part, use_] =
                    get_attributes(reader, start.attributes(), ["message", "part", "use"])?;

                let message = message
                    .map(|message| self.resolve_namespace(&message))
                    .transpose()?;

                Extension::SoapHeader(SoapHeader {
                    version,
                    message,
                    part,
                    use_: parse_use(use_),
                })
            }

            "address" => {
                let [location] = get_attributes(reader, start.attributes(), ["location"])?;

                Extension::SoapAddress(SoapAddress { version, location })
            }

            other => Extension::Other(OtherExtension {
                namespace: Some(version.namespace().to_owned()),
                name: other.to_owned(),
            }),
        })
    }

    fn handle_start<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        start: BytesStart<'_>,
        namespace: Option<&str>,
    ) -> Result<(), Error> {
        let name = reader.decode(start.name())?.to_owned();
        let (_, local_name) = split_namespaced_name(&name);

        let mut state = stack.pop();
        let mut new_state = Some(ParseState::Other(local_name.to_owned()));

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            let (prefix, value) = split_namespaced_name(key);

            if prefix == Some("xmlns") {
                self.add_namespace_prefix(
                    Some(value.to_owned()),
                    reader.decode(attribute.value.as_ref())?,
                );
            } else if prefix.is_none() && value == "xmlns" {
                self.add_namespace_prefix(None, reader.decode(attribute.value.as_ref())?);
            }
        }

        let soap_version = namespace.and_then(SoapVersion::from_namespace);

        match state {
            None => match local_name {
                "definitions" => {
                    let [target_namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;

                    let target_namespace =
                        require(target_namespace, "definitions", "targetNamespace")?;

                    if self.definition.target_namespace.is_empty() {
                        self.definition.target_namespace = target_namespace.clone();
                    }

                    self.push_target_namespace(target_namespace);
                    new_state = Some(ParseState::Definitions)
                }

                // A standalone schema document, reached through an import.
                "schema" => {
                    let [target_namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;

                    let target_namespace = target_namespace
                        .or_else(|| self.current_namespaces.target().map(ToOwned::to_owned))
                        .unwrap_or_default();

                    self.push_target_namespace(target_namespace.clone());
                    new_state = Some(ParseState::Schema(Schema::new(target_namespace)))
                }

                other => {
                    tracing::trace!(element = other, "skipping unknown document root");
                }
            },

            Some(ParseState::Definitions) => match local_name {
                "import" => {
                    let [location, namespace] =
                        get_attributes(reader, start.attributes(), ["location", "namespace"])?;

                    if let Some(location) = location {
                        let location = self.import_location(&location)?;
                        self.parse_location(&location)?;
                    }

                    new_state = Some(ParseState::Import { namespace });
                }

                "types" => new_state = Some(ParseState::Types),

                "documentation" => new_state = Some(ParseState::Documentation(None)),

                "message" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "message", "name")?;
                    let name = self.target_namespaced(name)?;

                    new_state = Some(ParseState::Message(Message {
                        name,
                        parts: Vec::new(),
                    }));
                }

                "portType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "portType", "name")?;
                    let name = self.target_namespaced(name)?;

                    new_state = Some(ParseState::PortType(PortType {
                        name,
                        operations: Vec::new(),
                    }));
                }

                "binding" => {
                    let [name, ty] = get_attributes(reader, start.attributes(), ["name", "type"])?;
                    let name = require(name, "binding", "name")?;
                    let ty = require(ty, "binding", "type")?;

                    let name = self.target_namespaced(name)?;
                    let port_type = self.resolve_namespace(&ty)?;

                    new_state = Some(ParseState::Binding(Binding {
                        name,
                        port_type,
                        extensions: Vec::new(),
                        operations: Vec::new(),
                    }));
                }

                "service" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "service", "name")?;
                    let name = self.target_namespaced(name)?;

                    new_state = Some(ParseState::Service(Service {
                        name,
                        ports: Vec::new(),
                    }));
                }

                other => tracing::trace!(element = other, "skipping inside definitions"),
            },

            Some(ParseState::Types) => match local_name {
                "schema" => {
                    let [target_namespace] =
                        get_attributes(reader, start.attributes(), ["targetNamespace"])?;

                    let target_namespace = target_namespace
                        .or_else(|| self.current_namespaces.target().map(ToOwned::to_owned))
                        .unwrap_or_default();

                    self.push_target_namespace(target_namespace.clone());
                    new_state = Some(ParseState::Schema(Schema::new(target_namespace)))
                }

                "documentation" => new_state = Some(ParseState::Documentation(None)),

                other => tracing::trace!(element = other, "skipping inside types"),
            },

            Some(ParseState::Schema(..)) => match local_name {
                "element" => {
                    let [name, ty, nillable] =
                        get_attributes(reader, start.attributes(), ["name", "type", "nillable"])?;
                    let name = require(name, "element", "name")?;

                    let name = self.target_namespaced(name)?;
                    let ty = ty.map(|ty| self.resolve_namespace(&ty)).transpose()?;

                    new_state = Some(ParseState::Element(ElementDecl {
                        name,
                        ty,
                        inline: None,
                        nillable: attr_bool(&nillable),
                    }));
                }

                "complexType" => {
                    let [name, is_abstract] =
                        get_attributes(reader, start.attributes(), ["name", "abstract"])?;
                    let name = require(name, "complexType", "name")?;
                    let name = self.target_namespaced(name)?;

                    new_state = Some(ParseState::ComplexType(ComplexType {
                        name: Some(name),
                        is_abstract: attr_bool(&is_abstract),
                        attributes: Vec::new(),
                        content: TypeContent::Empty,
                    }));
                }

                "simpleType" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = name.map(|name| self.target_namespaced(name)).transpose()?;

                    new_state = Some(ParseState::SimpleType { name, base: None });
                }

                "include" | "import" => {
                    let [location, namespace] = get_attributes(
                        reader,
                        start.attributes(),
                        ["schemaLocation", "namespace"],
                    )?;

                    if let Some(location) = location {
                        let location = self.import_location(&location)?;
                        self.parse_location(&location)?;
                    }

                    new_state = Some(ParseState::Import { namespace });
                }

                other => tracing::trace!(element = other, "skipping inside schema"),
            },

            Some(ParseState::Element(..)) => match local_name {
                "complexType" => {
                    let [is_abstract] = get_attributes(reader, start.attributes(), ["abstract"])?;

                    new_state = Some(ParseState::ComplexType(ComplexType {
                        name: None,
                        is_abstract: attr_bool(&is_abstract),
                        attributes: Vec::new(),
                        content: TypeContent::Empty,
                    }));
                }

                "simpleType" => new_state = Some(ParseState::SimpleType {
                    name: None,
                    base: None,
                }),

                other => tracing::trace!(element = other, "skipping inside element"),
            },

            Some(ParseState::ComplexType(ref mut complex_type)) => match local_name {
                "sequence" => new_state = Some(ParseState::Sequence(Vec::new())),

                "attribute" => {
                    let [name, reference, ty] =
                        get_attributes(reader, start.attributes(), ["name", "ref", "type"])?;

                    let name = name.or(reference).unwrap_or_else(|| "*".to_owned());
                    let ty = ty.map(|ty| self.resolve_namespace(&ty)).transpose()?;

                    new_state = Some(ParseState::Attribute(AttributeDecl { name, ty }));
                }

                "anyAttribute" => {
                    complex_type.attributes.push(AttributeDecl {
                        name: "*".to_owned(),
                        ty: None,
                    });
                }

                "complexContent" => new_state = Some(ParseState::ComplexContent {
                    content: None,
                    attributes: Vec::new(),
                }),

                // anything but a plain sequence disqualifies the type as a
                // wrapper, which is all this model needs to remember
                "simpleContent" | "choice" | "all" | "group" => {
                    complex_type.content = TypeContent::Opaque;
                }

                other => tracing::trace!(element = other, "skipping inside complexType"),
            },

            Some(ParseState::ComplexContent {
                ref mut content, ..
            }) => match local_name {
                "extension" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let base = require(base, "extension", "base")?;
                    let base = self.resolve_namespace(&base)?;

                    new_state = Some(ParseState::ComplexExtension {
                        base,
                        items: Vec::new(),
                        attributes: Vec::new(),
                    });
                }

                "restriction" => *content = Some(TypeContent::Opaque),

                other => tracing::trace!(element = other, "skipping inside complexContent"),
            },

            Some(ParseState::ComplexExtension {
                ref mut items, ..
            }) => match local_name {
                "sequence" => new_state = Some(ParseState::Sequence(Vec::new())),

                "attribute" => {
                    let [name, reference, ty] =
                        get_attributes(reader, start.attributes(), ["name", "ref", "type"])?;

                    let name = name.or(reference).unwrap_or_else(|| "*".to_owned());
                    let ty = ty.map(|ty| self.resolve_namespace(&ty)).transpose()?;

                    new_state = Some(ParseState::Attribute(AttributeDecl { name, ty }));
                }

                "choice" | "all" | "group" => items.push(SequenceItem::Opaque),

                other => tracing::trace!(element = other, "skipping inside extension"),
            },

            Some(ParseState::Sequence(ref mut items)) => match local_name {
                "element" => {
                    let [name, ty, reference, nillable] = get_attributes(
                        reader,
                        start.attributes(),
                        ["name", "type", "ref", "nillable"],
                    )?;

                    let item = if let Some(reference) = reference {
                        SequenceItem::Ref(self.resolve_namespace(&reference)?)
                    } else {
                        let name = require(name, "element", "name")?;
                        let ty = ty.map(|ty| self.resolve_namespace(&ty)).transpose()?;

                        SequenceItem::Element(LocalElement {
                            name,
                            ty,
                            inline: None,
                            nillable: attr_bool(&nillable),
                        })
                    };

                    new_state = Some(ParseState::SequenceChild(item));
                }

                "any" | "choice" | "sequence" | "group" => {
                    items.push(SequenceItem::Opaque);
                }

                other => tracing::trace!(element = other, "skipping inside sequence"),
            },

            Some(ParseState::SequenceChild(..)) => match local_name {
                "complexType" => {
                    let [is_abstract] = get_attributes(reader, start.attributes(), ["abstract"])?;

                    new_state = Some(ParseState::ComplexType(ComplexType {
                        name: None,
                        is_abstract: attr_bool(&is_abstract),
                        attributes: Vec::new(),
                        content: TypeContent::Empty,
                    }));
                }

                other => tracing::trace!(element = other, "skipping inside local element"),
            },

            Some(ParseState::Attribute(..)) => {
                tracing::trace!(element = local_name, "skipping inside attribute")
            }

            Some(ParseState::SimpleType { .. }) => match local_name {
                "restriction" => {
                    let [base] = get_attributes(reader, start.attributes(), ["base"])?;
                    let base = require(base, "restriction", "base")?;
                    let base = self.resolve_namespace(&base)?;

                    new_state = Some(ParseState::Restriction { base });
                }

                other => tracing::trace!(element = other, "skipping inside simpleType"),
            },

            Some(ParseState::Restriction { .. }) => {
                tracing::trace!(element = local_name, "skipping inside restriction")
            }

            Some(ParseState::Message(..)) => match local_name {
                "part" => {
                    let [name, element, ty] =
                        get_attributes(reader, start.attributes(), ["name", "element", "type"])?;
                    let name = require(name, "part", "name")?;

                    let element = element
                        .map(|element| self.resolve_namespace(&element))
                        .transpose()?;
                    let ty = ty.map(|ty| self.resolve_namespace(&ty)).transpose()?;

                    new_state = Some(ParseState::Part(Part { name, element, ty }));
                }

                "documentation" => new_state = Some(ParseState::Documentation(None)),

                other => tracing::trace!(element = other, "skipping inside message"),
            },

            Some(ParseState::Part(..)) => {
                tracing::trace!(element = local_name, "skipping inside part")
            }

            Some(ParseState::PortType(..)) => match local_name {
                "operation" => {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = require(name, "operation", "name")?;

                    new_state = Some(ParseState::Operation(Operation {
                        name,
                        documentation: None,
                        input: None,
                        output: None,
                        faults: Vec::new(),
                    }));
                }

                "documentation" => new_state = Some(ParseState::Documentation(None)),

                other => tracing::trace!(element = other, "skipping inside portType"),
            },

            Some(ParseState::Operation(..)) => match local_name {
                "documentation" => new_state = Some(ParseState::Documentation(None)),

                "input" | "output" => {
                    let [name, message] =
                        get_attributes(reader, start.attributes(), ["name", "message"])?;

                    let message = message
                        .map(|message| self.resolve_namespace(&message))
                        .transpose()?;

                    new_state = Some(ParseState::OperationMessage {
                        output: local_name == "output",
                        message: OperationMessage { name, message },
                    });
                }

                "fault" => {
                    let [name, message] =
                        get_attributes(reader, start.attributes(), ["name", "message"])?;
                    let name = require(name, "fault", "name")?;

                    let message = message
                        .map(|message| self.resolve_namespace(&message))
                        .transpose()?;

                    new_state = Some(ParseState::OperationFault(OperationFault { name, message }));
                }

                other => tracing::trace!(element = other, "skipping inside operation"),
            },

            Some(ParseState::Documentation(..)) => {
                tracing::trace!(element = local_name, "skipping inside documentation")
            }

            Some(ParseState::OperationMessage { .. }) | Some(ParseState::OperationFault(..)) => {
                tracing::trace!(element = local_name, "skipping inside operation message")
            }

            Some(ParseState::Binding(..)) => {
                if let Some(version) = soap_version {
                    let extension =
                        self.parse_soap_extension(reader, &start, version, local_name)?;
                    new_state = Some(ParseState::Extension(extension));
                } else if is_foreign(namespace) {
                    new_state = Some(ParseState::Extension(Extension::Other(OtherExtension {
                        namespace: namespace.map(ToOwned::to_owned),
                        name: local_name.to_owned(),
                    })));
                } else {
                    match local_name {
                        "operation" => {
                            let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                            let name = require(name, "operation", "name")?;

                            new_state = Some(ParseState::BindingOperation(BindingOperation {
                                name,
                                extensions: Vec::new(),
                                input: None,
                                output: None,
                                faults: Vec::new(),
                            }));
                        }

                        "documentation" => new_state = Some(ParseState::Documentation(None)),

                        other => tracing::trace!(element = other, "skipping inside binding"),
                    }
                }
            }

            Some(ParseState::BindingOperation(..)) => {
                if let Some(version) = soap_version {
                    let extension =
                        self.parse_soap_extension(reader, &start, version, local_name)?;
                    new_state = Some(ParseState::Extension(extension));
                } else if is_foreign(namespace) {
                    new_state = Some(ParseState::Extension(Extension::Other(OtherExtension {
                        namespace: namespace.map(ToOwned::to_owned),
                        name: local_name.to_owned(),
                    })));
                } else {
                    match local_name {
                        "input" => {
                            new_state = Some(ParseState::BindingInput(BindingMessage::default()))
                        }
                        "output" => {
                            new_state = Some(ParseState::BindingOutput(BindingMessage::default()))
                        }

                        "fault" => {
                            let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                            let name = require(name, "fault", "name")?;

                            new_state = Some(ParseState::BindingFault(BindingFault {
                                name,
                                extensions: Vec::new(),
                            }));
                        }

                        "documentation" => new_state = Some(ParseState::Documentation(None)),

                        other => {
                            tracing::trace!(element = other, "skipping inside binding operation")
                        }
                    }
                }
            }

            Some(
                ParseState::BindingInput(..)
                | ParseState::BindingOutput(..)
                | ParseState::BindingFault(..),
            ) => {
                if let Some(version) = soap_version {
                    let extension =
                        self.parse_soap_extension(reader, &start, version, local_name)?;
                    new_state = Some(ParseState::Extension(extension));
                } else if is_foreign(namespace) {
                    new_state = Some(ParseState::Extension(Extension::Other(OtherExtension {
                        namespace: namespace.map(ToOwned::to_owned),
                        name: local_name.to_owned(),
                    })));
                } else {
                    tracing::trace!(element = local_name, "skipping inside binding message");
                }
            }

            Some(ParseState::Service(..)) => match local_name {
                "port" => {
                    let [name, binding] =
                        get_attributes(reader, start.attributes(), ["name", "binding"])?;
                    let name = require(name, "port", "name")?;
                    let binding = require(binding, "port", "binding")?;
                    let binding = self.resolve_namespace(&binding)?;

                    new_state = Some(ParseState::Port(Port {
                        name,
                        binding,
                        extensions: Vec::new(),
                    }));
                }

                "documentation" => new_state = Some(ParseState::Documentation(None)),

                other => tracing::trace!(element = other, "skipping inside service"),
            },

            Some(ParseState::Port(..)) => {
                if let Some(version) = soap_version {
                    let extension =
                        self.parse_soap_extension(reader, &start, version, local_name)?;
                    new_state = Some(ParseState::Extension(extension));
                } else if is_foreign(namespace) {
                    new_state = Some(ParseState::Extension(Extension::Other(OtherExtension {
                        namespace: namespace.map(ToOwned::to_owned),
                        name: local_name.to_owned(),
                    })));
                } else {
                    tracing::trace!(element = local_name, "skipping inside port");
                }
            }

            Some(ParseState::Extension(..)) => {
                tracing::trace!(element = local_name, "skipping inside extension element")
            }

            Some(ParseState::Import { .. }) => {
                tracing::trace!(element = local_name, "skipping inside import")
            }

            Some(ParseState::Other(ref parent)) => {
                tracing::trace!(element = local_name, parent = parent.as_str(), "skipping");
            }
        }

        stack.extend(state);
        stack.extend(new_state);

        Ok(())
    }

    fn handle_end(&mut self, stack: &mut Vec<ParseState>) -> Result<(), Error> {
        let finished_state = stack.pop();
        let mut next_state = stack.pop();

        match finished_state {
            Some(ParseState::Definitions) => self.pop_target_namespace(),

            Some(ParseState::Schema(schema)) => {
                self.pop_target_namespace();
                self.definition.schemas.push(schema);
            }

            Some(ParseState::Element(element)) => match next_state {
                Some(ParseState::Schema(ref mut schema)) => schema.elements.push(element),
                _ => return Err(Error::UnexpectedStructure("element".into())),
            },

            Some(ParseState::ComplexType(complex_type)) => match next_state {
                Some(ParseState::Schema(ref mut schema)) => {
                    schema.complex_types.push(complex_type)
                }

                Some(ParseState::Element(ref mut element)) => {
                    element.inline = Some(complex_type);
                }

                Some(ParseState::SequenceChild(SequenceItem::Element(ref mut local))) => {
                    local.inline = Some(complex_type);
                }

                _ => return Err(Error::UnexpectedStructure("complexType".into())),
            },

            Some(ParseState::ComplexContent {
                content,
                attributes,
            }) => match next_state {
                Some(ParseState::ComplexType(ref mut complex_type)) => {
                    complex_type.content = content.unwrap_or(TypeContent::Opaque);
                    complex_type.attributes.extend(attributes);
                }
                _ => return Err(Error::UnexpectedStructure("complexContent".into())),
            },

            Some(ParseState::ComplexExtension {
                base,
                items,
                attributes,
            }) => match next_state {
                Some(ParseState::ComplexContent {
                    content: ref mut parent_content,
                    attributes: ref mut parent_attributes,
                }) => {
                    *parent_content = Some(TypeContent::Extension { base, items });
                    parent_attributes.extend(attributes);
                }
                _ => return Err(Error::UnexpectedStructure("extension".into())),
            },

            Some(ParseState::Sequence(items)) => match next_state {
                Some(ParseState::ComplexType(ref mut complex_type)) => {
                    complex_type.content = match complex_type.content {
                        TypeContent::Empty => TypeContent::Sequence(items),
                        // a second content model makes the type opaque
                        _ => TypeContent::Opaque,
                    };
                }

                Some(ParseState::ComplexExtension {
                    items: ref mut extension_items,
                    ..
                }) => extension_items.extend(items),

                _ => return Err(Error::UnexpectedStructure("sequence".into())),
            },

            Some(ParseState::SequenceChild(item)) => match next_state {
                Some(ParseState::Sequence(ref mut items)) => items.push(item),
                _ => return Err(Error::UnexpectedStructure("element".into())),
            },

            Some(ParseState::Attribute(attribute)) => match next_state {
                Some(ParseState::ComplexType(ref mut complex_type)) => {
                    complex_type.attributes.push(attribute)
                }

                Some(ParseState::ComplexExtension {
                    ref mut attributes, ..
                }) => attributes.push(attribute),

                _ => return Err(Error::UnexpectedStructure("attribute".into())),
            },

            Some(ParseState::SimpleType { name, base }) => {
                if let (Some(name), Some(ParseState::Schema(schema))) = (name, next_state.as_mut())
                {
                    schema.simple_types.push(SimpleTypeDecl { name, base });
                }
                // anonymous simple types leave their parent untyped, which is
                // what the service builder expects of a non-complex wrapper
            }

            Some(ParseState::Restriction { base }) => {
                if let Some(ParseState::SimpleType {
                    base: ref mut simple_base,
                    ..
                }) = next_state
                {
                    *simple_base = Some(base);
                }
            }

            Some(ParseState::Message(message)) => self.definition.messages.push(message),

            Some(ParseState::Part(part)) => match next_state {
                Some(ParseState::Message(ref mut message)) => message.parts.push(part),
                _ => return Err(Error::UnexpectedStructure("part".into())),
            },

            Some(ParseState::PortType(port_type)) => {
                self.definition.port_types.push(port_type)
            }

            Some(ParseState::Operation(operation)) => match next_state {
                Some(ParseState::PortType(ref mut port_type)) => {
                    port_type.operations.push(operation)
                }
                _ => return Err(Error::UnexpectedStructure("operation".into())),
            },

            Some(ParseState::Documentation(text)) => {
                if let Some(ParseState::Operation(ref mut operation)) = next_state {
                    operation.documentation = text;
                }
            }

            Some(ParseState::OperationMessage { output, message }) => match next_state {
                Some(ParseState::Operation(ref mut operation)) => {
                    let slot = if output {
                        &mut operation.output
                    } else {
                        &mut operation.input
                    };

                    if slot.is_some() {
                        return Err(Error::UnexpectedStructure(
                            if output { "output" } else { "input" }.into(),
                        ));
                    }

                    *slot = Some(message);
                }
                _ => return Err(Error::UnexpectedStructure("input".into())),
            },

            Some(ParseState::OperationFault(fault)) => match next_state {
                Some(ParseState::Operation(ref mut operation)) => operation.faults.push(fault),
                _ => return Err(Error::UnexpectedStructure("fault".into())),
            },

            Some(ParseState::Binding(binding)) => self.definition.bindings.push(binding),

            Some(ParseState::BindingOperation(operation)) => match next_state {
                Some(ParseState::Binding(ref mut binding)) => binding.operations.push(operation),
                _ => return Err(Error::UnexpectedStructure("operation".into())),
            },

            Some(ParseState::BindingInput(message)) => match next_state {
                Some(ParseState::BindingOperation(ref mut operation)) => {
                    operation.input = Some(message)
                }
                _ => return Err(Error::UnexpectedStructure("input".into())),
            },

            Some(ParseState::BindingOutput(message)) => match next_state {
                Some(ParseState::BindingOperation(ref mut operation)) => {
                    operation.output = Some(message)
                }
                _ => return Err(Error::UnexpectedStructure("output".into())),
            },

            Some(ParseState::BindingFault(fault)) => match next_state {
                Some(ParseState::BindingOperation(ref mut operation)) => {
                    operation.faults.push(fault)
                }
                _ => return Err(Error::UnexpectedStructure("fault".into())),
            },

            Some(ParseState::Service(service)) => self.definition.services.push(service),

            Some(ParseState::Port(port)) => match next_state {
                Some(ParseState::Service(ref mut service)) => service.ports.push(port),
                _ => return Err(Error::UnexpectedStructure("port".into())),
            },

            Some(ParseState::Extension(extension)) => match next_state {
                Some(ParseState::Binding(ref mut binding)) => {
                    binding.extensions.push(extension)
                }
                Some(ParseState::BindingOperation(ref mut operation)) => {
                    operation.extensions.push(extension)
                }
                Some(ParseState::BindingInput(ref mut message))
                | Some(ParseState::BindingOutput(ref mut message)) => {
                    message.extensions.push(extension)
                }
                Some(ParseState::BindingFault(ref mut fault)) => {
                    fault.extensions.push(extension)
                }
                Some(ParseState::Port(ref mut port)) => port.extensions.push(extension),

                _ => tracing::trace!(
                    kind = extension.kind_name(),
                    "dropping extension element in unexpected position"
                ),
            },

            _ => (),
        }

        stack.extend(next_state);
        Ok(())
    }

    fn handle_text<B: BufRead>(
        &mut self,
        stack: &mut Vec<ParseState>,
        reader: &Reader<B>,
        text: BytesText<'_>,
    ) -> Result<(), Error> {
        let unescaped = text.unescaped()?;
        let text = reader.decode(unescaped.as_ref())?;
        let mut state = stack.pop();

        if let Some(ParseState::Documentation(ref mut documentation)) = state {
            *documentation = Some(text.trim().to_owned());
        }

        stack.extend(state);
        Ok(())
    }
}

pub(crate) fn parse(location: &str, locator: &LocatorChain) -> Result<Document, Error> {
    let mut parser = Parser::new(locator);
    parser.parse_location(location)?;
    Ok(parser.into_document())
}

pub(crate) fn parse_str(xml: &str, locator: &LocatorChain) -> Result<Document, Error> {
    let mut parser = Parser::new(locator);
    parser.parse_reader(Reader::from_str(xml))?;
    Ok(parser.into_document())
}
