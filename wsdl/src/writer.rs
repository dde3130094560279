use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use std::{
    collections::HashMap,
    io::{Cursor, Write},
};

use crate::{
    error::Error,
    schema::{AttributeDecl, ComplexType, ElementDecl, Schema, SequenceItem, TypeContent},
    types::{
        Binding, Document, Extension, Message, NamespacedName, Operation, PortType, Service,
        SoapVersion, SOAP11_NS, SOAP12_NS, WSDL_NS, XSD_NS,
    },
};

/// Serializes a definition back to WSDL XML. Everything the model captures
/// is reproduced; opaque schema content (choice/all/simple content) has no
/// model representation and is omitted.
pub fn write_document(document: &Document) -> Result<String, Error> {
    let mut cursor = Cursor::new(Vec::new());
    write_to(document, &mut cursor)?;
    Ok(String::from_utf8(cursor.into_inner())?)
}

pub fn write_to<W: Write>(document: &Document, target: W) -> Result<(), Error> {
    DocumentWriter::new(document, target).write()
}

fn soap_prefix(version: SoapVersion) -> &'static str {
    match version {
        SoapVersion::Soap11 => "soap",
        SoapVersion::Soap12 => "soap12",
    }
}

struct DocumentWriter<'d, W: Write> {
    document: &'d Document,
    writer: Writer<W>,
    prefixes: HashMap<String, String>,
    declarations: Vec<(String, String)>,
}

impl<'d, W: Write> DocumentWriter<'d, W> {
    fn new(document: &'d Document, target: W) -> Self {
        let mut prefixes = HashMap::new();
        let mut declarations = Vec::new();

        let mut declare = |namespace: &str, prefix: String| {
            if !namespace.is_empty() && !prefixes.contains_key(namespace) {
                prefixes.insert(namespace.to_owned(), prefix.clone());
                declarations.push((prefix, namespace.to_owned()));
            }
        };

        declare(WSDL_NS, "wsdl".to_owned());
        declare(XSD_NS, "xsd".to_owned());
        declare(SOAP11_NS, "soap".to_owned());
        declare(SOAP12_NS, "soap12".to_owned());
        declare(&document.definition.target_namespace, "tns".to_owned());

        for (index, namespace) in document.namespaces.namespaces().iter().enumerate() {
            declare(namespace, format!("ns{}", index));
        }

        Self {
            document,
            writer: Writer::new_with_indent(target, b' ', 2),
            prefixes,
            declarations,
        }
    }

    fn qname(&self, name: &NamespacedName) -> String {
        let namespace = self.document.namespaces.namespace_of(name);

        match self.prefixes.get(namespace) {
            Some(prefix) => format!("{}:{}", prefix, name.name),
            None => name.name.clone(),
        }
    }

    fn start(&mut self, element: BytesStart<'static>) -> Result<(), Error> {
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn empty(&mut self, element: BytesStart<'static>) -> Result<(), Error> {
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), Error> {
        self.writer
            .write_event(Event::End(BytesEnd::owned(name.as_bytes().to_vec())))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), Error> {
        self.writer
            .write_event(Event::Text(BytesText::from_plain_str(text)))?;
        Ok(())
    }

    fn write(&mut self) -> Result<(), Error> {
        let definition = &self.document.definition;

        let mut root = BytesStart::owned_name("wsdl:definitions");
        root.push_attribute((
            "targetNamespace",
            definition.target_namespace.as_str(),
        ));
        for (prefix, namespace) in &self.declarations {
            root.push_attribute((format!("xmlns:{}", prefix).as_str(), namespace.as_str()));
        }
        self.writer.write_event(Event::Start(root))?;

        if !definition.schemas.is_empty() {
            self.start(BytesStart::owned_name("wsdl:types"))?;
            for schema in &definition.schemas {
                self.write_schema(schema)?;
            }
            self.end("wsdl:types")?;
        }

        for message in &definition.messages {
            self.write_message(message)?;
        }

        for port_type in &definition.port_types {
            self.write_port_type(port_type)?;
        }

        for binding in &definition.bindings {
            self.write_binding(binding)?;
        }

        for service in &definition.services {
            self.write_service(service)?;
        }

        self.end("wsdl:definitions")?;
        Ok(())
    }

    fn write_schema(&mut self, schema: &Schema) -> Result<(), Error> {
        let mut element = BytesStart::owned_name("xsd:schema");
        if !schema.target_namespace.is_empty() {
            element.push_attribute(("targetNamespace", schema.target_namespace.as_str()));
        }
        self.start(element)?;

        for declaration in &schema.elements {
            self.write_element_decl(declaration)?;
        }

        for complex_type in &schema.complex_types {
            self.write_complex_type(complex_type)?;
        }

        for simple_type in &schema.simple_types {
            let mut element = BytesStart::owned_name("xsd:simpleType");
            element.push_attribute(("name", simple_type.name.name.as_str()));
            self.start(element)?;

            if let Some(base) = &simple_type.base {
                let mut restriction = BytesStart::owned_name("xsd:restriction");
                restriction.push_attribute(("base", self.qname(base).as_str()));
                self.empty(restriction)?;
            }

            self.end("xsd:simpleType")?;
        }

        self.end("xsd:schema")?;
        Ok(())
    }

    fn write_element_decl(&mut self, declaration: &ElementDecl) -> Result<(), Error> {
        let mut element = BytesStart::owned_name("xsd:element");
        element.push_attribute(("name", declaration.name.name.as_str()));
        if let Some(ty) = &declaration.ty {
            element.push_attribute(("type", self.qname(ty).as_str()));
        }
        if declaration.nillable {
            element.push_attribute(("nillable", "true"));
        }

        match &declaration.inline {
            Some(inline) => {
                self.start(element)?;
                self.write_complex_type(inline)?;
                self.end("xsd:element")?;
            }
            None => self.empty(element)?,
        }

        Ok(())
    }

    fn write_complex_type(&mut self, complex_type: &ComplexType) -> Result<(), Error> {
        let mut element = BytesStart::owned_name("xsd:complexType");
        if let Some(name) = &complex_type.name {
            element.push_attribute(("name", name.name.as_str()));
        }
        if complex_type.is_abstract {
            element.push_attribute(("abstract", "true"));
        }
        self.start(element)?;

        match &complex_type.content {
            TypeContent::Empty | TypeContent::Opaque => (),

            TypeContent::Sequence(items) => self.write_sequence(items)?,

            TypeContent::Extension { base, items } => {
                self.start(BytesStart::owned_name("xsd:complexContent"))?;

                let mut extension = BytesStart::owned_name("xsd:extension");
                extension.push_attribute(("base", self.qname(base).as_str()));
                self.start(extension)?;
                self.write_sequence(items)?;
                self.end("xsd:extension")?;

                self.end("xsd:complexContent")?;
            }
        }

        for attribute in &complex_type.attributes {
            self.write_attribute_decl(attribute)?;
        }

        self.end("xsd:complexType")?;
        Ok(())
    }

    fn write_sequence(&mut self, items: &[SequenceItem]) -> Result<(), Error> {
        self.start(BytesStart::owned_name("xsd:sequence"))?;

        for item in items {
            match item {
                SequenceItem::Element(local) => {
                    let mut element = BytesStart::owned_name("xsd:element");
                    element.push_attribute(("name", local.name.as_str()));
                    if let Some(ty) = &local.ty {
                        element.push_attribute(("type", self.qname(ty).as_str()));
                    }
                    if local.nillable {
                        element.push_attribute(("nillable", "true"));
                    }

                    match &local.inline {
                        Some(inline) => {
                            self.start(element)?;
                            self.write_complex_type(inline)?;
                            self.end("xsd:element")?;
                        }
                        None => self.empty(element)?,
                    }
                }

                SequenceItem::Ref(reference) => {
                    let mut element = BytesStart::owned_name("xsd:element");
                    element.push_attribute(("ref", self.qname(reference).as_str()));
                    self.empty(element)?;
                }

                SequenceItem::Opaque => {
                    tracing::trace!("omitting opaque sequence content");
                }
            }
        }

        self.end("xsd:sequence")?;
        Ok(())
    }

    fn write_attribute_decl(&mut self, attribute: &AttributeDecl) -> Result<(), Error> {
        if attribute.name == "*" {
            return self.empty(BytesStart::owned_name("xsd:anyAttribute"));
        }

        let mut element = BytesStart::owned_name("xsd:attribute");
        element.push_attribute(("name", attribute.name.as_str()));
        if let Some(ty) = &attribute.ty {
            element.push_attribute(("type", self.qname(ty).as_str()));
        }
        self.empty(element)
    }

    fn write_message(&mut self, message: &Message) -> Result<(), Error> {
        let mut element = BytesStart::owned_name("wsdl:message");
        element.push_attribute(("name", message.name.name.as_str()));
        self.start(element)?;

        for part in &message.parts {
            let mut element = BytesStart::owned_name("wsdl:part");
            element.push_attribute(("name", part.name.as_str()));
            if let Some(reference) = &part.element {
                element.push_attribute(("element", self.qname(reference).as_str()));
            }
            if let Some(ty) = &part.ty {
                element.push_attribute(("type", self.qname(ty).as_str()));
            }
            self.empty(element)?;
        }

        self.end("wsdl:message")?;
        Ok(())
    }

    fn write_port_type(&mut self, port_type: &PortType) -> Result<(), Error> {
        let mut element = BytesStart::owned_name("wsdl:portType");
        element.push_attribute(("name", port_type.name.name.as_str()));
        self.start(element)?;

        for operation in &port_type.operations {
            self.write_operation(operation)?;
        }

        self.end("wsdl:portType")?;
        Ok(())
    }

    fn write_operation(&mut self, operation: &Operation) -> Result<(), Error> {
        let mut element = BytesStart::owned_name("wsdl:operation");
        element.push_attribute(("name", operation.name.as_str()));
        self.start(element)?;

        if let Some(documentation) = &operation.documentation {
            self.start(BytesStart::owned_name("wsdl:documentation"))?;
            self.text(documentation)?;
            self.end("wsdl:documentation")?;
        }

        if let Some(input) = &operation.input {
            let mut element = BytesStart::owned_name("wsdl:input");
            if let Some(name) = &input.name {
                element.push_attribute(("name", name.as_str()));
            }
            if let Some(message) = &input.message {
                element.push_attribute(("message", self.qname(message).as_str()));
            }
            self.empty(element)?;
        }

        if let Some(output) = &operation.output {
            let mut element = BytesStart::owned_name("wsdl:output");
            if let Some(name) = &output.name {
                element.push_attribute(("name", name.as_str()));
            }
            if let Some(message) = &output.message {
                element.push_attribute(("message", self.qname(message).as_str()));
            }
            self.empty(element)?;
        }

        for fault in &operation.faults {
            let mut element = BytesStart::owned_name("wsdl:fault");
            element.push_attribute(("name", fault.name.as_str()));
            if let Some(message) = &fault.message {
                element.push_attribute(("message", self.qname(message).as_str()));
            }
            self.empty(element)?;
        }

        self.end("wsdl:operation")?;
        Ok(())
    }

    fn write_binding(&mut self, binding: &Binding) -> Result<(), Error> {
        let mut element = BytesStart::owned_name("wsdl:binding");
        element.push_attribute(("name", binding.name.name.as_str()));
        element.push_attribute(("type", self.qname(&binding.port_type).as_str()));
        self.start(element)?;

        self.write_extensions(&binding.extensions)?;

        for operation in &binding.operations {
            let mut element = BytesStart::owned_name("wsdl:operation");
            element.push_attribute(("name", operation.name.as_str()));
            self.start(element)?;

            self.write_extensions(&operation.extensions)?;

            if let Some(input) = &operation.input {
                self.start(BytesStart::owned_name("wsdl:input"))?;
                self.write_extensions(&input.extensions)?;
                self.end("wsdl:input")?;
            }

            if let Some(output) = &operation.output {
                self.start(BytesStart::owned_name("wsdl:output"))?;
                self.write_extensions(&output.extensions)?;
                self.end("wsdl:output")?;
            }

            for fault in &operation.faults {
                let mut element = BytesStart::owned_name("wsdl:fault");
                element.push_attribute(("name", fault.name.as_str()));
                self.start(element)?;
                self.write_extensions(&fault.extensions)?;
                self.end("wsdl:fault")?;
            }

            self.end("wsdl:operation")?;
        }

        self.end("wsdl:binding")?;
        Ok(())
    }

    fn write_service(&mut self, service: &Service) -> Result<(), Error> {
        let mut element = BytesStart::owned_name("wsdl:service");
        element.push_attribute(("name", service.name.name.as_str()));
        self.start(element)?;

        for port in &service.ports {
            let mut element = BytesStart::owned_name("wsdl:port");
            element.push_attribute(("name", port.name.as_str()));
            element.push_attribute(("binding", self.qname(&port.binding).as_str()));
            self.start(element)?;
            self.write_extensions(&port.extensions)?;
            self.end("wsdl:port")?;
        }

        self.end("wsdl:service")?;
        Ok(())
    }

    fn write_extensions(&mut self, extensions: &[Extension]) -> Result<(), Error> {
        for extension in extensions {
            match extension {
                Extension::SoapBinding(soap) => {
                    let mut element = BytesStart::owned_name(format!(
                        "{}:binding",
                        soap_prefix(soap.version)
                    ));
                    if let Some(style) = soap.style {
                        element.push_attribute(("style", style.as_str()));
                    }
                    if let Some(transport) = &soap.transport {
                        element.push_attribute(("transport", transport.as_str()));
                    }
                    self.empty(element)?;
                }

                Extension::SoapOperation(soap) => {
                    let mut element = BytesStart::owned_name(format!(
                        "{}:operation",
                        soap_prefix(soap.version)
                    ));
                    if let Some(action) = &soap.soap_action {
                        element.push_attribute(("soapAction", action.as_str()));
                    }
                    if let Some(style) = soap.style {
                        element.push_attribute(("style", style.as_str()));
                    }
                    self.empty(element)?;
                }

                Extension::SoapBody(soap) => {
                    let mut element =
                        BytesStart::owned_name(format!("{}:body", soap_prefix(soap.version)));
                    if let Some(use_) = soap.use_ {
                        element.push_attribute(("use", use_.as_str()));
                    }
                    if let Some(namespace) = &soap.namespace {
                        element.push_attribute(("namespace", namespace.as_str()));
                    }
                    if !soap.parts.is_empty() {
                        element.push_attribute(("parts", soap.parts.join(" ").as_str()));
                    }
                    self.empty(element)?;
                }

                Extension::SoapFault(soap) => {
                    let mut element =
                        BytesStart::owned_name(format!("{}:fault", soap_prefix(soap.version)));
                    if let Some(name) = &soap.name {
                        element.push_attribute(("name", name.as_str()));
                    }
                    if let Some(use_) = soap.use_ {
                        element.push_attribute(("use", use_.as_str()));
                    }
                    self.empty(element)?;
                }

                Extension::SoapHeader(soap) => {
                    let mut element =
                        BytesStart::owned_name(format!("{}:header", soap_prefix(soap.version)));
                    if let Some(message) = &soap.message {
                        element.push_attribute(("message", self.qname(message).as_str()));
                    }
                    if let Some(part) = &soap.part {
                        element.push_attribute(("part", part.as_str()));
                    }
                    if let Some(use_) = soap.use_ {
                        element.push_attribute(("use", use_.as_str()));
                    }
                    self.empty(element)?;
                }

                Extension::SoapAddress(soap) => {
                    let mut element =
                        BytesStart::owned_name(format!("{}:address", soap_prefix(soap.version)));
                    if let Some(location) = &soap.location {
                        element.push_attribute(("location", location.as_str()));
                    }
                    self.empty(element)?;
                }

                Extension::Other(other) => {
                    tracing::trace!(name = other.name.as_str(), "omitting foreign extension");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_str;
    use crate::types::{SoapStyle, SoapUse};

    const ECHO: &str = r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
        xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
        xmlns:xsd="http://www.w3.org/2001/XMLSchema"
        xmlns:tns="urn:echo" targetNamespace="urn:echo">
      <wsdl:types>
        <xsd:schema targetNamespace="urn:echo">
          <xsd:element name="Echo">
            <xsd:complexType>
              <xsd:sequence>
                <xsd:element name="text" type="xsd:string"/>
              </xsd:sequence>
            </xsd:complexType>
          </xsd:element>
        </xsd:schema>
      </wsdl:types>
      <wsdl:message name="EchoRequest">
        <wsdl:part name="parameters" element="tns:Echo"/>
      </wsdl:message>
      <wsdl:portType name="EchoPortType">
        <wsdl:operation name="Echo">
          <wsdl:input message="tns:EchoRequest"/>
        </wsdl:operation>
      </wsdl:portType>
      <wsdl:binding name="EchoSoapBinding" type="tns:EchoPortType">
        <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
        <wsdl:operation name="Echo">
          <soap:operation soapAction="" style="document"/>
          <wsdl:input><soap:body use="literal"/></wsdl:input>
        </wsdl:operation>
      </wsdl:binding>
      <wsdl:service name="EchoService">
        <wsdl:port name="EchoPort" binding="tns:EchoSoapBinding">
          <soap:address location="http://localhost/echo"/>
        </wsdl:port>
      </wsdl:service>
    </wsdl:definitions>"#;

    #[test]
    fn round_trips_through_the_parser() {
        let original = parse_str(ECHO).unwrap();
        let serialized = write_document(&original).unwrap();
        let reparsed = parse_str(&serialized).unwrap();

        let definition = &reparsed.definition;
        assert_eq!(definition.target_namespace, "urn:echo");
        assert_eq!(definition.messages.len(), 1);
        assert_eq!(definition.port_types.len(), 1);
        assert_eq!(definition.bindings.len(), 1);
        assert_eq!(definition.services.len(), 1);

        let binding = &definition.bindings[0];
        assert!(matches!(
            binding.extensions[0],
            Extension::SoapBinding(ref soap)
                if soap.style == Some(SoapStyle::Document)
                    && soap.transport.as_deref() == Some("http://schemas.xmlsoap.org/soap/http")
        ));

        let input = binding.operations[0].input.as_ref().unwrap();
        assert!(matches!(
            input.extensions[0],
            Extension::SoapBody(ref body) if body.use_ == Some(SoapUse::Literal)
        ));

        let schema = &definition.schemas[0];
        assert_eq!(schema.elements.len(), 1);
        let inline = schema.elements[0].inline.as_ref().unwrap();
        assert!(matches!(&inline.content, TypeContent::Sequence(items) if items.len() == 1));

        let port = &definition.services[0].ports[0];
        assert!(matches!(
            port.extensions[0],
            Extension::SoapAddress(ref address)
                if address.location.as_deref() == Some("http://localhost/echo")
        ));
    }

    #[test]
    fn part_message_references_survive_the_round_trip() {
        let original = parse_str(ECHO).unwrap();
        let serialized = write_document(&original).unwrap();
        let reparsed = parse_str(&serialized).unwrap();

        let message = &reparsed.definition.messages[0];
        let element = message.parts[0].element.as_ref().unwrap();
        assert_eq!(element.name, "Echo");
        assert_eq!(reparsed.namespaces.namespace_of(element), "urn:echo");

        let operation = &reparsed.definition.port_types[0].operations[0];
        let input = operation.input.as_ref().unwrap();
        assert_eq!(
            reparsed
                .namespaces
                .qualified(input.message.as_ref().unwrap()),
            "{urn:echo}EchoRequest"
        );
    }
}
