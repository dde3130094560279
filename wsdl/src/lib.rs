pub mod error;
pub mod locator;
pub mod manager;
pub mod registry;
pub mod schema;
pub mod types;
pub mod writer;

mod parser;

use locator::LocatorChain;

pub fn parse<S: AsRef<str>>(location: S) -> Result<types::Document, error::Error> {
    parser::parse(location.as_ref(), &LocatorChain::default())
}

pub fn parse_with<S: AsRef<str>>(
    location: S,
    locator: &LocatorChain,
) -> Result<types::Document, error::Error> {
    parser::parse(location.as_ref(), locator)
}

pub fn parse_str(xml: &str) -> Result<types::Document, error::Error> {
    parser::parse_str(xml, &LocatorChain::default())
}

pub fn parse_str_with(xml: &str, locator: &LocatorChain) -> Result<types::Document, error::Error> {
    parser::parse_str(xml, locator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schema::{SequenceItem, TypeContent};
    use crate::types::{Extension, SoapStyle, SoapUse, SoapVersion};

    const CALCULATOR: &str = r#"<?xml version="1.0"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:tns="urn:calc" targetNamespace="urn:calc">
  <wsdl:types>
    <xsd:schema targetNamespace="urn:calc">
      <xsd:element name="Add">
        <xsd:complexType>
          <xsd:sequence>
            <xsd:element name="a" type="xsd:int"/>
            <xsd:element name="b" type="xsd:int"/>
          </xsd:sequence>
        </xsd:complexType>
      </xsd:element>
      <xsd:element name="AddResponse">
        <xsd:complexType>
          <xsd:sequence>
            <xsd:element name="result" type="xsd:int"/>
          </xsd:sequence>
        </xsd:complexType>
      </xsd:element>
      <xsd:element name="overflow" type="xsd:string"/>
    </xsd:schema>
  </wsdl:types>
  <wsdl:message name="AddRequest">
    <wsdl:part name="parameters" element="tns:Add"/>
  </wsdl:message>
  <wsdl:message name="AddResponse">
    <wsdl:part name="parameters" element="tns:AddResponse"/>
  </wsdl:message>
  <wsdl:message name="AddFault">
    <wsdl:part name="fault" element="tns:overflow"/>
  </wsdl:message>
  <wsdl:portType name="CalculatorPortType">
    <wsdl:operation name="Add">
      <wsdl:documentation>Adds two numbers</wsdl:documentation>
      <wsdl:input message="tns:AddRequest"/>
      <wsdl:output message="tns:AddResponse"/>
      <wsdl:fault name="overflow" message="tns:AddFault"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="CalculatorSoapBinding" type="tns:CalculatorPortType">
    <soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="Add">
      <soap:operation soapAction="" style="document"/>
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
      <wsdl:fault name="overflow"><soap:fault name="overflow" use="literal"/></wsdl:fault>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="CalculatorService">
    <wsdl:port name="CalculatorPort" binding="tns:CalculatorSoapBinding">
      <soap:address location="http://localhost:8080/calc"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    #[test]
    fn parses_the_full_document_shape() {
        let document = parse_str(CALCULATOR).unwrap();
        let definition = &document.definition;

        assert_eq!(definition.target_namespace, "urn:calc");
        assert_eq!(definition.messages.len(), 3);
        assert_eq!(definition.port_types.len(), 1);
        assert_eq!(definition.bindings.len(), 1);
        assert_eq!(definition.services.len(), 1);

        let port_type = &definition.port_types[0];
        assert_eq!(port_type.name.name, "CalculatorPortType");
        let operation = &port_type.operations[0];
        assert_eq!(operation.name, "Add");
        assert_eq!(operation.documentation.as_deref(), Some("Adds two numbers"));
        assert_eq!(operation.faults.len(), 1);
        assert_eq!(operation.faults[0].name, "overflow");

        let input = operation.input.as_ref().unwrap();
        let message_name = input.message.as_ref().unwrap();
        let message = definition.message(message_name).unwrap();
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.parts[0].name, "parameters");
        assert!(message.parts[0].element.is_some());
        assert!(message.parts[0].ty.is_none());
    }

    #[test]
    fn parses_schema_types_and_inline_wrappers() {
        let document = parse_str(CALCULATOR).unwrap();
        let schema = &document.definition.schemas[0];

        assert_eq!(schema.target_namespace, "urn:calc");
        assert_eq!(schema.elements.len(), 3);

        let add = &schema.elements[0];
        assert_eq!(add.name.name, "Add");
        let inline = add.inline.as_ref().unwrap();
        match &inline.content {
            TypeContent::Sequence(items) => {
                assert_eq!(items.len(), 2);
                match &items[0] {
                    SequenceItem::Element(local) => {
                        assert_eq!(local.name, "a");
                        let ty = local.ty.as_ref().unwrap();
                        assert_eq!(ty.name, "int");
                        assert_eq!(
                            document.namespaces.namespace_of(ty),
                            "http://www.w3.org/2001/XMLSchema"
                        );
                    }
                    other => panic!("unexpected item {:?}", other),
                }
            }
            other => panic!("unexpected content {:?}", other),
        }

        // element-only declaration, no inline type
        assert!(schema.elements[2].inline.is_none());
        assert!(schema.elements[2].ty.is_some());
    }

    #[test]
    fn parses_soap_extensibility_elements() {
        let document = parse_str(CALCULATOR).unwrap();
        let binding = &document.definition.bindings[0];

        let soap_binding = binding
            .extensions
            .iter()
            .find_map(|extension| match extension {
                Extension::SoapBinding(binding) => Some(binding),
                _ => None,
            })
            .unwrap();
        assert_eq!(soap_binding.version, SoapVersion::Soap11);
        assert_eq!(soap_binding.style, Some(SoapStyle::Document));
        assert_eq!(
            soap_binding.transport.as_deref(),
            Some("http://schemas.xmlsoap.org/soap/http")
        );

        let operation = &binding.operations[0];
        assert!(matches!(
            operation.extensions[0],
            Extension::SoapOperation(ref op)
                if op.soap_action.as_deref() == Some("") && op.style == Some(SoapStyle::Document)
        ));

        let input = operation.input.as_ref().unwrap();
        assert!(matches!(
            input.extensions[0],
            Extension::SoapBody(ref body) if body.use_ == Some(SoapUse::Literal)
        ));

        assert_eq!(operation.faults.len(), 1);
        assert!(matches!(
            operation.faults[0].extensions[0],
            Extension::SoapFault(ref fault) if fault.name.as_deref() == Some("overflow")
        ));

        let port = &document.definition.services[0].ports[0];
        assert!(matches!(
            port.extensions[0],
            Extension::SoapAddress(ref address)
                if address.location.as_deref() == Some("http://localhost:8080/calc")
        ));
    }

    #[test]
    fn detects_soap12_extensions_by_namespace() {
        let document = parse_str(
            r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
                xmlns:tns="urn:x" targetNamespace="urn:x">
              <wsdl:portType name="P"/>
              <wsdl:binding name="B" type="tns:P">
                <soap12:binding style="rpc" transport="urn:transport"/>
              </wsdl:binding>
            </wsdl:definitions>"#,
        )
        .unwrap();

        let binding = &document.definition.bindings[0];
        assert!(matches!(
            binding.extensions[0],
            Extension::SoapBinding(ref soap)
                if soap.version == SoapVersion::Soap12 && soap.style == Some(SoapStyle::Rpc)
        ));
    }

    #[test]
    fn unknown_extension_elements_are_preserved() {
        let document = parse_str(
            r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                xmlns:http="http://schemas.xmlsoap.org/wsdl/http/"
                xmlns:tns="urn:x" targetNamespace="urn:x">
              <wsdl:portType name="P"/>
              <wsdl:binding name="B" type="tns:P">
                <http:binding verb="POST"/>
              </wsdl:binding>
            </wsdl:definitions>"#,
        )
        .unwrap();

        let binding = &document.definition.bindings[0];
        assert!(matches!(
            binding.extensions[0],
            Extension::Other(ref other)
                if other.name == "binding"
                    && other.namespace.as_deref() == Some("http://schemas.xmlsoap.org/wsdl/http/")
        ));
    }

    #[test]
    fn missing_required_attribute_is_a_descriptive_error() {
        let result = parse_str(
            r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                targetNamespace="urn:x">
              <wsdl:message/>
            </wsdl:definitions>"#,
        );

        assert!(matches!(
            result,
            Err(Error::MissingAttribute {
                element: "message",
                attribute: "name"
            })
        ));
    }

    #[test]
    fn undeclared_prefix_is_an_error() {
        let result = parse_str(
            r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                targetNamespace="urn:x">
              <wsdl:binding name="B" type="missing:P"/>
            </wsdl:definitions>"#,
        );

        assert!(matches!(result, Err(Error::UndeclaredPrefix(prefix)) if prefix == "missing"));
    }
}
