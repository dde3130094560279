use lather_wsdl::registry::ExtensionRegistry;
use lather_wsdl::types::{
    Binding, BindingFault, BindingMessage, BindingOperation, Definition, Document, Extension,
    NamespacedName, Port, PortType, Service, SoapStyle, SoapUse, SoapVersion,
    SOAP11_HTTP_TRANSPORT,
};

use crate::binding::{soap_address_ext, soap_binding_ext, soap_body_ext, soap_fault_ext,
    soap_operation_ext};
use crate::error::Error;

/// Deliberately relaxed lookup: an existing port type whose local name
/// contains the requested name matches, first declaration wins. Looking up
/// a service base name like `Calculator` finds `CalculatorPortType`.
pub fn find_port_type<'a>(definition: &'a Definition, name: &str) -> Option<&'a PortType> {
    definition
        .port_types
        .iter()
        .find(|port_type| port_type.name.name.contains(name))
}

/// Same containment match as [`find_port_type`], over bindings.
pub fn find_binding<'a>(definition: &'a Definition, name: &str) -> Option<&'a Binding> {
    definition
        .bindings
        .iter()
        .find(|binding| binding.name.name.contains(name))
}

/// Synthesizes a `<name>SoapBinding` for the port type matching `name`:
/// document style over HTTP, one binding operation per port-type operation
/// with literal bodies and a literal fault per declared fault.
///
/// On error the definition may already carry partial additions; callers that
/// need atomicity must discard the document.
pub fn append_binding(
    document: &mut Document,
    name: &str,
    registry: &ExtensionRegistry,
) -> Result<NamespacedName, Error> {
    let port_type = find_port_type(&document.definition, name)
        .cloned()
        .ok_or_else(|| Error::MissingPortType(name.to_owned()))?;

    let target = document
        .namespaces
        .namespace_of(&port_type.name)
        .to_owned();
    let binding_name = NamespacedName::new(
        &mut document.namespaces,
        &target,
        format!("{}SoapBinding", name),
    );

    tracing::debug!(binding = binding_name.name.as_str(), "synthesizing binding");

    let mut soap = soap_binding_ext(registry, SoapVersion::Soap11)?;
    soap.style = Some(SoapStyle::Document);
    soap.transport = Some(SOAP11_HTTP_TRANSPORT.to_owned());

    let mut binding = Binding {
        name: binding_name.clone(),
        port_type: port_type.name.clone(),
        extensions: vec![Extension::SoapBinding(soap)],
        operations: Vec::new(),
    };

    for operation in &port_type.operations {
        let mut soap_operation = soap_operation_ext(registry, SoapVersion::Soap11)?;
        soap_operation.style = Some(SoapStyle::Document);
        soap_operation.soap_action = Some(String::new());

        let input = operation
            .input
            .as_ref()
            .map(|_| literal_body(registry))
            .transpose()?;
        let output = operation
            .output
            .as_ref()
            .map(|_| literal_body(registry))
            .transpose()?;

        let faults = operation
            .faults
            .iter()
            .map(|fault| {
                let mut soap_fault = soap_fault_ext(registry, SoapVersion::Soap11)?;
                soap_fault.name = Some(fault.name.clone());
                soap_fault.use_ = Some(SoapUse::Literal);

                Ok(BindingFault {
                    name: fault.name.clone(),
                    extensions: vec![Extension::SoapFault(soap_fault)],
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        binding.operations.push(BindingOperation {
            name: operation.name.clone(),
            extensions: vec![Extension::SoapOperation(soap_operation)],
            input,
            output,
            faults,
        });
    }

    document.definition.bindings.push(binding);
    Ok(binding_name)
}

/// Synthesizes a `<name>Service` with a single `<name>Port` bound to
/// `binding`, carrying a placeholder SOAP address.
pub fn append_service(
    document: &mut Document,
    name: &str,
    binding: NamespacedName,
    registry: &ExtensionRegistry,
) -> Result<NamespacedName, Error> {
    let target = document.namespaces.namespace_of(&binding).to_owned();
    let service_name = NamespacedName::new(
        &mut document.namespaces,
        &target,
        format!("{}Service", name),
    );

    tracing::debug!(service = service_name.name.as_str(), "synthesizing service");

    let mut address = soap_address_ext(registry, SoapVersion::Soap11)?;
    address.location = Some("dummy".to_owned());

    document.definition.services.push(Service {
        name: service_name.clone(),
        ports: vec![Port {
            name: format!("{}Port", name),
            binding,
            extensions: vec![Extension::SoapAddress(address)],
        }],
    });

    Ok(service_name)
}

fn literal_body(registry: &ExtensionRegistry) -> Result<BindingMessage, Error> {
    let mut body = soap_body_ext(registry, SoapVersion::Soap11)?;
    body.use_ = Some(SoapUse::Literal);

    Ok(BindingMessage {
        extensions: vec![Extension::SoapBody(body)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{soap_address, soap_body, soap_fault, soap_operation};
    use lather_wsdl::parse_str;

    const PARTIAL: &str = r#"<wsdl:definitions
        xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
        xmlns:tns="urn:calc" targetNamespace="urn:calc">
      <wsdl:message name="AddRequest"/>
      <wsdl:message name="AddResponse"/>
      <wsdl:message name="AddFault"/>
      <wsdl:message name="SubtractRequest"/>
      <wsdl:message name="SubtractResponse"/>
      <wsdl:portType name="CalculatorPortType">
        <wsdl:operation name="Add">
          <wsdl:input message="tns:AddRequest"/>
          <wsdl:output message="tns:AddResponse"/>
          <wsdl:fault name="overflow" message="tns:AddFault"/>
        </wsdl:operation>
        <wsdl:operation name="Subtract">
          <wsdl:input message="tns:SubtractRequest"/>
          <wsdl:output message="tns:SubtractResponse"/>
        </wsdl:operation>
      </wsdl:portType>
    </wsdl:definitions>"#;

    #[test]
    fn containment_lookup_matches_a_suffixed_port_type() {
        let document = parse_str(PARTIAL).unwrap();

        let found = find_port_type(&document.definition, "Calculator").unwrap();
        assert_eq!(found.name.name, "CalculatorPortType");
        assert!(find_port_type(&document.definition, "Elsewhere").is_none());
        assert!(find_binding(&document.definition, "Calculator").is_none());
    }

    #[test]
    fn synthesized_binding_covers_every_operation() {
        let mut document = parse_str(PARTIAL).unwrap();
        let registry = ExtensionRegistry::new();

        let binding_name = append_binding(&mut document, "Calculator", &registry).unwrap();
        assert_eq!(binding_name.name, "CalculatorSoapBinding");

        let binding = document.definition.binding(&binding_name).unwrap();
        assert_eq!(binding.operations.len(), 2);

        let soap = crate::binding::soap_binding(&binding.extensions).unwrap();
        assert_eq!(soap.style, Some(SoapStyle::Document));
        assert_eq!(soap.transport.as_deref(), Some(SOAP11_HTTP_TRANSPORT));

        let add = &binding.operations[0];
        assert_eq!(add.name, "Add");
        let operation = soap_operation(&add.extensions).unwrap();
        assert_eq!(operation.style, Some(SoapStyle::Document));
        assert_eq!(operation.soap_action.as_deref(), Some(""));

        let input_body = soap_body(&add.input.as_ref().unwrap().extensions).unwrap();
        assert_eq!(input_body.use_, Some(SoapUse::Literal));
        let output_body = soap_body(&add.output.as_ref().unwrap().extensions).unwrap();
        assert_eq!(output_body.use_, Some(SoapUse::Literal));

        assert_eq!(add.faults.len(), 1);
        let fault = soap_fault(&add.faults[0].extensions).unwrap();
        assert_eq!(fault.name.as_deref(), Some("overflow"));
        assert_eq!(fault.use_, Some(SoapUse::Literal));

        let subtract = &binding.operations[1];
        assert!(subtract.faults.is_empty());
        assert!(subtract.input.is_some());
        assert!(subtract.output.is_some());
    }

    #[test]
    fn synthesized_service_carries_a_placeholder_address() {
        let mut document = parse_str(PARTIAL).unwrap();
        let registry = ExtensionRegistry::new();

        let binding_name = append_binding(&mut document, "Calculator", &registry).unwrap();
        let service_name =
            append_service(&mut document, "Calculator", binding_name.clone(), &registry).unwrap();
        assert_eq!(service_name.name, "CalculatorService");

        let service = document.definition.service(&service_name).unwrap();
        assert_eq!(service.ports.len(), 1);

        let port = &service.ports[0];
        assert_eq!(port.name, "CalculatorPort");
        assert_eq!(port.binding, binding_name);

        let address = soap_address(&port.extensions).unwrap();
        assert_eq!(address.location.as_deref(), Some("dummy"));
    }

    #[test]
    fn missing_port_type_is_an_error() {
        let mut document = parse_str(PARTIAL).unwrap();
        let registry = ExtensionRegistry::new();

        assert!(matches!(
            append_binding(&mut document, "Elsewhere", &registry),
            Err(Error::MissingPortType(name)) if name == "Elsewhere"
        ));
    }
}
