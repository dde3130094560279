use lather_wsdl::registry::{ExtensionKind, ExtensionRegistry};
use lather_wsdl::types::{
    Binding, BindingOperation, Extension, SoapAddress, SoapBinding, SoapBody, SoapFault,
    SoapHeader, SoapOperation, SoapStyle, SoapVersion,
};

use crate::error::Error;

pub fn is_soap_binding(extension: &Extension) -> bool {
    matches!(extension, Extension::SoapBinding(..))
}

pub fn is_soap_operation(extension: &Extension) -> bool {
    matches!(extension, Extension::SoapOperation(..))
}

pub fn is_soap_body(extension: &Extension) -> bool {
    matches!(extension, Extension::SoapBody(..))
}

pub fn is_soap_fault(extension: &Extension) -> bool {
    matches!(extension, Extension::SoapFault(..))
}

pub fn is_soap_header(extension: &Extension) -> bool {
    matches!(extension, Extension::SoapHeader(..))
}

pub fn is_soap_address(extension: &Extension) -> bool {
    matches!(extension, Extension::SoapAddress(..))
}

// The accessors return the first matching element and never fail on a kind
// mismatch; a missing element is simply `None`.

pub fn soap_binding(extensions: &[Extension]) -> Option<&SoapBinding> {
    extensions.iter().find_map(|extension| match extension {
        Extension::SoapBinding(soap) => Some(soap),
        _ => None,
    })
}

pub fn soap_operation(extensions: &[Extension]) -> Option<&SoapOperation> {
    extensions.iter().find_map(|extension| match extension {
        Extension::SoapOperation(soap) => Some(soap),
        _ => None,
    })
}

pub fn soap_body(extensions: &[Extension]) -> Option<&SoapBody> {
    extensions.iter().find_map(|extension| match extension {
        Extension::SoapBody(soap) => Some(soap),
        _ => None,
    })
}

pub fn soap_fault(extensions: &[Extension]) -> Option<&SoapFault> {
    extensions.iter().find_map(|extension| match extension {
        Extension::SoapFault(soap) => Some(soap),
        _ => None,
    })
}

pub fn soap_header(extensions: &[Extension]) -> Option<&SoapHeader> {
    extensions.iter().find_map(|extension| match extension {
        Extension::SoapHeader(soap) => Some(soap),
        _ => None,
    })
}

pub fn soap_address(extensions: &[Extension]) -> Option<&SoapAddress> {
    extensions.iter().find_map(|extension| match extension {
        Extension::SoapAddress(soap) => Some(soap),
        _ => None,
    })
}

/// The style declared on the binding's own SOAP element; operation-level
/// styles are not consulted.
pub fn binding_style(binding: &Binding) -> Option<SoapStyle> {
    soap_binding(&binding.extensions).and_then(|soap| soap.style)
}

pub fn operation_style(operation: &BindingOperation) -> Option<SoapStyle> {
    soap_operation(&operation.extensions).and_then(|soap| soap.style)
}

/// Binding-level style when declared, otherwise the first operation-level
/// style in declaration order, otherwise `None`.
pub fn canonical_binding_style(binding: &Binding) -> Option<SoapStyle> {
    if let Some(style) = binding_style(binding) {
        return Some(style);
    }

    binding.operations.iter().find_map(operation_style)
}

/// Three-state scan: an unset established style adopts the first concrete
/// style seen, any later differing style makes the binding mixed. A binding
/// with no style anywhere is not mixed.
pub fn is_mixed_style(binding: &Binding) -> bool {
    let mut established = binding_style(binding);

    for operation in &binding.operations {
        if let Some(style) = operation_style(operation) {
            match established {
                None => established = Some(style),
                Some(existing) if existing != style => return true,
                Some(_) => (),
            }
        }
    }

    false
}

pub fn soap_binding_ext(
    registry: &ExtensionRegistry,
    version: SoapVersion,
) -> Result<SoapBinding, Error> {
    match registry.create(ExtensionKind::Binding, version) {
        Extension::SoapBinding(soap) => Ok(soap),
        other => Err(unexpected("binding", &other)),
    }
}

pub fn soap_operation_ext(
    registry: &ExtensionRegistry,
    version: SoapVersion,
) -> Result<SoapOperation, Error> {
    match registry.create(ExtensionKind::Operation, version) {
        Extension::SoapOperation(soap) => Ok(soap),
        other => Err(unexpected("operation", &other)),
    }
}

pub fn soap_body_ext(
    registry: &ExtensionRegistry,
    version: SoapVersion,
) -> Result<SoapBody, Error> {
    match registry.create(ExtensionKind::Body, version) {
        Extension::SoapBody(soap) => Ok(soap),
        other => Err(unexpected("body", &other)),
    }
}

pub fn soap_fault_ext(
    registry: &ExtensionRegistry,
    version: SoapVersion,
) -> Result<SoapFault, Error> {
    match registry.create(ExtensionKind::Fault, version) {
        Extension::SoapFault(soap) => Ok(soap),
        other => Err(unexpected("fault", &other)),
    }
}

pub fn soap_header_ext(
    registry: &ExtensionRegistry,
    version: SoapVersion,
) -> Result<SoapHeader, Error> {
    match registry.create(ExtensionKind::Header, version) {
        Extension::SoapHeader(soap) => Ok(soap),
        other => Err(unexpected("header", &other)),
    }
}

pub fn soap_address_ext(
    registry: &ExtensionRegistry,
    version: SoapVersion,
) -> Result<SoapAddress, Error> {
    match registry.create(ExtensionKind::Address, version) {
        Extension::SoapAddress(soap) => Ok(soap),
        other => Err(unexpected("address", &other)),
    }
}

fn unexpected(requested: &'static str, created: &Extension) -> Error {
    Error::UnexpectedExtension {
        requested,
        created: created.kind_name(),
    }
}
