use std::collections::HashMap;

use tracing::Level;

use lather_soap::binding::{soap_address, soap_binding};
use lather_wsdl::schema::SchemaSet;
use lather_wsdl::types::{
    Binding, Document, Extension, NamespacedName, Operation, Port, PortType, Service,
    SOAP11_HTTP_TRANSPORT, SOAP12_HTTP_TRANSPORT,
};

use crate::error::Error;
use crate::service::{
    BindingFaultInfo, BindingInfo, BindingMessageInfo, BindingOperationInfo, EndpointInfo,
    FaultInfo, InterfaceInfo, MessageInfo, MessagePartInfo, OperationInfo, Properties,
    ServiceInfo, WsdlNode, WSDL_BINDING, WSDL_BINDING_OPERATION, WSDL_DEFINITION, WSDL_OPERATION,
    WSDL_PORT, WSDL_PORTTYPE, WSDL_SCHEMA_ELEMENT_LIST, WSDL_SCHEMA_LIST, WSDL_SERVICE,
};
use crate::wrapped::{check_for_wrapped, NotWrappedReason, WrappedOutcome, WrappedRules};

#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Stash the source WSDL constructs on the built nodes under the
    /// `WSDL_*` property keys.
    pub record_original: bool,
    /// Skip endpoint construction for ports whose transport is unknown
    /// instead of failing.
    pub ignore_unknown_bindings: bool,
    pub relaxed_wrapped_rules: bool,
    pub follow_element_refs: bool,
    /// Level at which wrapped-detection rule failures are logged.
    pub unwrap_log_level: Level,
    /// Transport URIs endpoints may be built for.
    pub transport_ids: Vec<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            record_original: false,
            ignore_unknown_bindings: false,
            relaxed_wrapped_rules: false,
            follow_element_refs: false,
            unwrap_log_level: Level::DEBUG,
            transport_ids: vec![
                SOAP11_HTTP_TRANSPORT.to_owned(),
                SOAP12_HTTP_TRANSPORT.to_owned(),
            ],
        }
    }
}

/// Plug-in point for binding-specific construction, registered by the
/// namespace of the binding's protocol extension. Bindings with no matching
/// factory fall back to the generic extension-copying walk.
pub trait BindingInfoFactory {
    fn create_binding_info(
        &self,
        document: &Document,
        binding: &Binding,
        interface: &InterfaceInfo,
    ) -> Result<BindingInfo, Error>;
}

pub struct WsdlServiceBuilder<'a> {
    document: &'a Document,
    schemas: &'a SchemaSet,
    config: BuilderConfig,
    binding_factories: HashMap<String, Box<dyn BindingInfoFactory>>,
}

impl<'a> WsdlServiceBuilder<'a> {
    pub fn new(document: &'a Document, schemas: &'a SchemaSet) -> Self {
        Self::with_config(document, schemas, BuilderConfig::default())
    }

    pub fn with_config(
        document: &'a Document,
        schemas: &'a SchemaSet,
        config: BuilderConfig,
    ) -> Self {
        Self {
            document,
            schemas,
            config,
            binding_factories: HashMap::new(),
        }
    }

    pub fn register_binding_factory(
        &mut self,
        namespace: impl Into<String>,
        factory: Box<dyn BindingInfoFactory>,
    ) {
        self.binding_factories.insert(namespace.into(), factory);
    }

    /// Builds one `ServiceInfo` per distinct port type referenced by the
    /// definition's services. Ports sharing a port type merge into a single
    /// `ServiceInfo` carrying several bindings and endpoints, even across
    /// service elements.
    pub fn build_services(&self) -> Result<Vec<ServiceInfo>, Error> {
        self.build(self.document.definition.services.iter())
    }

    pub fn build_service(&self, name: &NamespacedName) -> Result<Vec<ServiceInfo>, Error> {
        let service = self
            .document
            .definition
            .service(name)
            .ok_or_else(|| Error::MissingService(self.qualified(name)))?;

        self.build(std::iter::once(service))
    }

    fn build<'s>(
        &self,
        services: impl Iterator<Item = &'s Service>,
    ) -> Result<Vec<ServiceInfo>, Error> {
        let mut infos: Vec<ServiceInfo> = Vec::new();
        let mut by_port_type: HashMap<NamespacedName, usize> = HashMap::new();

        for service in services {
            for port in &service.ports {
                let binding = self.document.definition.binding(&port.binding).ok_or_else(|| {
                    Error::MissingBinding {
                        port: port.name.clone(),
                        binding: self.qualified(&port.binding),
                    }
                })?;

                let port_type = self
                    .document
                    .definition
                    .port_type(&binding.port_type)
                    .ok_or_else(|| Error::MissingPortType {
                        binding: self.qualified(&binding.name),
                        port_type: self.qualified(&binding.port_type),
                    })?;

                let index = match by_port_type.get(&port_type.name) {
                    Some(index) => *index,
                    None => {
                        infos.push(self.build_service_info(service, port_type)?);
                        by_port_type.insert(port_type.name.clone(), infos.len() - 1);
                        infos.len() - 1
                    }
                };

                if infos[index].binding(&binding.name).is_none() {
                    let binding_info = self.build_binding(binding, &infos[index].interface)?;
                    infos[index].bindings.push(binding_info);
                }

                if let Some(endpoint) = self.build_endpoint(port, binding)? {
                    infos[index].endpoints.push(endpoint);
                }
            }
        }

        Ok(infos)
    }

    fn build_service_info(
        &self,
        service: &Service,
        port_type: &PortType,
    ) -> Result<ServiceInfo, Error> {
        tracing::debug!(
            service = service.name.name.as_str(),
            port_type = port_type.name.name.as_str(),
            "building service info"
        );

        let mut properties = Properties::new();
        if self.config.record_original {
            properties.insert(
                WSDL_DEFINITION,
                WsdlNode::Definition(self.document.definition.clone()),
            );
            properties.insert(WSDL_SERVICE, WsdlNode::Service(service.clone()));
            properties.insert(
                WSDL_SCHEMA_LIST,
                WsdlNode::SchemaList(self.document.definition.schemas.clone()),
            );
            properties.insert(
                WSDL_SCHEMA_ELEMENT_LIST,
                WsdlNode::ElementList(self.schemas.element_names().cloned().collect()),
            );
        }

        Ok(ServiceInfo {
            name: service.name.clone(),
            target_namespace: self
                .document
                .namespaces
                .namespace_of(&service.name)
                .to_owned(),
            interface: self.build_interface(port_type)?,
            bindings: Vec::new(),
            endpoints: Vec::new(),
            properties,
        })
    }

    fn build_interface(&self, port_type: &PortType) -> Result<InterfaceInfo, Error> {
        let mut properties = Properties::new();
        if self.config.record_original {
            properties.insert(WSDL_PORTTYPE, WsdlNode::PortType(port_type.clone()));
        }

        let operations = port_type
            .operations
            .iter()
            .map(|operation| self.build_interface_operation(operation))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(InterfaceInfo {
            name: port_type.name.clone(),
            operations,
            properties,
        })
    }

    fn build_interface_operation(&self, operation: &Operation) -> Result<OperationInfo, Error> {
        let input = operation
            .input
            .as_ref()
            .map(|input| {
                let message = input.message.as_ref().ok_or_else(|| {
                    Error::MissingOperationMessage {
                        operation: operation.name.clone(),
                        kind: "input",
                        name: input.name.clone().unwrap_or_default(),
                    }
                })?;
                self.build_message(&operation.name, message)
            })
            .transpose()?;

        let output = operation
            .output
            .as_ref()
            .map(|output| {
                let message = output.message.as_ref().ok_or_else(|| {
                    Error::MissingOperationMessage {
                        operation: operation.name.clone(),
                        kind: "output",
                        name: output.name.clone().unwrap_or_default(),
                    }
                })?;
                self.build_message(&operation.name, message)
            })
            .transpose()?;

        let faults = operation
            .faults
            .iter()
            .map(|fault| {
                let message = fault.message.as_ref().ok_or_else(|| {
                    Error::MissingOperationMessage {
                        operation: operation.name.clone(),
                        kind: "fault",
                        name: fault.name.clone(),
                    }
                })?;

                Ok(FaultInfo {
                    name: fault.name.clone(),
                    message: Some(self.build_message(&operation.name, message)?),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let mut properties = Properties::new();
        if self.config.record_original {
            properties.insert(WSDL_OPERATION, WsdlNode::Operation(operation.clone()));
        }

        let mut info = OperationInfo {
            name: operation.name.clone(),
            input,
            output,
            faults,
            unwrapped: None,
            properties,
        };

        let rules = WrappedRules {
            relaxed: self.config.relaxed_wrapped_rules,
            follow_refs: self.config.follow_element_refs,
        };

        match check_for_wrapped(&info, self.schemas, rules) {
            WrappedOutcome::Wrapped(unwrapped) => info.unwrapped = Some(unwrapped),
            WrappedOutcome::NotWrapped(reason) => self.log_not_wrapped(&info.name, &reason),
        }

        Ok(info)
    }

    fn build_message(
        &self,
        operation: &str,
        name: &NamespacedName,
    ) -> Result<MessageInfo, Error> {
        let message =
            self.document
                .definition
                .message(name)
                .ok_or_else(|| Error::MissingMessage {
                    operation: operation.to_owned(),
                    message: self.qualified(name),
                })?;

        Ok(MessageInfo {
            name: message.name.clone(),
            parts: message
                .parts
                .iter()
                .enumerate()
                .map(|(index, part)| MessagePartInfo {
                    name: part.name.clone(),
                    element: part.element.clone(),
                    type_name: part.ty.clone(),
                    index,
                })
                .collect(),
        })
    }

    fn build_binding(
        &self,
        binding: &Binding,
        interface: &InterfaceInfo,
    ) -> Result<BindingInfo, Error> {
        let binding_id = binding.extensions.iter().find_map(|extension| match extension {
            Extension::SoapBinding(soap) => Some(soap.version.namespace().to_owned()),
            Extension::Other(other) => other.namespace.clone(),
            _ => None,
        });

        if let Some(namespace) = &binding_id {
            if let Some(factory) = self.binding_factories.get(namespace) {
                tracing::debug!(namespace = namespace.as_str(), "delegating to binding factory");
                return factory.create_binding_info(self.document, binding, interface);
            }
        }

        let mut properties = Properties::new();
        if self.config.record_original {
            properties.insert(WSDL_BINDING, WsdlNode::Binding(binding.clone()));
        }

        let mut info = BindingInfo {
            name: binding.name.clone(),
            binding_id,
            extensions: binding.extensions.clone(),
            operations: Vec::new(),
            properties,
        };

        for operation in &binding.operations {
            if interface.operation(&operation.name).is_none() {
                tracing::warn!(
                    operation = operation.name.as_str(),
                    "binding operation matches no interface operation, skipping"
                );
                continue;
            }

            let mut properties = Properties::new();
            if self.config.record_original {
                properties.insert(
                    WSDL_BINDING_OPERATION,
                    WsdlNode::BindingOperation(operation.clone()),
                );
            }

            info.operations.push(BindingOperationInfo {
                name: operation.name.clone(),
                extensions: operation.extensions.clone(),
                input: operation.input.as_ref().map(|message| BindingMessageInfo {
                    extensions: message.extensions.clone(),
                }),
                output: operation.output.as_ref().map(|message| BindingMessageInfo {
                    extensions: message.extensions.clone(),
                }),
                faults: operation
                    .faults
                    .iter()
                    .map(|fault| BindingFaultInfo {
                        name: fault.name.clone(),
                        extensions: fault.extensions.clone(),
                    })
                    .collect(),
                properties,
            });
        }

        Ok(info)
    }

    fn build_endpoint(&self, port: &Port, binding: &Binding) -> Result<Option<EndpointInfo>, Error> {
        let transport = soap_binding(&binding.extensions).and_then(|soap| soap.transport.clone());

        let known = transport
            .as_deref()
            .map(|transport| {
                self.config
                    .transport_ids
                    .iter()
                    .any(|known| known == transport)
            })
            .unwrap_or(false);

        if !known {
            if self.config.ignore_unknown_bindings {
                tracing::debug!(port = port.name.as_str(), "skipping port with unknown transport");
                return Ok(None);
            }

            return Err(Error::UnknownTransport {
                port: port.name.clone(),
                transport: transport.unwrap_or_default(),
            });
        }

        let mut properties = Properties::new();
        if self.config.record_original {
            properties.insert(WSDL_PORT, WsdlNode::Port(port.clone()));
        }

        Ok(Some(EndpointInfo {
            name: port.name.clone(),
            binding: binding.name.clone(),
            transport_id: transport,
            address: soap_address(&port.extensions).and_then(|address| address.location.clone()),
            properties,
        }))
    }

    fn log_not_wrapped(&self, operation: &str, reason: &NotWrappedReason) {
        let level = self.config.unwrap_log_level;

        if level == Level::ERROR {
            tracing::error!(operation, %reason, "operation is not document/literal wrapped");
        } else if level == Level::WARN {
            tracing::warn!(operation, %reason, "operation is not document/literal wrapped");
        } else if level == Level::INFO {
            tracing::info!(operation, %reason, "operation is not document/literal wrapped");
        } else if level == Level::DEBUG {
            tracing::debug!(operation, %reason, "operation is not document/literal wrapped");
        } else {
            tracing::trace!(operation, %reason, "operation is not document/literal wrapped");
        }
    }

    fn qualified(&self, name: &NamespacedName) -> String {
        self.document.namespaces.qualified(name)
    }
}
