use std::collections::HashMap;

use lather_wsdl::schema::Schema;
use lather_wsdl::types::{
    Binding, BindingOperation, Definition, Extension, NamespacedName, Operation, Port, PortType,
    Service,
};

// Property keys under which the source WSDL constructs are stashed on the
// built model nodes when the builder's `record_original` flag is on, so
// later stages can recover them.
pub const WSDL_DEFINITION: &str = "wsdl.definition";
pub const WSDL_SERVICE: &str = "wsdl.service";
pub const WSDL_PORTTYPE: &str = "wsdl.porttype";
pub const WSDL_PORT: &str = "wsdl.port";
pub const WSDL_BINDING: &str = "wsdl.binding";
pub const WSDL_OPERATION: &str = "wsdl.operation";
pub const WSDL_BINDING_OPERATION: &str = "wsdl.binding.operation";
pub const WSDL_SCHEMA_LIST: &str = "wsdl.schema.list";
pub const WSDL_SCHEMA_ELEMENT_LIST: &str = "wsdl.schema.element.list";

#[derive(Debug, Clone)]
pub enum WsdlNode {
    Definition(Definition),
    Service(Service),
    PortType(PortType),
    Port(Port),
    Binding(Binding),
    Operation(Operation),
    BindingOperation(BindingOperation),
    SchemaList(Vec<Schema>),
    ElementList(Vec<NamespacedName>),
}

pub type Properties = HashMap<&'static str, WsdlNode>;

#[derive(Debug, Clone)]
pub struct MessagePartInfo {
    pub name: String,
    pub element: Option<NamespacedName>,
    pub type_name: Option<NamespacedName>,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct MessageInfo {
    pub name: NamespacedName,
    pub parts: Vec<MessagePartInfo>,
}

#[derive(Debug, Clone)]
pub struct FaultInfo {
    pub name: String,
    pub message: Option<MessageInfo>,
}

/// The parameter-level view of a wrapped document/literal operation: the
/// synthesized messages carry one part per wrapper child element.
#[derive(Debug, Clone)]
pub struct UnwrappedOperationInfo {
    pub input: MessageInfo,
    pub output: Option<MessageInfo>,
}

#[derive(Debug, Clone)]
pub struct OperationInfo {
    pub name: String,
    pub input: Option<MessageInfo>,
    pub output: Option<MessageInfo>,
    pub faults: Vec<FaultInfo>,
    pub unwrapped: Option<UnwrappedOperationInfo>,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    pub name: NamespacedName,
    pub operations: Vec<OperationInfo>,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub struct BindingMessageInfo {
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone)]
pub struct BindingFaultInfo {
    pub name: String,
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone)]
pub struct BindingOperationInfo {
    pub name: String,
    pub extensions: Vec<Extension>,
    pub input: Option<BindingMessageInfo>,
    pub output: Option<BindingMessageInfo>,
    pub faults: Vec<BindingFaultInfo>,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub struct BindingInfo {
    pub name: NamespacedName,
    /// Namespace of the binding's protocol extension (SOAP 1.1/1.2 or a
    /// foreign binding extension), when one is attached.
    pub binding_id: Option<String>,
    pub extensions: Vec<Extension>,
    pub operations: Vec<BindingOperationInfo>,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub struct EndpointInfo {
    pub name: String,
    pub binding: NamespacedName,
    pub transport_id: Option<String>,
    pub address: Option<String>,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: NamespacedName,
    pub target_namespace: String,
    pub interface: InterfaceInfo,
    pub bindings: Vec<BindingInfo>,
    pub endpoints: Vec<EndpointInfo>,
    pub properties: Properties,
}

impl MessagePartInfo {
    pub fn is_element(&self) -> bool {
        self.element.is_some()
    }
}

impl MessageInfo {
    pub fn size(&self) -> usize {
        self.parts.len()
    }
}

impl OperationInfo {
    pub fn is_one_way(&self) -> bool {
        self.output.is_none()
    }

    pub fn is_unwrapped_capable(&self) -> bool {
        self.unwrapped.is_some()
    }
}

impl InterfaceInfo {
    pub fn operation(&self, name: &str) -> Option<&OperationInfo> {
        self.operations
            .iter()
            .find(|operation| operation.name == name)
    }
}

impl ServiceInfo {
    pub fn binding(&self, name: &NamespacedName) -> Option<&BindingInfo> {
        self.bindings.iter().find(|binding| &binding.name == name)
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointInfo> {
        self.endpoints.iter().find(|endpoint| endpoint.name == name)
    }
}
