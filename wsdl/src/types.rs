use crate::schema::Schema;

pub const WSDL_NS: &str = "http://schemas.xmlsoap.org/wsdl/";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const SOAP11_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const SOAP12_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";
pub const SOAP11_HTTP_TRANSPORT: &str = "http://schemas.xmlsoap.org/soap/http";
pub const SOAP12_HTTP_TRANSPORT: &str = "http://www.w3.org/2003/05/soap/bindings/HTTP/";

#[derive(Default, Debug, Clone)]
pub struct Namespaces(Vec<String>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    namespace_idx: usize,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapStyle {
    Document,
    Rpc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapUse {
    Literal,
    Encoded,
}

#[derive(Debug, Clone)]
pub struct SoapBinding {
    pub version: SoapVersion,
    pub transport: Option<String>,
    pub style: Option<SoapStyle>,
}

#[derive(Debug, Clone)]
pub struct SoapOperation {
    pub version: SoapVersion,
    pub soap_action: Option<String>,
    pub style: Option<SoapStyle>,
}

#[derive(Debug, Clone)]
pub struct SoapBody {
    pub version: SoapVersion,
    pub use_: Option<SoapUse>,
    pub namespace: Option<String>,
    pub parts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SoapFault {
    pub version: SoapVersion,
    pub name: Option<String>,
    pub use_: Option<SoapUse>,
}

#[derive(Debug, Clone)]
pub struct SoapHeader {
    pub version: SoapVersion,
    pub message: Option<NamespacedName>,
    pub part: Option<String>,
    pub use_: Option<SoapUse>,
}

#[derive(Debug, Clone)]
pub struct SoapAddress {
    pub version: SoapVersion,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OtherExtension {
    pub namespace: Option<String>,
    pub name: String,
}

// The SOAP 1.1/1.2 element pairs share one normalized struct discriminated
// by `version`, so callers never branch on the wire namespace.
#[derive(Debug, Clone)]
pub enum Extension {
    SoapBinding(SoapBinding),
    SoapOperation(SoapOperation),
    SoapBody(SoapBody),
    SoapFault(SoapFault),
    SoapHeader(SoapHeader),
    SoapAddress(SoapAddress),
    Other(OtherExtension),
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub element: Option<NamespacedName>,
    pub ty: Option<NamespacedName>,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: NamespacedName,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone)]
pub struct OperationMessage {
    pub name: Option<String>,
    pub message: Option<NamespacedName>,
}

#[derive(Debug, Clone)]
pub struct OperationFault {
    pub name: String,
    pub message: Option<NamespacedName>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: Option<OperationMessage>,
    pub output: Option<OperationMessage>,
    pub faults: Vec<OperationFault>,
}

#[derive(Debug, Clone)]
pub struct PortType {
    pub name: NamespacedName,
    pub operations: Vec<Operation>,
}

#[derive(Default, Debug, Clone)]
pub struct BindingMessage {
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone)]
pub struct BindingFault {
    pub name: String,
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: String,
    pub extensions: Vec<Extension>,
    pub input: Option<BindingMessage>,
    pub output: Option<BindingMessage>,
    pub faults: Vec<BindingFault>,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: NamespacedName,
    pub port_type: NamespacedName,
    pub extensions: Vec<Extension>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub binding: NamespacedName,
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: NamespacedName,
    pub ports: Vec<Port>,
}

#[derive(Default, Debug, Clone)]
pub struct Definition {
    pub target_namespace: String,
    pub documentation: Option<String>,
    pub schemas: Vec<Schema>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
}

/// A parsed WSDL document: the definition tree plus the namespace table its
/// names are interned against.
#[derive(Default, Debug, Clone)]
pub struct Document {
    pub definition: Definition,
    pub namespaces: Namespaces,
}

impl Namespaces {
    pub fn namespaces(&self) -> &[String] {
        &self.0
    }

    pub fn add_or_get(&mut self, namespace: &str) -> usize {
        if let Some(index) = self.index_of(namespace) {
            index
        } else {
            let index = self.0.len();
            self.0.push(namespace.to_owned());
            index
        }
    }

    pub fn namespace_of(&self, name: &NamespacedName) -> &str {
        self.0
            .get(name.namespace_idx)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn qualified(&self, name: &NamespacedName) -> String {
        format!("{{{}}}{}", self.namespace_of(name), name.name)
    }

    fn index_of(&self, namespace: &str) -> Option<usize> {
        self.0.iter().position(|value| value == namespace)
    }
}

impl NamespacedName {
    pub fn new(namespaces: &mut Namespaces, namespace: &str, name: String) -> Self {
        Self {
            namespace_idx: namespaces.add_or_get(namespace),
            name,
        }
    }

    pub fn index(&self) -> usize {
        self.namespace_idx
    }
}

impl SoapVersion {
    pub fn namespace(&self) -> &'static str {
        match self {
            SoapVersion::Soap11 => SOAP11_NS,
            SoapVersion::Soap12 => SOAP12_NS,
        }
    }

    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            SOAP11_NS => Some(SoapVersion::Soap11),
            SOAP12_NS => Some(SoapVersion::Soap12),
            _ => None,
        }
    }
}

impl SoapStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "document" => Some(SoapStyle::Document),
            "rpc" => Some(SoapStyle::Rpc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SoapStyle::Document => "document",
            SoapStyle::Rpc => "rpc",
        }
    }
}

impl SoapUse {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "literal" => Some(SoapUse::Literal),
            "encoded" => Some(SoapUse::Encoded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SoapUse::Literal => "literal",
            SoapUse::Encoded => "encoded",
        }
    }
}

impl Extension {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Extension::SoapBinding(..) => "binding",
            Extension::SoapOperation(..) => "operation",
            Extension::SoapBody(..) => "body",
            Extension::SoapFault(..) => "fault",
            Extension::SoapHeader(..) => "header",
            Extension::SoapAddress(..) => "address",
            Extension::Other(..) => "other",
        }
    }
}

impl Definition {
    pub fn port_type(&self, name: &NamespacedName) -> Option<&PortType> {
        self.port_types.iter().find(|pt| &pt.name == name)
    }

    pub fn binding(&self, name: &NamespacedName) -> Option<&Binding> {
        self.bindings.iter().find(|b| &b.name == name)
    }

    pub fn message(&self, name: &NamespacedName) -> Option<&Message> {
        self.messages.iter().find(|m| &m.name == name)
    }

    pub fn service(&self, name: &NamespacedName) -> Option<&Service> {
        self.services.iter().find(|s| &s.name == name)
    }
}
