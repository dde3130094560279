use std::{collections::HashMap, fmt, sync::Arc};

use crate::types::{
    Extension, SoapAddress, SoapBinding, SoapBody, SoapFault, SoapHeader, SoapOperation,
    SoapVersion,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    Binding,
    Operation,
    Body,
    Fault,
    Header,
    Address,
}

type Creator = Arc<dyn Fn() -> Extension + Send + Sync>;

/// Creates extensibility elements by kind and namespace. SOAP 1.1 and 1.2
/// creators are built in; custom creators registered for a (kind, namespace)
/// pair override them and supply non-SOAP extensions.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    custom: HashMap<(ExtensionKind, String), Creator>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: ExtensionKind, namespace: impl Into<String>, creator: F)
    where
        F: Fn() -> Extension + Send + Sync + 'static,
    {
        self.custom
            .insert((kind, namespace.into()), Arc::new(creator));
    }

    pub fn create(&self, kind: ExtensionKind, version: SoapVersion) -> Extension {
        if let Some(extension) = self.create_for_namespace(kind, version.namespace()) {
            return extension;
        }

        match kind {
            ExtensionKind::Binding => Extension::SoapBinding(SoapBinding {
                version,
                transport: None,
                style: None,
            }),
            ExtensionKind::Operation => Extension::SoapOperation(SoapOperation {
                version,
                soap_action: None,
                style: None,
            }),
            ExtensionKind::Body => Extension::SoapBody(SoapBody {
                version,
                use_: None,
                namespace: None,
                parts: Vec::new(),
            }),
            ExtensionKind::Fault => Extension::SoapFault(SoapFault {
                version,
                name: None,
                use_: None,
            }),
            ExtensionKind::Header => Extension::SoapHeader(SoapHeader {
                version,
                message: None,
                part: None,
                use_: None,
            }),
            ExtensionKind::Address => Extension::SoapAddress(SoapAddress {
                version,
                location: None,
            }),
        }
    }

    pub fn create_for_namespace(&self, kind: ExtensionKind, namespace: &str) -> Option<Extension> {
        self.custom
            .get(&(kind, namespace.to_owned()))
            .map(|creator| creator())
    }
}
