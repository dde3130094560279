use thiserror::Error;

// Missing-construct errors are fatal configuration errors: surfaced
// synchronously, never retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Service '{0}' is not defined in this document")]
    MissingService(String),

    #[error("Binding '{binding}' referenced by port '{port}' is not defined")]
    MissingBinding { port: String, binding: String },

    #[error("Port type '{port_type}' referenced by binding '{binding}' is not defined")]
    MissingPortType { binding: String, port_type: String },

    #[error("Message '{message}' referenced by operation '{operation}' is not defined")]
    MissingMessage { operation: String, message: String },

    #[error("The {kind} '{name}' of operation '{operation}' does not name a message")]
    MissingOperationMessage {
        operation: String,
        kind: &'static str,
        name: String,
    },

    #[error("Port '{port}' uses unknown transport '{transport}'")]
    UnknownTransport { port: String, transport: String },
}
