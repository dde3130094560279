use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Extension registry created a '{created}' element where '{requested}' was requested")]
    UnexpectedExtension {
        requested: &'static str,
        created: &'static str,
    },

    #[error("No port type matching '{0}' is defined")]
    MissingPortType(String),

    #[error("No binding matching '{0}' is defined")]
    MissingBinding(String),
}
