use std::{
    collections::HashMap,
    fs::File,
    io::{Cursor, Read},
    path::Path,
};

use url::Url;

use crate::error::Error;

/// Catalog-style resolution: ordered prefix rewrites applied to a requested
/// location before any fetching happens.
#[derive(Debug, Clone, Default)]
pub struct CatalogLocator {
    rewrites: Vec<(String, String)>,
}

/// Registered in-memory documents, keyed by the (catalog-resolved) location
/// string. Stands in for classpath/bundle resource resolution.
#[derive(Debug, Clone, Default)]
pub struct ResourceLocator {
    resources: HashMap<String, String>,
}

/// The resolution pipeline used for every document and import: catalog
/// rewrite, then registered resources, then the filesystem or HTTP.
#[derive(Debug, Clone, Default)]
pub struct LocatorChain {
    pub catalog: CatalogLocator,
    pub resources: ResourceLocator,
}

impl CatalogLocator {
    pub fn rewrite_prefix(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.rewrites.push((from.into(), to.into()));
    }

    /// First matching rewrite wins, in registration order.
    pub fn resolve(&self, location: &str) -> String {
        for (from, to) in &self.rewrites {
            if let Some(rest) = location.strip_prefix(from.as_str()) {
                return format!("{}{}", to, rest);
            }
        }

        location.to_owned()
    }
}

impl ResourceLocator {
    pub fn register(&mut self, location: impl Into<String>, content: impl Into<String>) {
        self.resources.insert(location.into(), content.into());
    }

    pub fn lookup(&self, location: &str) -> Option<&str> {
        self.resources.get(location).map(String::as_str)
    }
}

impl LocatorChain {
    /// Opens a document source. Returns the base URL to join relative
    /// imports against (when one can be derived) and the byte stream.
    pub fn open(&self, location: &str) -> Result<(Option<Url>, Box<dyn Read>), Error> {
        let resolved = self.catalog.resolve(location);

        if let Some(content) = self.resources.lookup(&resolved) {
            tracing::trace!(location = %resolved, "serving registered resource");
            let bytes = content.as_bytes().to_vec();
            return Ok((Url::parse(&resolved).ok(), Box::new(Cursor::new(bytes))));
        }

        let url = into_url(&resolved)?;

        let source: Box<dyn Read> = match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| Error::PathConversionError(None))?;
                Box::new(File::open(path).map_err(Error::FileOpenError)?)
            }

            "http" | "https" => Box::new(reqwest::blocking::get(url.clone())?),

            other => return Err(Error::UnsupportedScheme(other.into())),
        };

        Ok((Some(url), source))
    }
}

/// Accepts either a full URL or a plain filesystem path.
pub fn into_url(location: &str) -> Result<Url, Error> {
    match Url::parse(location) {
        Ok(url) => Ok(url),

        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = Path::new(location)
                .canonicalize()
                .map_err(|err| Error::PathConversionError(Some(err)))?;
            Url::from_file_path(&path).map_err(|()| Error::PathConversionError(None))
        }

        Err(err) => Err(err.into()),
    }
}
