use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    error::Error,
    locator::LocatorChain,
    parser,
    registry::ExtensionRegistry,
    schema::SchemaSet,
    types::Document,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Parse-once cache of WSDL documents plus their extracted schema sets.
///
/// A document may be registered under several keys (its URL, an alias, an
/// in-memory key); identity bookkeeping maps the document back to every key
/// so eviction and schema lookup stay O(1) in the cache size. Locks are
/// never held across a parse: concurrent misses on the same key may both
/// parse, the results are behaviorally equivalent and the last insert wins.
pub struct WsdlManager {
    locator: LocatorChain,
    registry: ExtensionRegistry,
    disable_schema_cache: bool,

    definitions: Mutex<HashMap<String, Arc<Document>>>,
    identities: Mutex<HashMap<usize, Vec<String>>>,
    schemas: Mutex<HashMap<usize, Arc<SchemaSet>>>,
}

fn identity(document: &Arc<Document>) -> usize {
    Arc::as_ptr(document) as usize
}

impl WsdlManager {
    pub fn new() -> Self {
        Self::with_locator(LocatorChain::default())
    }

    pub fn with_locator(locator: LocatorChain) -> Self {
        Self {
            locator,
            registry: ExtensionRegistry::new(),
            disable_schema_cache: false,
            definitions: Mutex::new(HashMap::new()),
            identities: Mutex::new(HashMap::new()),
            schemas: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.registry
    }

    pub fn locator(&self) -> &LocatorChain {
        &self.locator
    }

    pub fn locator_mut(&mut self) -> &mut LocatorChain {
        &mut self.locator
    }

    /// Used by cache-behavior tests; every schema lookup recomputes.
    pub fn set_disable_schema_cache(&mut self, disable: bool) {
        self.disable_schema_cache = disable;
    }

    pub fn definition(&self, location: &str) -> Result<Arc<Document>, Error> {
        if let Some(document) = lock(&self.definitions).get(location) {
            tracing::trace!(%location, "definition cache hit");
            return Ok(document.clone());
        }

        tracing::debug!(%location, "definition cache miss");
        let document = Arc::new(parser::parse(location, &self.locator)?);
        self.insert(location, document.clone());
        Ok(document)
    }

    /// The in-memory entry point: parses `xml` and caches the result under
    /// the caller-supplied key.
    pub fn definition_from_str(&self, key: &str, xml: &str) -> Result<Arc<Document>, Error> {
        if let Some(document) = lock(&self.definitions).get(key) {
            tracing::trace!(%key, "definition cache hit");
            return Ok(document.clone());
        }

        let document = Arc::new(parser::parse_str(xml, &self.locator)?);
        self.insert(key, document.clone());
        Ok(document)
    }

    /// Registers an already-parsed document under an additional key.
    pub fn register(&self, key: &str, document: Arc<Document>) {
        self.insert(key, document);
    }

    pub fn schemas_for(&self, document: &Arc<Document>) -> Arc<SchemaSet> {
        if self.disable_schema_cache {
            return Arc::new(SchemaSet::from_definition(&document.definition));
        }

        let id = identity(document);
        let registered = lock(&self.identities).contains_key(&id);

        if registered {
            if let Some(set) = lock(&self.schemas).get(&id) {
                tracing::trace!("schema cache hit");
                return set.clone();
            }
        }

        let set = Arc::new(SchemaSet::from_definition(&document.definition));

        // schema sets are only retained for documents the definition cache
        // still knows about, so eviction keeps both maps in step
        if registered {
            lock(&self.schemas).insert(id, set.clone());
        }

        set
    }

    pub fn put_schemas_for(&self, document: &Arc<Document>, set: Arc<SchemaSet>) {
        if self.disable_schema_cache {
            return;
        }

        let id = identity(document);
        if lock(&self.identities).contains_key(&id) {
            lock(&self.schemas).insert(id, set);
        }
    }

    /// Evicts every key under which this document is cached, from both the
    /// definition cache and the schema cache.
    pub fn remove_definition(&self, document: &Arc<Document>) {
        let id = identity(document);

        let keys = lock(&self.identities).remove(&id).unwrap_or_default();
        if !keys.is_empty() {
            let mut definitions = lock(&self.definitions);
            for key in &keys {
                definitions.remove(key);
            }
        }
        lock(&self.schemas).remove(&id);

        tracing::debug!(keys = keys.len(), "evicted definition");
    }

    fn insert(&self, key: &str, document: Arc<Document>) {
        let id = identity(&document);
        let displaced = lock(&self.definitions).insert(key.to_owned(), document);

        let mut identities = lock(&self.identities);
        identities.entry(id).or_default().push(key.to_owned());

        // a racing insert may have displaced another copy registered under
        // this key; drop the stale reverse mapping
        if let Some(displaced) = displaced {
            let displaced_id = identity(&displaced);
            if displaced_id != id {
                if let Some(keys) = identities.get_mut(&displaced_id) {
                    keys.retain(|existing| existing != key);
                    if keys.is_empty() {
                        identities.remove(&displaced_id);
                        lock(&self.schemas).remove(&displaced_id);
                    }
                }
            }
        }
    }
}

impl Default for WsdlManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SKELETON: &str = r#"<wsdl:definitions
        xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
        xmlns:tns="urn:skel" targetNamespace="urn:skel">
      <wsdl:portType name="SkeletonPortType"/>
    </wsdl:definitions>"#;

    fn on_disk() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SKELETON).unwrap();
        file
    }

    #[test]
    fn second_lookup_returns_the_cached_instance() {
        let file = on_disk();
        let location = file.path().to_str().unwrap();
        let manager = WsdlManager::new();

        let first = manager.definition(location).unwrap();
        let second = manager.definition(location).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        manager.remove_definition(&first);
        let third = manager.definition(location).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn from_str_caches_under_the_given_key() {
        let manager = WsdlManager::new();

        let first = manager.definition_from_str("mem:skel", SKELETON).unwrap();
        let second = manager.definition_from_str("mem:skel", SKELETON).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn removal_purges_every_alias() {
        let manager = WsdlManager::new();

        let document = manager.definition_from_str("mem:skel", SKELETON).unwrap();
        manager.register("mem:alias", document.clone());

        let aliased = manager.definition_from_str("mem:alias", "ignored").unwrap();
        assert!(Arc::ptr_eq(&document, &aliased));

        manager.remove_definition(&document);
        let reparsed = manager.definition_from_str("mem:skel", SKELETON).unwrap();
        assert!(!Arc::ptr_eq(&document, &reparsed));
        let realiased = manager.definition_from_str("mem:alias", SKELETON).unwrap();
        assert!(!Arc::ptr_eq(&document, &realiased));
    }

    #[test]
    fn schema_sets_are_cached_per_document() {
        let manager = WsdlManager::new();
        let document = manager.definition_from_str("mem:skel", SKELETON).unwrap();

        let first = manager.schemas_for(&document);
        let second = manager.schemas_for(&document);
        assert!(Arc::ptr_eq(&first, &second));

        manager.remove_definition(&document);
        let third = manager.schemas_for(&document);
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn disabled_schema_cache_always_recomputes() {
        let mut manager = WsdlManager::new();
        manager.set_disable_schema_cache(true);
        let document = manager.definition_from_str("mem:skel", SKELETON).unwrap();

        let first = manager.schemas_for(&document);
        let second = manager.schemas_for(&document);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn resolves_through_the_locator_chain() {
        let mut locator = LocatorChain::default();
        locator.resources.register("mem:skel.wsdl", SKELETON);
        let manager = WsdlManager::with_locator(locator);

        let document = manager.definition("mem:skel.wsdl").unwrap();
        assert_eq!(document.definition.port_types.len(), 1);
    }
}
