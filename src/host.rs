//! Headless host collaborators.
//!
//! [`HeadlessNode`] stands in for the DOM node a widget renders into and
//! [`PreloadedLoader`] for a page where the engine scripts are either
//! already present or fetched instantly. The replay binary and the tests
//! drive widgets through these.

use crate::{
    engine::LibrarySpec,
    prelude::HashMap,
    traits::{AssetLoader, HostNode},
    MapError, Result,
};
use async_trait::async_trait;
use std::cell::RefCell;

#[derive(Debug, Clone, Default)]
pub struct HeadlessNode {
    id: String,
    attributes: HashMap<String, String>,
    error: Option<String>,
}

impl HeadlessNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Inline error currently rendered in place of the map
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl HostNode for HeadlessNode {
    fn node_id(&self) -> String {
        self.id.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}

/// Loader whose libraries are either on the page or load immediately
#[derive(Debug, Default)]
pub struct PreloadedLoader {
    available: bool,
    fail_with: Option<String>,
    requests: RefCell<Vec<LibrarySpec>>,
}

impl PreloadedLoader {
    /// Every library is already present
    pub fn available() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    /// Libraries are missing; `load` resolves successfully
    pub fn missing() -> Self {
        Self::default()
    }

    /// Libraries are missing and fetching them fails
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Libraries requested through `load`, in order
    pub fn requests(&self) -> Vec<LibrarySpec> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl AssetLoader for PreloadedLoader {
    fn is_available(&self, _library: &LibrarySpec) -> bool {
        self.available
    }

    async fn load(&self, library: LibrarySpec) -> Result<()> {
        log::debug!("Loading {} assets for {}", library.scripts.len(), library.provider);
        self.requests.borrow_mut().push(library);
        match &self.fail_with {
            Some(reason) => Err(MapError::LoadFailed(reason.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Provider;
    use futures::executor::block_on;

    #[test]
    fn test_node_records_error() {
        let mut node = HeadlessNode::new("map").with_attribute("data-markers", "[]");
        assert_eq!(node.attribute("data-markers").as_deref(), Some("[]"));
        assert_eq!(node.attribute("title"), None);

        node.show_error("boom");
        assert_eq!(node.error(), Some("boom"));
    }

    #[test]
    fn test_loader_records_requests() {
        let loader = PreloadedLoader::missing();
        let spec = LibrarySpec::new(Provider::OpenLayers, "ol").script("ol.js");
        assert!(!loader.is_available(&spec));
        assert!(block_on(loader.load(spec.clone())).is_ok());
        assert_eq!(loader.requests(), vec![spec]);

        let failing = PreloadedLoader::failing("offline");
        let err = block_on(failing.load(LibrarySpec::new(Provider::Google, "google.maps")));
        assert!(matches!(err, Err(MapError::LoadFailed(_))));
    }
}
