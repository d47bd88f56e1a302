//! Static clip catalog

use crate::{Error, MediaItem, MediaItemId, Result};
use url::Url;

/// Entries of the reference deployment: `(url, title, icon)`.
pub const REFERENCE_ENTRIES: [(&str, &str, &str); 3] = [
    ("https://acorn.nu/no-cup-is-safe.mp4", "DL 89%", "arrow.up.square"),
    ("https://acorn.nu/apologies.mp4", "FO Left 87%", "arrow.right.square"),
    ("https://acorn.nu/golfsmith.mp4", "FO Right 89%", "arrow.backward.square"),
];

/// Immutable ordered list of selectable clips
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<MediaItem>,
}

impl Catalog {
    /// Create a catalog, rejecting empty lists and non-http(s) sources
    pub fn new(items: Vec<MediaItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::InvalidCatalog("catalog is empty".to_string()));
        }

        for item in &items {
            match item.source_uri.scheme() {
                "http" | "https" => {}
                scheme => {
                    return Err(Error::InvalidCatalog(format!(
                        "{}: unsupported scheme {}",
                        item.title, scheme
                    )))
                }
            }
            if item.source_uri.host_str().is_none() {
                return Err(Error::InvalidCatalog(format!("{}: missing host", item.title)));
            }
        }

        Ok(Self { items })
    }

    /// Build a catalog from `(url, title, icon)` tuples
    pub fn from_entries(entries: &[(&str, &str, &str)]) -> Result<Self> {
        let items = entries
            .iter()
            .map(|(url, title, icon)| {
                let source_uri = Url::parse(url)
                    .map_err(|e| Error::InvalidCatalog(format!("{}: {}", url, e)))?;
                Ok(MediaItem::new(source_uri, *title, *icon))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(items)
    }

    /// The three clips of the reference deployment
    pub fn reference() -> Self {
        let items = REFERENCE_ENTRIES
            .iter()
            .filter_map(|(url, title, icon)| {
                Url::parse(url).ok().map(|u| MediaItem::new(u, *title, *icon))
            })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&MediaItem> {
        self.items.first()
    }

    pub fn find(&self, id: MediaItemId) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn position(&self, id: MediaItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_catalog() {
        let catalog = Catalog::reference();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.items()[0].title, "DL 89%");
        assert_eq!(catalog.items()[1].icon, "arrow.right.square");
        assert_eq!(
            catalog.items()[2].source_uri.as_str(),
            "https://acorn.nu/golfsmith.mp4"
        );
    }

    #[test]
    fn test_lookup() {
        let catalog = Catalog::reference();
        let second = catalog.get(1).unwrap().clone();
        assert_eq!(catalog.find(second.id), Some(&second));
        assert_eq!(catalog.position(second.id), Some(1));
        assert!(catalog.get(3).is_none());
        assert!(catalog.find(MediaItemId::new()).is_none());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(Catalog::new(vec![]), Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_non_http() {
        let result = Catalog::from_entries(&[("file:///tmp/clip.mp4", "Local", "doc")]);
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_relative() {
        let result = Catalog::from_entries(&[("clips/a.mp4", "Relative", "doc")]);
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }
}
