/*!
 * Format detection.
 *
 * The extension is the primary signal. Content sniffing only breaks ties
 * between descriptors that share an extension, or classifies files whose
 * extension nobody claims.
 */

use std::path::Path;

use log::debug;

use super::{FormatCatalog, FormatDescriptor};

/// Result of classifying a file
#[derive(Debug, Clone)]
pub enum Detection<'a> {
    /// The file belongs to this descriptor's format family
    Matched(&'a FormatDescriptor),
    /// Nothing matched; the raw extension is kept for diagnostics
    Unsupported { extension: Option<String> },
}

impl<'a> Detection<'a> {
    /// The matched descriptor, if any
    pub fn descriptor(&self) -> Option<&'a FormatDescriptor> {
        match self {
            Self::Matched(descriptor) => Some(descriptor),
            Self::Unsupported { .. } => None,
        }
    }
}

/// Lowercased extension of a path, if any
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Classifies candidate files against a catalog
#[derive(Debug, Clone, Copy)]
pub struct FormatDetector<'a> {
    catalog: &'a FormatCatalog,
}

impl<'a> FormatDetector<'a> {
    pub fn new(catalog: &'a FormatCatalog) -> Self {
        Self { catalog }
    }

    /// Pick the descriptor for a file from its path and leading bytes
    pub fn detect(&self, path: &Path, prefix: &[u8]) -> Detection<'a> {
        let extension = extension_of(path);
        let descriptors = self.catalog.list_supported_formats();

        if let Some(ext) = extension.as_deref() {
            let candidates: Vec<&FormatDescriptor> =
                descriptors.iter().filter(|d| d.claims_extension(ext)).collect();

            match candidates.as_slice() {
                [] => {}
                [only] => {
                    debug!("Extension .{} selects {}", ext, only.label);
                    return Detection::Matched(*only);
                }
                several => {
                    debug!("Extension .{} is shared by {} formats, sniffing content", ext, several.len());
                    return match several.iter().copied().find(|d| d.matches_content(prefix)) {
                        Some(found) => Detection::Matched(found),
                        None => Detection::Unsupported { extension },
                    };
                }
            }
        }

        if let Some(found) = descriptors.iter().find(|d| (d.signature)(prefix)) {
            debug!("Content signature selects {}", found.label);
            return Detection::Matched(found);
        }
        if let Some(found) = descriptors
            .iter()
            .find(|d| d.legacy.is_some_and(|legacy| legacy.matches_content(prefix)))
        {
            debug!("Legacy signature selects the {} family", found.label);
            return Detection::Matched(found);
        }

        Detection::Unsupported { extension }
    }
}
