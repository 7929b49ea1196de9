/*!
 * Canonical document model.
 *
 * Every importer produces the same shape: an ordered list of typed
 * elements. Order is the reading order of the source document.
 */

pub mod model;

pub use model::{CanonicalDocument, DocumentBuilder, DocumentElement, ElementKind};
