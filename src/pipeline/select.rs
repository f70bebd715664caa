//! Filter & sort: keep the items in the effective format set and order them.
//!
//! All sorts here are stable, so equal keys (two files differing only in
//! case, two files with the same mtime, or every upload under `modified`)
//! keep their discovery order.

use crate::config::{format_list, ImageFormat, SortOrder};
use crate::error::Img2PdfError;
use crate::pipeline::discover::SourceItem;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Intersect the requested formats with the service's allowed set.
///
/// Requested names are normalised (case, leading dot). Names outside the
/// supported or allowed sets are logged and dropped. `None` means "every
/// allowed format"; an explicit empty list selects nothing.
pub fn effective_formats(
    requested: Option<&[String]>,
    allowed: &BTreeSet<ImageFormat>,
) -> BTreeSet<ImageFormat> {
    let Some(requested) = requested else {
        return allowed.clone();
    };

    let mut set = BTreeSet::new();
    for raw in requested {
        match ImageFormat::from_extension(raw) {
            Some(fmt) if allowed.contains(&fmt) => {
                set.insert(fmt);
            }
            _ => warn!("Unsupported format will be skipped: '{}'", raw),
        }
    }
    set
}

/// Retain items whose format is in `formats`, then sort them.
///
/// `order = None` keeps discovery order. `location` only feeds the
/// [`Img2PdfError::NoImagesFound`] message.
pub fn filter_and_sort(
    items: Vec<SourceItem>,
    formats: &BTreeSet<ImageFormat>,
    order: Option<SortOrder>,
    case_sensitive: bool,
    location: &str,
) -> Result<Vec<SourceItem>, Img2PdfError> {
    let discovered = items.len();
    let mut kept: Vec<SourceItem> = items
        .into_iter()
        .filter(|item| item.format.is_some_and(|f| formats.contains(&f)))
        .collect();

    debug!(
        "Format filter kept {}/{} items ({})",
        kept.len(),
        discovered,
        format_list(formats)
    );

    if kept.is_empty() {
        let formats = if formats.is_empty() {
            "no supported formats".to_string()
        } else {
            format_list(formats)
        };
        return Err(Img2PdfError::NoImagesFound {
            location: location.to_string(),
            formats,
        });
    }

    match order {
        Some(SortOrder::Name) if case_sensitive => kept.sort_by(|a, b| a.name.cmp(&b.name)),
        Some(SortOrder::Name) => kept.sort_by_cached_key(|item| item.name.to_lowercase()),
        Some(SortOrder::Modified) => kept.sort_by_key(|item| item.modified),
        None => {}
    }

    Ok(kept)
}
