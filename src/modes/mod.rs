//! The three CLI modes (extract, offsets, values) and the configuration
//! files they share.

pub mod extract;
pub mod offsets;
pub mod values;

/// Default location of the template schema file, read from the working
/// directory (no CLI flag for it: it is ambient configuration, not a
/// per-invocation argument, matching spec.md §6's three-positional-argument
/// default-mode signature).
pub const TEMPLATE_IDS_PATH: &str = "TemplateIds.tsv";

/// Default location of the per-project exclude-list file. Optional: a
/// missing file means nothing is excluded.
pub const EXCLUDE_TEMPLATES_PATH: &str = "ExcludeTemplates.tsv";

/// Default location of the per-project namespace-filter file. Optional: a
/// missing file falls back to article-namespace-only.
pub const NAMESPACES_PATH: &str = "Namespaces.tsv";

use crate::error::AppError;
use crate::policy::{ExcludeList, NamespaceFilter};
use std::path::Path;

/// Loads the exclude list if present, otherwise falls back to "nothing
/// excluded".
pub(crate) fn load_exclude_list(path: &Path) -> Result<ExcludeList, AppError> {
    if path.exists() {
        Ok(ExcludeList::load(path)?)
    } else {
        Ok(ExcludeList::empty())
    }
}

/// Loads the namespace filter if present, otherwise falls back to
/// article-namespace-only.
pub(crate) fn load_namespace_filter(path: &Path) -> Result<NamespaceFilter, AppError> {
    if path.exists() {
        Ok(NamespaceFilter::load(path)?)
    } else {
        Ok(NamespaceFilter::default_article_only())
    }
}
