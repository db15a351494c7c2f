use semver::Version;
use std::collections::BTreeMap;

/// Module-owned settings.
pub type Settings = BTreeMap<String, String>;

/// Identity reported for modules that are registered but not installed.
pub const UNASSIGNED_ID: u64 = 0;

/// Largest page a listing may request.
pub const MAX_PAGE_SIZE: usize = 500;
/// Page size when the listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Snapshot of a module as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub module_id: u64,
    pub technical_name: String,
    pub version: Version,
    pub enabled: bool,
    pub installed: bool,
}

impl ModuleInfo {
    /// Installed and enabled.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.installed && self.enabled
    }
}

/// Stored state of a registered module.
#[derive(Debug, Clone)]
pub(crate) struct ModuleRecord {
    pub(crate) module_id: u64,
    pub(crate) technical_name: String,
    pub(crate) version: Version,
    pub(crate) enabled: bool,
    pub(crate) installed: bool,
    pub(crate) settings: Settings,
    /// Catalog defaults, restored when a reset does not keep data.
    pub(crate) default_settings: Settings,
}

impl ModuleRecord {
    pub(crate) fn info(&self) -> ModuleInfo {
        ModuleInfo {
            module_id: self.module_id,
            technical_name: self.technical_name.clone(),
            version: self.version.clone(),
            enabled: self.enabled,
            installed: self.installed,
        }
    }
}

/// Listing criteria; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFilter {
    pub technical_name: Option<String>,
    pub enabled: Option<bool>,
    pub installed: Option<bool>,
}

impl ModuleFilter {
    pub(crate) fn matches(&self, record: &ModuleRecord) -> bool {
        self.technical_name.as_deref().is_none_or(|name| name == record.technical_name)
            && self.enabled.is_none_or(|enabled| enabled == record.enabled)
            && self.installed.is_none_or(|installed| installed == record.installed)
    }
}

/// Window into an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { limit: DEFAULT_PAGE_SIZE, offset: 0 }
    }
}

/// One page of results plus the number of matches before paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub total_items: usize,
    pub pagination: Pagination,
    pub items: Vec<T>,
}
