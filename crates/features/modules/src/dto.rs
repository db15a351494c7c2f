use crate::model::{DEFAULT_PAGE_SIZE, ModuleFilter, ModuleInfo, Page, Pagination};
use modhub_derive::api_model;
use utoipa::IntoParams;

#[api_model]
/// Public view of a module.
pub struct ModuleInfoDto {
    /// Store-assigned identity; changes on reset, `0` while not installed.
    pub module_id: u64,
    /// Stable identifier used in paths.
    pub technical_name: String,
    /// Semantic version.
    pub version: String,
    pub enabled: bool,
    pub installed: bool,
}

impl From<ModuleInfo> for ModuleInfoDto {
    fn from(info: ModuleInfo) -> Self {
        Self {
            module_id: info.module_id,
            technical_name: info.technical_name,
            version: info.version.to_string(),
            enabled: info.enabled,
            installed: info.installed,
        }
    }
}

#[api_model(deny_unknown_fields = false)]
#[derive(Default, IntoParams)]
#[into_params(parameter_in = Query)]
/// Listing filters and paging.
pub struct ModuleListQuery {
    /// Exact technical name.
    pub technical_name: Option<String>,
    pub enabled: Option<bool>,
    pub installed: Option<bool>,
    /// Page size, 1 to 500 (default 50).
    pub limit: Option<usize>,
    /// Matches to skip (default 0).
    pub offset: Option<usize>,
}

impl ModuleListQuery {
    pub(crate) fn into_parts(self) -> (ModuleFilter, Pagination) {
        let filter = ModuleFilter {
            technical_name: self.technical_name,
            enabled: self.enabled,
            installed: self.installed,
        };
        let pagination = Pagination {
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: self.offset.unwrap_or_default(),
        };
        (filter, pagination)
    }
}

#[api_model]
/// One page of modules.
pub struct ModuleListResponse {
    /// Matches before paging.
    pub total_items: usize,
    pub limit: usize,
    pub offset: usize,
    pub items: Vec<ModuleInfoDto>,
}

impl From<Page<ModuleInfo>> for ModuleListResponse {
    fn from(page: Page<ModuleInfo>) -> Self {
        Self {
            total_items: page.total_items,
            limit: page.pagination.limit,
            offset: page.pagination.offset,
            items: page.items.into_iter().map(ModuleInfoDto::from).collect(),
        }
    }
}

#[api_model]
/// New enabled state of one module.
pub struct ModuleStatusRequest {
    pub enabled: bool,
}

#[api_model]
/// New enabled state applied to several modules.
pub struct BulkStatusRequest {
    /// Technical names; duplicates are applied once.
    pub modules: Vec<String>,
    pub enabled: bool,
}

#[api_model]
#[derive(Default)]
/// Reset options; the body may be omitted.
pub struct ResetRequest {
    /// Carry module settings across the reinstall (default `false`).
    #[serde(default)]
    pub keep_data: bool,
}
