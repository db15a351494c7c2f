//! In-memory module store.
//!
//! Records are keyed by technical name. Every mutation, including the
//! uninstall + reinstall pair of a reset and the validation pass of a bulk
//! toggle, happens under a single write-lock acquisition, so readers never see a
//! half-applied change and allocated ids are never duplicated.

use crate::error::{ModuleError, ModuleErrorExt};
use crate::model::{
    MAX_PAGE_SIZE, ModuleFilter, ModuleInfo, ModuleRecord, Page, Pagination, Settings,
    UNASSIGNED_ID,
};
use modhub_domain::config::CatalogEntry;
use parking_lot::RwLock;
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

#[derive(Debug)]
struct RegistryState {
    modules: BTreeMap<String, ModuleRecord>,
    /// Last identity handed out; ids only grow.
    last_id: u64,
}

impl RegistryState {
    fn allocate_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn record(&self, technical_name: &str) -> Result<&ModuleRecord, ModuleError> {
        self.modules.get(technical_name).ok_or_else(|| ModuleError::not_found(technical_name))
    }

    fn record_mut(&mut self, technical_name: &str) -> Result<&mut ModuleRecord, ModuleError> {
        self.modules.get_mut(technical_name).ok_or_else(|| ModuleError::not_found(technical_name))
    }
}

/// Registered modules and their lifecycle state.
#[derive(Debug)]
pub struct ModuleRegistry {
    state: RwLock<RegistryState>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self { state: RwLock::new(RegistryState { modules: BTreeMap::new(), last_id: 0 }) }
    }
}

impl ModuleRegistry {
    /// Seeds a registry from catalog entries, in catalog order.
    ///
    /// # Errors
    /// * [`ModuleError::Version`] for a version that is not semantic versioning text.
    /// * [`ModuleError::Catalog`] for empty or duplicate technical names.
    pub fn from_catalog(catalog: &[CatalogEntry]) -> Result<Self, ModuleError> {
        let registry = Self::default();
        for entry in catalog {
            registry.register(entry)?;
        }
        Ok(registry)
    }

    /// Makes a module known to the registry, installing it when the entry says so.
    ///
    /// # Errors
    /// See [`ModuleRegistry::from_catalog`].
    pub fn register(&self, entry: &CatalogEntry) -> Result<ModuleInfo, ModuleError> {
        let name = entry.technical_name.trim();
        if name.is_empty() {
            return Err(ModuleError::Catalog {
                message: "technical_name cannot be empty".into(),
                context: None,
            });
        }
        let version = Version::parse(entry.version.trim())
            .context(format!("Parsing version of '{name}'"))?;

        let mut state = self.state.write();
        if state.modules.contains_key(name) {
            return Err(ModuleError::Catalog {
                message: format!("Module '{name}' is registered twice").into(),
                context: None,
            });
        }

        let module_id = if entry.installed { state.allocate_id() } else { UNASSIGNED_ID };
        let record = ModuleRecord {
            module_id,
            technical_name: name.to_owned(),
            version,
            enabled: entry.installed && entry.enabled,
            installed: entry.installed,
            settings: entry.settings.clone(),
            default_settings: entry.settings.clone(),
        };
        let info = record.info();
        state.modules.insert(record.technical_name.clone(), record);

        debug!(technical_name = name, module_id, installed = entry.installed, "Module registered");
        Ok(info)
    }

    /// Looks a module up by technical name.
    ///
    /// # Errors
    /// Returns [`ModuleError::NotFound`] for an unknown name.
    pub fn get(&self, technical_name: &str) -> Result<ModuleInfo, ModuleError> {
        self.state.read().record(technical_name).map(ModuleRecord::info)
    }

    /// Current settings of a module.
    ///
    /// # Errors
    /// Returns [`ModuleError::NotFound`] for an unknown name.
    pub fn settings(&self, technical_name: &str) -> Result<Settings, ModuleError> {
        self.state.read().record(technical_name).map(|record| record.settings.clone())
    }

    /// Replaces one setting of an installed module.
    ///
    /// Module-side hook only; no route writes settings.
    ///
    /// # Errors
    /// * [`ModuleError::NotFound`] for an unknown name.
    /// * [`ModuleError::InvalidState`] when the module is not installed.
    #[doc(hidden)]
    pub fn update_setting(
        &self,
        technical_name: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ModuleError> {
        let mut state = self.state.write();
        let record = state.record_mut(technical_name)?;
        if !record.installed {
            return Err(ModuleError::not_installed(technical_name));
        }
        record.settings.insert(key.into(), value.into());
        Ok(())
    }

    /// Filtered listing ordered by module id, then technical name.
    ///
    /// # Errors
    /// Returns [`ModuleError::InvalidInput`] for a limit outside `1..=500`.
    pub fn list(
        &self,
        filter: &ModuleFilter,
        pagination: Pagination,
    ) -> Result<Page<ModuleInfo>, ModuleError> {
        if pagination.limit == 0 || pagination.limit > MAX_PAGE_SIZE {
            return Err(ModuleError::InvalidInput {
                message: format!("limit must be between 1 and {MAX_PAGE_SIZE}").into(),
                context: None,
            });
        }

        let state = self.state.read();
        let mut matching: Vec<&ModuleRecord> =
            state.modules.values().filter(|record| filter.matches(record)).collect();
        matching.sort_by(|a, b| {
            a.module_id.cmp(&b.module_id).then_with(|| a.technical_name.cmp(&b.technical_name))
        });

        let items = matching
            .iter()
            .skip(pagination.offset)
            .take(pagination.limit)
            .map(|record| record.info())
            .collect();

        Ok(Page { total_items: matching.len(), pagination, items })
    }

    /// Sets the enabled flag of one installed module; repeating a value is a no-op.
    ///
    /// # Errors
    /// * [`ModuleError::NotFound`] for an unknown name.
    /// * [`ModuleError::InvalidState`] when the module is not installed.
    #[instrument(skip(self))]
    pub fn set_enabled(
        &self,
        technical_name: &str,
        enabled: bool,
    ) -> Result<ModuleInfo, ModuleError> {
        let mut state = self.state.write();
        let record = state.record_mut(technical_name)?;
        if !record.installed {
            return Err(ModuleError::not_installed(technical_name));
        }

        if record.enabled != enabled {
            record.enabled = enabled;
            info!(module_id = record.module_id, "Module status changed");
        }
        Ok(record.info())
    }

    /// Applies one enabled value to every named module, or to none of them.
    ///
    /// All names are checked before anything changes; duplicates count once.
    ///
    /// # Errors
    /// * [`ModuleError::InvalidInput`] for an empty list.
    /// * [`ModuleError::NotFound`] naming every unknown module.
    /// * [`ModuleError::InvalidState`] naming every module that is not installed.
    #[instrument(skip(self, technical_names), fields(count = technical_names.len()))]
    pub fn set_enabled_bulk(
        &self,
        technical_names: &[String],
        enabled: bool,
    ) -> Result<usize, ModuleError> {
        let names: BTreeSet<&str> = technical_names.iter().map(String::as_str).collect();
        if names.is_empty() {
            return Err(ModuleError::InvalidInput {
                message: "At least one module must be named".into(),
                context: None,
            });
        }

        let mut state = self.state.write();

        let unknown: Vec<&str> =
            names.iter().copied().filter(|name| !state.modules.contains_key(*name)).collect();
        if !unknown.is_empty() {
            return Err(ModuleError::NotFound {
                message: format!("Unknown modules: {}", unknown.join(", ")).into(),
                context: None,
            });
        }

        let not_installed: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| state.modules.get(*name).is_some_and(|record| !record.installed))
            .collect();
        if !not_installed.is_empty() {
            return Err(ModuleError::InvalidState {
                message: format!("Modules not installed: {}", not_installed.join(", ")).into(),
                context: None,
            });
        }

        let mut changed = 0;
        let targets =
            state.modules.values_mut().filter(|r| names.contains(r.technical_name.as_str()));
        for record in targets {
            if record.enabled != enabled {
                record.enabled = enabled;
                changed += 1;
            }
        }
        info!(changed, "Bulk status applied");
        Ok(changed)
    }

    /// Reinstalls an active module: same name and version, enabled, new identity.
    ///
    /// Settings survive only when `keep_data` is set; otherwise the catalog defaults return.
    ///
    /// # Errors
    /// * [`ModuleError::NotFound`] for an unknown name.
    /// * [`ModuleError::InvalidState`] unless the module is installed and enabled.
    #[instrument(skip(self))]
    pub fn reset(&self, technical_name: &str, keep_data: bool) -> Result<ModuleInfo, ModuleError> {
        let mut state = self.state.write();
        let record = state.record(technical_name)?;
        if !(record.installed && record.enabled) {
            return Err(ModuleError::InvalidState {
                message: format!("Module '{technical_name}' must be enabled to be reset").into(),
                context: None,
            });
        }
        let previous_id = record.module_id;

        let data = Self::uninstall_locked(&mut state, technical_name)?;
        let info = Self::install_locked(&mut state, technical_name, keep_data.then_some(data))?;

        info!(previous_id, module_id = info.module_id, keep_data, "Module reset");
        Ok(info)
    }

    /// Installs a registered module with its catalog default settings.
    ///
    /// # Errors
    /// * [`ModuleError::NotFound`] for an unknown name.
    /// * [`ModuleError::InvalidState`] when the module is already installed.
    pub fn install(&self, technical_name: &str) -> Result<ModuleInfo, ModuleError> {
        let mut state = self.state.write();
        if state.record(technical_name)?.installed {
            return Err(ModuleError::InvalidState {
                message: format!("Module '{technical_name}' is already installed").into(),
                context: None,
            });
        }
        Self::install_locked(&mut state, technical_name, None)
    }

    /// Uninstalls a module, releasing its identity; it stays registered.
    ///
    /// # Errors
    /// * [`ModuleError::NotFound`] for an unknown name.
    /// * [`ModuleError::InvalidState`] when the module is not installed.
    pub fn uninstall(&self, technical_name: &str) -> Result<ModuleInfo, ModuleError> {
        let mut state = self.state.write();
        Self::uninstall_locked(&mut state, technical_name)?;
        state.record(technical_name).map(ModuleRecord::info)
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the settings the module held.
    fn uninstall_locked(
        state: &mut RegistryState,
        technical_name: &str,
    ) -> Result<Settings, ModuleError> {
        let record = state.record_mut(technical_name)?;
        if !record.installed {
            return Err(ModuleError::not_installed(technical_name));
        }

        record.installed = false;
        record.enabled = false;
        record.module_id = UNASSIGNED_ID;
        let data = std::mem::take(&mut record.settings);

        debug!(technical_name, "Module uninstalled");
        Ok(data)
    }

    fn install_locked(
        state: &mut RegistryState,
        technical_name: &str,
        data: Option<Settings>,
    ) -> Result<ModuleInfo, ModuleError> {
        let module_id = state.allocate_id();
        let record = state.record_mut(technical_name)?;

        record.module_id = module_id;
        record.installed = true;
        record.enabled = true;
        record.settings = data.unwrap_or_else(|| record.default_settings.clone());

        debug!(technical_name, module_id, "Module installed");
        Ok(record.info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, version: &str, installed: bool, enabled: bool) -> CatalogEntry {
        CatalogEntry {
            technical_name: name.to_owned(),
            version: version.to_owned(),
            installed,
            enabled,
            settings: Settings::from([("mode".to_owned(), "default".to_owned())]),
        }
    }

    fn registry() -> ModuleRegistry {
        ModuleRegistry::from_catalog(&[
            entry("ps_apiresources", "0.1.0", true, true),
            entry("ps_banner", "2.1.2", true, false),
            entry("ps_legacy", "1.0.0-beta.1", false, false),
        ])
        .expect("catalog")
    }

    #[test]
    fn catalog_assigns_ids_to_installed_modules_only() {
        let registry = registry();
        assert_eq!(registry.get("ps_apiresources").expect("module").module_id, 1);
        assert_eq!(registry.get("ps_banner").expect("module").module_id, 2);

        let legacy = registry.get("ps_legacy").expect("module");
        assert_eq!(legacy.module_id, UNASSIGNED_ID);
        assert!(!legacy.installed && !legacy.enabled);
    }

    #[test]
    fn catalog_rejects_bad_versions_and_duplicates() {
        let bad = ModuleRegistry::from_catalog(&[entry("ps_x", "1.0", true, true)]);
        assert!(matches!(bad, Err(ModuleError::Version { .. })));

        let twice = ModuleRegistry::from_catalog(&[
            entry("ps_x", "1.0.0", true, true),
            entry("ps_x", "1.0.1", true, true),
        ]);
        assert!(matches!(twice, Err(ModuleError::Catalog { .. })));
    }

    #[test]
    fn toggling_is_idempotent() {
        let registry = registry();
        let first = registry.set_enabled("ps_apiresources", false).expect("disable");
        let second = registry.set_enabled("ps_apiresources", false).expect("disable again");
        assert_eq!(first, second);
        assert!(!second.enabled);
    }

    #[test]
    fn toggling_requires_known_installed_module() {
        let registry = registry();
        assert!(matches!(
            registry.set_enabled("ps_missing", true),
            Err(ModuleError::NotFound { .. })
        ));
        assert!(matches!(
            registry.set_enabled("ps_legacy", true),
            Err(ModuleError::InvalidState { .. })
        ));
    }

    #[test]
    fn list_filters_orders_and_pages() {
        let registry = registry();
        let all = registry.list(&ModuleFilter::default(), Pagination::default()).expect("list");
        assert_eq!(all.total_items, 3);
        let names: Vec<_> = all.items.iter().map(|m| m.technical_name.as_str()).collect();
        assert_eq!(names, ["ps_legacy", "ps_apiresources", "ps_banner"]);

        let disabled = ModuleFilter { enabled: Some(false), ..ModuleFilter::default() };
        let page = registry.list(&disabled, Pagination { limit: 1, offset: 1 }).expect("list");
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].technical_name, "ps_banner");

        let by_name = ModuleFilter {
            technical_name: Some("ps_banner".to_owned()),
            installed: Some(true),
            ..ModuleFilter::default()
        };
        assert_eq!(registry.list(&by_name, Pagination::default()).expect("list").total_items, 1);
    }

    #[test]
    fn list_rejects_out_of_range_limits() {
        let registry = registry();
        for limit in [0, MAX_PAGE_SIZE + 1] {
            let result = registry.list(&ModuleFilter::default(), Pagination { limit, offset: 0 });
            assert!(matches!(result, Err(ModuleError::InvalidInput { .. })));
        }
    }

    #[test]
    fn bulk_is_all_or_nothing() {
        let registry = registry();
        let names = vec!["ps_apiresources".to_owned(), "ps_missing".to_owned()];
        let err = registry.set_enabled_bulk(&names, false).expect_err("unknown name");
        assert!(err.to_string().contains("ps_missing"));
        assert!(registry.get("ps_apiresources").expect("module").enabled);

        let names = vec!["ps_apiresources".to_owned(), "ps_legacy".to_owned()];
        assert!(matches!(
            registry.set_enabled_bulk(&names, false),
            Err(ModuleError::InvalidState { .. })
        ));
        assert!(registry.get("ps_apiresources").expect("module").enabled);

        assert!(matches!(
            registry.set_enabled_bulk(&[], true),
            Err(ModuleError::InvalidInput { .. })
        ));
    }

    #[test]
    fn bulk_applies_duplicates_once() {
        let registry = registry();
        let names =
            vec!["ps_banner".to_owned(), "ps_banner".to_owned(), "ps_apiresources".to_owned()];
        assert_eq!(registry.set_enabled_bulk(&names, true).expect("bulk"), 1);
        assert!(registry.get("ps_banner").expect("module").enabled);
    }

    #[test]
    fn reset_reallocates_identity() {
        let registry = registry();
        let before = registry.get("ps_apiresources").expect("module");
        let after = registry.reset("ps_apiresources", false).expect("reset");

        assert_ne!(after.module_id, before.module_id);
        assert!(after.module_id > 2);
        assert_eq!(after.technical_name, before.technical_name);
        assert_eq!(after.version, before.version);
        assert!(after.is_active());

        let again = registry.reset("ps_apiresources", false).expect("reset");
        assert!(again.module_id > after.module_id);
    }

    #[test]
    fn concurrent_resets_never_share_an_id() {
        let registry = ModuleRegistry::from_catalog(&[
            entry("ps_apiresources", "0.1.0", true, true),
            entry("ps_banner", "2.1.2", true, true),
            entry("ps_carousel", "3.0.1", true, true),
        ])
        .expect("catalog");
        let names = ["ps_apiresources", "ps_banner", "ps_carousel"];

        let ids: Vec<u64> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..6)
                .map(|worker| {
                    let registry = &registry;
                    let name = names[worker % names.len()];
                    let keep_data = worker % 2 == 0;
                    scope.spawn(move || {
                        (0..50)
                            .map(|_| registry.reset(name, keep_data).expect("reset").module_id)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers.into_iter().flat_map(|w| w.join().expect("worker")).collect()
        });

        let distinct: BTreeSet<u64> = ids.iter().copied().collect();
        assert_eq!(distinct.len(), ids.len());
        assert_eq!(ids.len(), 300);
        assert!(distinct.iter().all(|id| *id > 3));
    }

    #[test]
    fn readers_never_see_half_a_bulk_toggle() {
        let registry = ModuleRegistry::from_catalog(&[
            entry("ps_apiresources", "0.1.0", true, true),
            entry("ps_banner", "2.1.2", true, true),
        ])
        .expect("catalog");
        let names = vec!["ps_apiresources".to_owned(), "ps_banner".to_owned()];

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..200 {
                    registry.set_enabled_bulk(&names, round % 2 == 1).expect("bulk");
                }
            });
            for _ in 0..2 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let page = registry
                            .list(&ModuleFilter::default(), Pagination::default())
                            .expect("list");
                        assert_eq!(page.items[0].enabled, page.items[1].enabled);
                    }
                });
            }
        });
    }

    #[test]
    fn reset_requires_active_module() {
        let registry = registry();
        let disabled = registry.reset("ps_banner", false);
        assert!(matches!(disabled, Err(ModuleError::InvalidState { .. })));
        let not_installed = registry.reset("ps_legacy", true);
        assert!(matches!(not_installed, Err(ModuleError::InvalidState { .. })));
        let unknown = registry.reset("ps_missing", false);
        assert!(matches!(unknown, Err(ModuleError::NotFound { .. })));
        assert_eq!(registry.get("ps_banner").expect("module").module_id, 2);
    }

    #[test]
    fn reset_keep_data_controls_settings() {
        let registry = registry();
        registry.update_setting("ps_apiresources", "mode", "custom").expect("update");

        registry.reset("ps_apiresources", true).expect("reset");
        assert_eq!(registry.settings("ps_apiresources").expect("settings")["mode"], "custom");

        registry.reset("ps_apiresources", false).expect("reset");
        assert_eq!(registry.settings("ps_apiresources").expect("settings")["mode"], "default");
    }

    #[test]
    fn settings_need_an_installed_module() {
        let registry = registry();
        assert!(matches!(
            registry.update_setting("ps_legacy", "mode", "custom"),
            Err(ModuleError::InvalidState { .. })
        ));
        assert!(matches!(
            registry.update_setting("ps_missing", "mode", "custom"),
            Err(ModuleError::NotFound { .. })
        ));
        assert_eq!(registry.settings("ps_legacy").expect("settings")["mode"], "default");
    }

    #[test]
    fn install_and_uninstall_round_the_lifecycle() {
        let registry = registry();
        let installed = registry.install("ps_legacy").expect("install");
        assert!(installed.is_active());
        assert_eq!(installed.module_id, 3);
        assert!(registry.install("ps_legacy").is_err());

        let removed = registry.uninstall("ps_legacy").expect("uninstall");
        assert_eq!(removed.module_id, UNASSIGNED_ID);
        assert!(!removed.installed && !removed.enabled);
        assert!(registry.uninstall("ps_legacy").is_err());

        assert_eq!(registry.install("ps_legacy").expect("install").module_id, 4);
    }
}
