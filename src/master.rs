//! Two-tier master/local configuration store
//!
//! [`MasterIni`] stacks two [`Ini`] stores. The master layer carries
//! site-wide settings and the construction-time defaults; the local layer
//! carries per-host overrides. Reads consult local first and fall back to
//! master per option, so a local section can override a single value while
//! the rest of the section still comes from master. Every mutation and
//! [`MasterIni::write_to`] touch the local layer alone, which keeps the
//! master file safe to regenerate from a central source.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};

use crate::error::IniError;
use crate::ini::{Ini, OptionTransform, DEFAULT_SECTION};

/// Marker key some serializers inject to carry a section's own name;
/// never reported as a real option.
const SECTION_NAME_KEY: &str = "__name__";

/// Which of the two stores a load targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Master,
    Local,
}

/// A layered configuration: a read-only master store under a mutable
/// local store.
///
/// Both stores are public for callers that need layer-exact access (for
/// example, inspecting which layer supplied a value). Writing to `master`
/// directly bypasses the local-only mutation contract; the methods on
/// `MasterIni` never do.
#[derive(Debug, Clone)]
pub struct MasterIni {
    pub master: Ini,
    pub local: Ini,
}

impl MasterIni {
    /// Create an empty store. Both layers share one key-normalization
    /// function (lowercasing until replaced).
    pub fn new() -> Self {
        Self::from_master(Ini::new())
    }

    /// Create a store whose master layer is seeded with defaults. The
    /// local layer starts empty; it holds overrides, not defaults.
    pub fn with_defaults<K, V, I>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_master(Ini::with_defaults(defaults))
    }

    fn from_master(master: Ini) -> Self {
        let mut local = Ini::new();
        local.set_optionxform(master.optionxform().clone());
        MasterIni { master, local }
    }

    fn store_mut(&mut self, layer: Layer) -> &mut Ini {
        match layer {
            Layer::Master => &mut self.master,
            Layer::Local => &mut self.local,
        }
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Read and parse each named file into the given layer. Files that
    /// cannot be read are skipped; the returned list names the files
    /// actually parsed.
    pub fn read<P: AsRef<Path>>(
        &mut self,
        filenames: &[P],
        layer: Layer,
    ) -> Result<Vec<PathBuf>, IniError> {
        self.store_mut(layer).read(filenames)
    }

    /// Parse one stream into the given layer. Unlike [`MasterIni::read`],
    /// the layer is an explicit `Option`: passing `None` fails with
    /// `InvalidArgument` before either store is touched, so a caller that
    /// plumbed no layer through cannot silently corrupt one.
    pub fn read_from<R: Read>(
        &mut self,
        reader: R,
        source_name: Option<&str>,
        layer: Option<Layer>,
    ) -> Result<(), IniError> {
        let layer = layer.ok_or_else(|| {
            IniError::InvalidArgument("stream load requires a target layer".to_string())
        })?;
        self.store_mut(layer).read_from(reader, source_name)
    }

    /// Parse a string into the given layer.
    pub fn read_string(&mut self, data: &str, layer: Layer) -> Result<(), IniError> {
        self.store_mut(layer).read_string(data)
    }

    // ------------------------------------------------------------------
    // Merged reads
    // ------------------------------------------------------------------

    /// The defaults map. Defaults live in the master layer; local
    /// defaults, if a local file carried a `[DEFAULT]` block, are not
    /// reported here.
    pub fn defaults(&self) -> &IndexMap<String, String> {
        self.master.defaults()
    }

    /// Section names across both layers, local layer's order first,
    /// without duplicates.
    pub fn sections(&self) -> Vec<String> {
        let mut names: IndexSet<String> = IndexSet::new();
        names.extend(self.local.sections());
        names.extend(self.master.sections());
        names.into_iter().collect()
    }

    /// Whether either layer has the named section.
    pub fn has_section(&self, section: &str) -> bool {
        self.local.has_section(section) || self.master.has_section(section)
    }

    /// Option names visible in the section across both layers, local
    /// layer's first, without duplicates. Fails with `NoSection` only
    /// when neither layer has the section.
    pub fn options(&self, section: &str) -> Result<Vec<String>, IniError> {
        match (self.local.options(section), self.master.options(section)) {
            (Err(_), Err(err)) => Err(err),
            (local, master) => {
                let mut names: IndexSet<String> = IndexSet::new();
                names.extend(local.unwrap_or_default());
                names.extend(master.unwrap_or_default());
                Ok(names.into_iter().collect())
            }
        }
    }

    /// Look up one value: the local layer's answer if it has one, else
    /// the master layer's. Each layer resolves against its own defaults,
    /// so a master-only option shows through a local section that does
    /// not shadow it.
    pub fn get(&self, section: &str, option: &str) -> Result<&str, IniError> {
        match self.local.get(section, option) {
            Ok(value) => Ok(value),
            Err(IniError::NoSection { .. } | IniError::NoOption { .. }) => {
                self.master.get(section, option)
            }
            Err(err) => Err(err),
        }
    }

    /// Whether the option is visible in the section through either layer.
    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.local.has_option(section, option) || self.master.has_option(section, option)
    }

    /// The full merged view of one section: master defaults, overlaid
    /// with the master section's own entries, overlaid with the local
    /// section's own entries. Local defaults do not participate. Fails
    /// with `NoSection` only when neither layer has the section and it is
    /// not `DEFAULT`.
    pub fn items(&self, section: &str) -> Result<IndexMap<String, String>, IniError> {
        let mut merged = self.master.defaults().clone();
        let mut found = section == DEFAULT_SECTION;
        if let Some(entries) = self.master.section(section) {
            merged.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
            found = true;
        }
        if let Some(entries) = self.local.section(section) {
            merged.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
            found = true;
        }
        if !found {
            return Err(IniError::NoSection {
                section: section.to_string(),
            });
        }
        merged.shift_remove(SECTION_NAME_KEY);
        Ok(merged)
    }

    // ------------------------------------------------------------------
    // Key normalization
    // ------------------------------------------------------------------

    /// The key-normalization function both layers share.
    pub fn optionxform(&self) -> &OptionTransform {
        self.master.optionxform()
    }

    /// Replace the key-normalization function on both layers at once, so
    /// a lookup never normalizes differently per layer. Entries already
    /// stored keep the keys they were stored under.
    pub fn set_optionxform(&mut self, f: OptionTransform) {
        self.master.set_optionxform(f.clone());
        self.local.set_optionxform(f);
    }

    // ------------------------------------------------------------------
    // Local-layer mutations
    // ------------------------------------------------------------------

    /// Create a section in the local layer. A master-only section is not
    /// an obstacle: adding it locally is how overrides for it start.
    pub fn add_section(&mut self, section: &str) -> Result<(), IniError> {
        self.local.add_section(section)
    }

    /// Set one option in the local layer. The section must exist locally
    /// (`DEFAULT` aside); a section only the master layer has must be
    /// added with [`MasterIni::add_section`] first.
    pub fn set(&mut self, section: &str, option: &str, value: &str) -> Result<(), IniError> {
        self.local.set(section, option, value)
    }

    /// Remove one option from the local layer; true if it existed there.
    /// A master entry of the same name is untouched and becomes visible
    /// again.
    pub fn remove_option(&mut self, section: &str, option: &str) -> Result<bool, IniError> {
        self.local.remove_option(section, option)
    }

    /// Remove a section from the local layer; true if it existed there.
    pub fn remove_section(&mut self, section: &str) -> bool {
        self.local.remove_section(section)
    }

    /// Write the local layer in INI syntax. The master layer is never
    /// serialized here; it belongs to whatever distributes the master
    /// file.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.local.write_to(w)
    }
}

impl Default for MasterIni {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const MASTER: &str = "\
[DEFAULT]
retries = 3

[db]
host = master.example.org
port = 5432

[web]
root = /srv
";

    const LOCAL: &str = "\
[db]
host = localhost
";

    fn sample() -> MasterIni {
        let mut config = MasterIni::new();
        config.read_string(MASTER, Layer::Master).unwrap();
        config.read_string(LOCAL, Layer::Local).unwrap();
        config
    }

    #[test]
    fn test_get_prefers_local_and_falls_back_per_option() {
        let config = sample();

        assert_eq!(config.get("db", "host").unwrap(), "localhost");
        assert_eq!(config.get("db", "port").unwrap(), "5432");
        assert_eq!(config.get("web", "root").unwrap(), "/srv");
        assert_eq!(config.get("db", "retries").unwrap(), "3");
    }

    #[test]
    fn test_get_missing_reports_master_side_error() {
        let config = sample();

        assert!(matches!(
            config.get("nope", "x"),
            Err(IniError::NoSection { .. })
        ));
        assert!(matches!(
            config.get("db", "user"),
            Err(IniError::NoOption { .. })
        ));
    }

    #[test]
    fn test_sections_and_has_section_union_layers() {
        let mut config = sample();
        config.add_section("cache").unwrap();

        assert_eq!(config.sections(), vec!["db", "cache", "web"]);
        assert!(config.has_section("cache"));
        assert!(config.has_section("web"));
        assert!(!config.has_section("nope"));
        assert!(!config.has_section(DEFAULT_SECTION));
    }

    #[test]
    fn test_options_union_covers_master_only_entries() {
        let config = sample();

        // db exists in both layers: union without duplicates, plus the
        // master defaults.
        assert_eq!(config.options("db").unwrap(), vec!["host", "port", "retries"]);
        // web exists only in master.
        assert_eq!(config.options("web").unwrap(), vec!["root", "retries"]);
    }

    #[test]
    fn test_options_local_only_section_and_both_missing() {
        let mut config = sample();
        config.add_section("cache").unwrap();
        config.set("cache", "size", "64").unwrap();

        assert_eq!(config.options("cache").unwrap(), vec!["size"]);
        assert!(matches!(
            config.options("nope"),
            Err(IniError::NoSection { .. })
        ));
    }

    #[test]
    fn test_has_option_sees_both_layers() {
        let config = sample();

        assert!(config.has_option("db", "host"));
        assert!(config.has_option("db", "port"));
        // The shared transform normalizes the probe the same way in
        // both layers.
        assert!(config.has_option("db", "HOST"));
        assert!(config.has_option("web", "root"));
        assert!(config.has_option("web", "retries"));
        assert!(!config.has_option("web", "port"));
        assert!(!config.has_option("nope", "x"));
    }

    #[test]
    fn test_items_merges_defaults_master_then_local() {
        let config = sample();
        let items = config.items("db").unwrap();

        let pairs: Vec<(&str, &str)> = items
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("retries", "3"),
                ("host", "localhost"),
                ("port", "5432"),
            ]
        );
        // No intervening mutation: a second call answers the same.
        assert_eq!(config.items("db").unwrap(), items);
    }

    #[test]
    fn test_items_ignores_local_defaults() {
        let mut config = sample();
        config
            .read_string("[DEFAULT]\nscratch = /tmp\n", Layer::Local)
            .unwrap();

        assert!(!config.items("db").unwrap().contains_key("scratch"));
        assert!(!config.defaults().contains_key("scratch"));
        // The local layer still resolves through its own defaults on get.
        assert_eq!(config.get("db", "scratch").unwrap(), "/tmp");
    }

    #[test]
    fn test_items_default_section_never_missing() {
        let config = MasterIni::new();

        assert!(config.items(DEFAULT_SECTION).unwrap().is_empty());
        assert!(matches!(
            config.items("nope"),
            Err(IniError::NoSection { .. })
        ));
    }

    #[test]
    fn test_items_strips_section_name_marker() {
        let mut config = sample();
        config
            .read_string("[db]\n__name__ = db\n", Layer::Master)
            .unwrap();

        assert!(!config.items("db").unwrap().contains_key(SECTION_NAME_KEY));
    }

    #[test]
    fn test_mutations_touch_local_only() {
        let mut config = sample();

        // web exists only in master, so set refuses until the local
        // section exists.
        assert!(matches!(
            config.set("web", "root", "/data"),
            Err(IniError::NoSection { .. })
        ));
        config.add_section("web").unwrap();
        config.set("web", "root", "/data").unwrap();

        assert_eq!(config.get("web", "root").unwrap(), "/data");
        assert_eq!(config.master.get("web", "root").unwrap(), "/srv");
    }

    #[test]
    fn test_local_only_section_stays_invisible_to_master() {
        let mut config = sample();

        config.add_section("cache").unwrap();
        config.set("cache", "ttl", "60").unwrap();

        assert!(config.has_section("cache"));
        assert_eq!(config.get("cache", "ttl").unwrap(), "60");
        assert!(!config.master.has_section("cache"));
    }

    #[test]
    fn test_remove_option_uncovers_master_value() {
        let mut config = sample();

        assert!(config.remove_option("db", "host").unwrap());
        assert_eq!(config.get("db", "host").unwrap(), "master.example.org");
        assert!(!config.remove_option("db", "host").unwrap());
    }

    #[test]
    fn test_remove_section_leaves_master_visible() {
        let mut config = sample();

        assert!(config.remove_section("db"));
        assert!(!config.remove_section("db"));
        assert!(config.has_section("db"));
        assert_eq!(config.get("db", "host").unwrap(), "master.example.org");
    }

    #[test]
    fn test_remove_section_missing_locally_reports_false() {
        let mut config = sample();

        // web lives only in master.
        assert!(!config.remove_section("web"));
        assert!(config.has_section("web"));
    }

    #[test]
    fn test_write_serializes_local_layer_only() {
        let mut config = sample();
        config.add_section("web").unwrap();
        config.set("web", "root", "/data").unwrap();

        let mut out = Vec::new();
        config.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("[db]\nhost = localhost\n"));
        assert!(text.contains("[web]\nroot = /data\n"));
        assert!(!text.contains("port"));
        assert!(!text.contains("retries"));
    }

    #[test]
    fn test_layers_share_one_transform() {
        let mut config = MasterIni::new();
        assert!(Arc::ptr_eq(
            config.master.optionxform(),
            config.local.optionxform()
        ));

        config.set_optionxform(Arc::new(|option: &str| option.to_string()));
        assert!(Arc::ptr_eq(
            config.master.optionxform(),
            config.local.optionxform()
        ));
    }

    #[test]
    fn test_case_sensitive_transform_applies_to_both_layers() {
        let mut config = MasterIni::new();
        config.set_optionxform(Arc::new(|option: &str| option.to_string()));
        config
            .read_string("[db]\nHost = master.example.org\n", Layer::Master)
            .unwrap();
        config.read_string("[db]\nHost = localhost\n", Layer::Local)
            .unwrap();

        assert_eq!(config.get("db", "Host").unwrap(), "localhost");
        assert!(matches!(
            config.get("db", "host"),
            Err(IniError::NoOption { .. })
        ));
    }

    #[test]
    fn test_transform_change_keeps_stored_keys() {
        let mut config = sample();
        config.set_optionxform(Arc::new(|option: &str| option.to_string()));

        // Stored under lowercase keys before the change.
        assert_eq!(config.get("db", "host").unwrap(), "localhost");
        assert!(matches!(
            config.get("db", "Host"),
            Err(IniError::NoOption { .. })
        ));
    }

    #[test]
    fn test_read_from_requires_a_layer() {
        let mut config = MasterIni::new();
        let err = config
            .read_from("[db]\nhost = x\n".as_bytes(), None, None)
            .unwrap_err();

        assert!(matches!(err, IniError::InvalidArgument(_)));
        assert!(config.master.sections().is_empty());
        assert!(config.local.sections().is_empty());
    }

    #[test]
    fn test_read_from_targets_the_given_layer() {
        let mut config = MasterIni::new();
        config
            .read_from("[db]\nhost = x\n".as_bytes(), None, Some(Layer::Local))
            .unwrap();

        assert!(config.master.sections().is_empty());
        assert_eq!(config.local.sections(), vec!["db"]);
    }

    #[test]
    fn test_with_defaults_seeds_master_layer() {
        let config = MasterIni::with_defaults([("Retries", "3")]);

        assert_eq!(config.defaults().get("retries").map(String::as_str), Some("3"));
        assert!(config.local.defaults().is_empty());
        assert_eq!(config.get("db", "retries").ok(), None);
        assert_eq!(config.get(DEFAULT_SECTION, "retries").unwrap(), "3");
    }
}
