//! Single-layer INI store
//!
//! [`Ini`] holds one parsed configuration: named sections of ordered
//! option/value pairs plus the `DEFAULT` pseudo-section, whose entries are
//! visible through every other section on reads. Option names are
//! normalized by a pluggable transform (lowercasing unless replaced);
//! section names are case-sensitive and never transformed.
//!
//! This is the store [`MasterIni`](crate::master::MasterIni) composes two
//! of. It can also be used on its own as a flat configuration file.

mod parse;

use std::fmt;
use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::IniError;

/// Name of the defaults pseudo-section. `[DEFAULT]` blocks parse into the
/// defaults map and never appear in [`Ini::sections`].
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Key-normalization function applied to option names before storage and
/// lookup.
pub type OptionTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

fn default_transform() -> OptionTransform {
    Arc::new(|option: &str| option.to_lowercase())
}

/// A single-layer INI configuration store.
#[derive(Clone)]
pub struct Ini {
    defaults: IndexMap<String, String>,
    sections: IndexMap<String, IndexMap<String, String>>,
    optionxform: OptionTransform,
}

impl Ini {
    /// Create an empty store with the default (lowercasing) transform.
    pub fn new() -> Self {
        Ini {
            defaults: IndexMap::new(),
            sections: IndexMap::new(),
            optionxform: default_transform(),
        }
    }

    /// Create a store seeded with defaults. Keys pass through the
    /// transform on insertion.
    pub fn with_defaults<K, V, I>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut ini = Ini::new();
        for (key, value) in defaults {
            let key = ini.xform(key.as_ref());
            ini.defaults.insert(key, value.into());
        }
        ini
    }

    /// The current key-normalization function.
    pub fn optionxform(&self) -> &OptionTransform {
        &self.optionxform
    }

    /// Replace the key-normalization function. Applies to subsequent
    /// operations only; entries already stored keep the keys they were
    /// stored under.
    pub fn set_optionxform(&mut self, f: OptionTransform) {
        self.optionxform = f;
    }

    fn xform(&self, option: &str) -> String {
        (self.optionxform)(option)
    }

    // ------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------

    /// Read and parse each named file, accumulating into this store.
    /// Files that cannot be read are skipped; the returned list names the
    /// files actually parsed. A file with invalid syntax aborts the whole
    /// call with a parse error.
    pub fn read<P: AsRef<Path>>(&mut self, filenames: &[P]) -> Result<Vec<PathBuf>, IniError> {
        let mut parsed = Vec::new();
        for filename in filenames {
            let path = filename.as_ref();
            let contents = match fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(_) => continue,
            };
            parse::read_into(self, contents.as_bytes(), &path.display().to_string())?;
            parsed.push(path.to_path_buf());
        }
        Ok(parsed)
    }

    /// Parse one stream into this store. `source_name` labels parse
    /// errors; it defaults to `<stream>`.
    pub fn read_from<R: Read>(
        &mut self,
        reader: R,
        source_name: Option<&str>,
    ) -> Result<(), IniError> {
        let name = source_name.unwrap_or("<stream>");
        parse::read_into(self, BufReader::new(reader), name)
    }

    /// Parse a string into this store.
    pub fn read_string(&mut self, data: &str) -> Result<(), IniError> {
        parse::read_into(self, data.as_bytes(), "<string>")
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The defaults map.
    pub fn defaults(&self) -> &IndexMap<String, String> {
        &self.defaults
    }

    /// Section names in insertion order. `DEFAULT` is not a section.
    pub fn sections(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    /// Whether the named section exists. False for `DEFAULT`.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Raw view of one section's own entries, without defaults folded in.
    /// None if the section does not exist; `DEFAULT` has no raw section.
    pub fn section(&self, name: &str) -> Option<&IndexMap<String, String>> {
        self.sections.get(name)
    }

    /// Option names available in the section: its own entries followed by
    /// defaults it does not shadow. Fails with `NoSection` if the section
    /// does not exist (`DEFAULT` included).
    pub fn options(&self, section: &str) -> Result<Vec<String>, IniError> {
        let entries = self.sections.get(section).ok_or_else(|| IniError::NoSection {
            section: section.to_string(),
        })?;
        let mut names: Vec<String> = entries.keys().cloned().collect();
        for key in self.defaults.keys() {
            if !entries.contains_key(key) {
                names.push(key.clone());
            }
        }
        Ok(names)
    }

    /// Look up one value: the section's own entry for the normalized
    /// option name, else the defaults entry. `get(DEFAULT, ..)` consults
    /// the defaults alone.
    pub fn get(&self, section: &str, option: &str) -> Result<&str, IniError> {
        let key = self.xform(option);
        let entries = if section == DEFAULT_SECTION {
            None
        } else {
            Some(self.sections.get(section).ok_or_else(|| IniError::NoSection {
                section: section.to_string(),
            })?)
        };
        entries
            .and_then(|map| map.get(&key))
            .or_else(|| self.defaults.get(&key))
            .map(String::as_str)
            .ok_or(IniError::NoOption {
                section: section.to_string(),
                option: key,
            })
    }

    /// Whether the normalized option is visible in the section, directly
    /// or via defaults. A missing section is simply false, never an error;
    /// `DEFAULT` (or an empty section name) consults the defaults map.
    pub fn has_option(&self, section: &str, option: &str) -> bool {
        let key = self.xform(option);
        if section.is_empty() || section == DEFAULT_SECTION {
            return self.defaults.contains_key(&key);
        }
        match self.sections.get(section) {
            Some(entries) => entries.contains_key(&key) || self.defaults.contains_key(&key),
            None => false,
        }
    }

    /// The full view of one section: defaults overlaid with the section's
    /// own entries. `items(DEFAULT)` is the defaults alone.
    pub fn items(&self, section: &str) -> Result<IndexMap<String, String>, IniError> {
        let mut merged = self.defaults.clone();
        if let Some(entries) = self.sections.get(section) {
            merged.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        } else if section != DEFAULT_SECTION {
            return Err(IniError::NoSection {
                section: section.to_string(),
            });
        }
        Ok(merged)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a new empty section. The reserved `DEFAULT` name (any
    /// character case) is rejected with `InvalidArgument`.
    pub fn add_section(&mut self, section: &str) -> Result<(), IniError> {
        if section.eq_ignore_ascii_case(DEFAULT_SECTION) {
            return Err(IniError::InvalidArgument(format!(
                "invalid section name: '{section}'"
            )));
        }
        if self.sections.contains_key(section) {
            return Err(IniError::DuplicateSection {
                section: section.to_string(),
            });
        }
        self.sections.insert(section.to_string(), IndexMap::new());
        Ok(())
    }

    /// Set one option (name normalized) in the section, or in the
    /// defaults when the section is `DEFAULT`.
    pub fn set(&mut self, section: &str, option: &str, value: &str) -> Result<(), IniError> {
        let key = self.xform(option);
        let entries = if section == DEFAULT_SECTION {
            &mut self.defaults
        } else {
            self.sections.get_mut(section).ok_or_else(|| IniError::NoSection {
                section: section.to_string(),
            })?
        };
        entries.insert(key, value.to_string());
        Ok(())
    }

    /// Remove one option (name normalized); true if it existed. `DEFAULT`
    /// targets the defaults map.
    pub fn remove_option(&mut self, section: &str, option: &str) -> Result<bool, IniError> {
        let key = self.xform(option);
        let entries = if section == DEFAULT_SECTION {
            &mut self.defaults
        } else {
            self.sections.get_mut(section).ok_or_else(|| IniError::NoSection {
                section: section.to_string(),
            })?
        };
        Ok(entries.shift_remove(&key).is_some())
    }

    /// Remove a whole section; true if it existed. `DEFAULT` is never a
    /// section, so removing it reports false.
    pub fn remove_section(&mut self, section: &str) -> bool {
        self.sections.shift_remove(section).is_some()
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Write the store in INI syntax: the `[DEFAULT]` block first when
    /// non-empty, then each section in order. Values with embedded
    /// newlines are written as tab-indented continuation lines, so the
    /// output parses back to an equivalent store.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if !self.defaults.is_empty() {
            writeln!(w, "[{DEFAULT_SECTION}]")?;
            for (key, value) in &self.defaults {
                writeln!(w, "{} = {}", key, value.replace('\n', "\n\t"))?;
            }
            writeln!(w)?;
        }
        for (name, entries) in &self.sections {
            writeln!(w, "[{name}]")?;
            for (key, value) in entries {
                writeln!(w, "{} = {}", key, value.replace('\n', "\n\t"))?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

impl Default for Ini {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ini")
            .field("defaults", &self.defaults)
            .field("sections", &self.sections)
            .finish_non_exhaustive()
    }
}
