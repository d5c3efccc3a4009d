//! INI text parser
//!
//! Parses INI-style configuration text into an [`Ini`] store. Handles the
//! classic dialect:
//! - `[section]` headers; `[DEFAULT]` feeds the defaults map
//! - `option = value` and `option: value` lines
//! - full-line comments starting with `#` or `;` in column 0
//! - indented lines continue the previous option's value
//! - an inline `;` terminates a value only when preceded by whitespace
//! - a value of `""` (two double quotes exactly) means the empty string
//!
//! Option names pass through the store's key-normalization function before
//! insertion; section names are taken verbatim.

use std::io::BufRead;

use indexmap::IndexMap;

use super::{Ini, DEFAULT_SECTION};
use crate::error::IniError;

/// Where parsed options are currently being written.
enum Target {
    Defaults,
    Section(String),
}

/// Parse `reader` into `ini`, accumulating on top of whatever it already
/// holds. `source_name` labels parse errors.
pub(super) fn read_into<R: BufRead>(
    ini: &mut Ini,
    reader: R,
    source_name: &str,
) -> Result<(), IniError> {
    let mut cur: Option<Target> = None;
    let mut cur_opt: Option<String> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;

        let first = match line.chars().next() {
            Some(c) => c,
            None => continue,
        };
        if first == '#' || first == ';' || line.trim().is_empty() {
            continue;
        }

        // An indented non-blank line extends the previous option's value.
        if first.is_whitespace() {
            match (&cur, &cur_opt) {
                (Some(target), Some(option)) => {
                    let text = line.trim();
                    if !text.is_empty() {
                        let map = target_map(ini, target);
                        if let Some(value) = map.get_mut(option) {
                            value.push('\n');
                            value.push_str(text);
                        }
                    }
                    continue;
                }
                (None, _) => {
                    return Err(IniError::MissingSectionHeader {
                        source_name: source_name.to_string(),
                        line: lineno,
                        text: line.trim().to_string(),
                    });
                }
                (Some(_), None) => {
                    return Err(IniError::Parse {
                        source_name: source_name.to_string(),
                        line: lineno,
                        text: line.trim().to_string(),
                    });
                }
            }
        }

        // Section header. A header for an existing section keeps
        // accumulating into the same map.
        if let Some(name) = section_header(&line) {
            if name == DEFAULT_SECTION {
                cur = Some(Target::Defaults);
            } else {
                ini.sections.entry(name.to_string()).or_default();
                cur = Some(Target::Section(name.to_string()));
            }
            cur_opt = None;
            continue;
        }

        let target = match &cur {
            Some(target) => target,
            None => {
                return Err(IniError::MissingSectionHeader {
                    source_name: source_name.to_string(),
                    line: lineno,
                    text: line.trim().to_string(),
                });
            }
        };

        // Option line: name, separator, value.
        let sep = match line.find(|c| c == '=' || c == ':') {
            Some(pos) if pos > 0 => pos,
            _ => {
                return Err(IniError::Parse {
                    source_name: source_name.to_string(),
                    line: lineno,
                    text: line.trim().to_string(),
                });
            }
        };

        let option = ini.xform(line[..sep].trim_end());
        let mut value = line[sep + 1..].trim_start();
        if let Some(pos) = value.find(';') {
            if pos > 0 && value[..pos].ends_with(|c: char| c.is_whitespace()) {
                value = &value[..pos];
            }
        }
        let mut value = value.trim_end().to_string();
        if value == "\"\"" {
            value.clear();
        }

        let map = target_map(ini, target);
        map.insert(option.clone(), value);
        cur_opt = Some(option);
    }

    Ok(())
}

/// Extract the section name from a `[name]` line. Text after the closing
/// bracket is ignored.
fn section_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    let end = rest.find(']')?;
    if end == 0 {
        return None;
    }
    Some(&rest[..end])
}

fn target_map<'a>(ini: &'a mut Ini, target: &Target) -> &'a mut IndexMap<String, String> {
    match target {
        Target::Defaults => &mut ini.defaults,
        Target::Section(name) => ini.sections.entry(name.clone()).or_default(),
    }
}
