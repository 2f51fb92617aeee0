//! Consolidated preset library.
//!
//! Every generated coefficient header is recorded as a [`RegistryEntry`].
//! The library header is always rebuilt from the full list of entries, it is
//! never patched in place.

use std::{
    fmt::{self, Write},
    io,
    path::Path,
};

use crate::{CoefficientTable, Error};

pub const MANIFEST_FILE: &str = "impulse_library.json";
pub const LIBRARY_FILE: &str = "impulse_library.h";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    /// Header file name, relative to the library header.
    pub header: String,
    pub size: usize,
}

impl RegistryEntry {
    pub fn new(table: &CoefficientTable, header: impl Into<String>) -> Self {
        Self {
            name: table.name().to_string(),
            header: header.into(),
            size: table.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a manifest, a missing file is an empty registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };

        Ok(serde_json::from_slice(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(&self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Adds `entry` at the end.
    ///
    /// Returns `false` if the exact same entry is already present. An entry
    /// with the same name but different contents is rejected.
    pub fn append(&mut self, entry: RegistryEntry) -> Result<bool, Error> {
        match self.entries.iter().find(|e| e.name == entry.name) {
            Some(existing) if *existing == entry => Ok(false),
            Some(_) => Err(Error::DuplicateEntry(entry.name)),
            None => {
                self.entries.push(entry);
                Ok(true)
            }
        }
    }

    /// Adds `entry`, or replaces the entry with the same name in place.
    ///
    /// Returns the entry that was replaced.
    pub fn upsert(&mut self, entry: RegistryEntry) -> Option<RegistryEntry> {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegistryEntry> {
        self.entries.iter()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a RegistryEntry;
    type IntoIter = std::slice::Iter<'a, RegistryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut includes = String::new();
        let mut rows = String::new();
        let mut included = Vec::new();
        for entry in &self.entries {
            // appended headers hold several presets
            if !included.contains(&entry.header.as_str()) {
                writeln!(includes, "#include \"{}\"", entry.header)?;
                included.push(entry.header.as_str());
            }
            writeln!(
                rows,
                "    {{ \"{0}\", g_impulse_{0}, g_impulse_{0}_size }},",
                entry.name
            )?;
        }

        write!(
            f,
            r#"// Impulse response preset library, generated by auspuff from {MANIFEST_FILE}.
// Do not edit, changes are lost on the next update.

#pragma once

#include <stddef.h>
#include <string.h>

{includes}
typedef struct {{
    const char* name;
    const double* samples;
    size_t size;
}} impulse_preset_t;

static const impulse_preset_t impulse_presets[] = {{
{rows}    {{ NULL, NULL, 0 }}
}};

static const size_t num_impulse_presets = {count};

static inline const impulse_preset_t* find_impulse_preset(const char* name)
{{
    if (!name) return NULL;
    for (size_t i = 0; i < num_impulse_presets; i++) {{
        if (strcmp(impulse_presets[i].name, name) == 0) {{
            return &impulse_presets[i];
        }}
    }}
    return NULL;
}}
"#,
            count = self.entries.len()
        )
    }
}
