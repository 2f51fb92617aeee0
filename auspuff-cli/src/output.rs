use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;

use auspuff_core::{
    registry::{Registry, RegistryEntry, LIBRARY_FILE, MANIFEST_FILE},
    CoefficientTable,
};

/// Writes the rendered table, replacing or appending to `path`.
pub fn write_header(path: &Path, table: &CoefficientTable, append: bool) -> anyhow::Result<()> {
    let header = table.render();

    if append {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(header.as_bytes()))
    } else {
        fs::write(path, header)
    }
    .with_context(|| format!("could not write {}", path.display()))
}

/// File name of a header as the library includes it.
pub fn header_name(path: &Path) -> anyhow::Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))
}

/// Manifest and library header of one directory.
///
/// Everything is recorded in memory first, nothing is written before
/// [`Library::write`].
pub struct Library {
    dir: PathBuf,
    registry: Registry,
    changed: bool,
}

impl Library {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let registry = Registry::load(&manifest_path)
            .with_context(|| format!("could not read {}", manifest_path.display()))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            registry,
            changed: false,
        })
    }

    /// The library in the directory of `header_path`.
    pub fn beside(header_path: &Path) -> anyhow::Result<Self> {
        let dir = header_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        Self::open(dir)
    }

    /// Records `table` as living in `header`. A preset regenerated under an
    /// existing name replaces the old entry.
    pub fn record(&mut self, table: &CoefficientTable, header: &str) {
        let entry = RegistryEntry::new(table, header);

        match self.registry.upsert(entry.clone()) {
            None => self.changed = true,
            Some(previous) if previous == entry => {
                tracing::debug!("`{}` is already in the library", table.name());
            }
            Some(previous) => {
                tracing::info!(
                    "replacing `{}` in the library ({} coefficients in {}, was {} in {})",
                    entry.name,
                    entry.size,
                    entry.header,
                    previous.size,
                    previous.header
                );
                self.changed = true;
            }
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Saves the manifest if anything changed and regenerates the library
    /// header. Returns the library path.
    pub fn write(&self) -> anyhow::Result<PathBuf> {
        if self.changed {
            let manifest_path = self.dir.join(MANIFEST_FILE);
            self.registry
                .save(&manifest_path)
                .with_context(|| format!("could not write {}", manifest_path.display()))?;
        }

        let library_path = self.dir.join(LIBRARY_FILE);
        fs::write(&library_path, self.registry.render())
            .with_context(|| format!("could not write {}", library_path.display()))?;

        Ok(library_path)
    }
}
