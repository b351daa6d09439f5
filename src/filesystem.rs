/*
 * ==========================================================================
 * PSEUDO - Structured Pseudocode Interpreter
 * ==========================================================================
 * 
 * Author:   Sam Wilcox
 * 
 * License:
 * This file is part of the PSEUDO interpreter project.
 * 
 * PSEUDO is dual-licensed under the terms of:
 *   - The MIT license
 *   - The Apache License, Version 2.0
 * 
 * You may choose either license to govern your use of this software.
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under these licenses is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * 
 * ==========================================================================
 */

//! Named file storage used by the file statements.
//!
//! The runtime never touches storage directly; it goes through a
//! [`FileSystem`] supplied by the host.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A file's name and full text contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub text: String,
}

/// Storage backend for OPENFILE, READFILE, WRITEFILE and friends.
pub trait FileSystem {
    fn has_file(&self, name: &str) -> bool;

    /// Opens a file, creating it empty when `create` is set.
    ///
    /// # Returns
    /// - `Ok(Some(file))` with the current contents
    /// - `Ok(None)` if the file does not exist and `create` is false
    fn open_file(&mut self, name: &str, create: bool) -> io::Result<Option<File>>;

    fn close_file(&mut self, name: &str) -> io::Result<()>;

    fn create_file(&mut self, name: &str) -> io::Result<()>;

    /// Replaces the whole contents of a file.
    fn update_file(&mut self, name: &str, text: &str) -> io::Result<()>;

    fn clear_file(&mut self, name: &str) -> io::Result<()>;

    fn delete_file(&mut self, name: &str) -> io::Result<()>;

    fn list_files(&self) -> Vec<String>;
}

/* ============================================================================
 * In-Memory
 * ============================================================================
 */

/// Files kept in a map. Used by tests and embedding hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<String, String>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that seeds a file.
    pub fn with_file(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(name.into(), text.into());
        self
    }

    pub fn contents(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

fn not_found(name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("file \"{}\" does not exist", name))
}

impl FileSystem for MemoryFileSystem {
    fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    fn open_file(&mut self, name: &str, create: bool) -> io::Result<Option<File>> {
        if create {
            self.files.entry(name.to_string()).or_default();
        }
        Ok(self.files.get(name).map(|text| File {
            name: name.to_string(),
            text: text.clone(),
        }))
    }

    fn close_file(&mut self, _name: &str) -> io::Result<()> {
        Ok(())
    }

    fn create_file(&mut self, name: &str) -> io::Result<()> {
        self.files.entry(name.to_string()).or_default();
        Ok(())
    }

    fn update_file(&mut self, name: &str, text: &str) -> io::Result<()> {
        self.files.insert(name.to_string(), text.to_string());
        Ok(())
    }

    fn clear_file(&mut self, name: &str) -> io::Result<()> {
        match self.files.get_mut(name) {
            Some(text) => {
                text.clear();
                Ok(())
            }
            None => Err(not_found(name)),
        }
    }

    fn delete_file(&mut self, name: &str) -> io::Result<()> {
        self.files.remove(name).map(|_| ()).ok_or_else(|| not_found(name))
    }

    fn list_files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }
}

/* ============================================================================
 * Local Disk
 * ============================================================================
 */

/// Files under a root directory on disk.
///
/// Names are relative to the root. Absolute names and names containing
/// `..` are rejected so a program cannot reach outside the root.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("file name \"{}\" is not allowed", name),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl FileSystem for LocalFileSystem {
    fn has_file(&self, name: &str) -> bool {
        self.resolve(name).map(|path| path.is_file()).unwrap_or(false)
    }

    fn open_file(&mut self, name: &str, create: bool) -> io::Result<Option<File>> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            if !create {
                return Ok(None);
            }
            fs::write(&path, "")?;
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(File {
            name: name.to_string(),
            text,
        }))
    }

    fn close_file(&mut self, _name: &str) -> io::Result<()> {
        Ok(())
    }

    fn create_file(&mut self, name: &str) -> io::Result<()> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            fs::write(path, "")?;
        }
        Ok(())
    }

    fn update_file(&mut self, name: &str, text: &str) -> io::Result<()> {
        fs::write(self.resolve(name)?, text)
    }

    fn clear_file(&mut self, name: &str) -> io::Result<()> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(not_found(name));
        }
        fs::write(path, "")
    }

    fn delete_file(&mut self, name: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(name)?)
    }

    fn list_files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_open_without_create_reports_missing() {
        let mut fs = MemoryFileSystem::new();
        assert!(fs.open_file("a.txt", false).unwrap().is_none());
        assert!(fs.open_file("a.txt", true).unwrap().is_some());
        assert!(fs.has_file("a.txt"));
    }

    #[test]
    fn memory_update_and_delete() {
        let mut fs = MemoryFileSystem::new().with_file("a.txt", "one");
        fs.update_file("a.txt", "two").unwrap();
        assert_eq!(fs.contents("a.txt"), Some("two"));
        fs.delete_file("a.txt").unwrap();
        assert!(fs.delete_file("a.txt").is_err());
        assert!(fs.list_files().is_empty());
    }

    #[test]
    fn local_rejects_escaping_names() {
        let fs = LocalFileSystem::new(".");
        assert!(fs.resolve("../secret").is_err());
        assert!(fs.resolve("/etc/passwd").is_err());
        assert!(fs.resolve("data/a.txt").is_ok());
    }
}
