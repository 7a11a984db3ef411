// # Hosts File Source
//
// Reads the desired host list from a plain-text file.
//
// ## File Format
//
// ```text
// # address      description
// 10.0.0.1       Gateway
// 10.0.0.2       DNS resolver
// 10.0.0.3/32    Build server
// ```
//
// - One host per line: address, whitespace, description (rest of line)
// - Blank lines and lines starting with `#` are ignored
// - An optional `/prefix` on the address is accepted and stripped
// - A missing description is stored as an empty string

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{Error, Result};
use crate::traits::{Host, HostSource};

/// Host source backed by a hosts file
#[derive(Debug, Clone)]
pub struct FileHostSource {
    path: PathBuf,
}

impl FileHostSource {
    /// Create a source reading from `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the hosts file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HostSource for FileHostSource {
    async fn hosts(&self) -> Result<Vec<Host>> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::inventory(format!(
                "Failed to read hosts file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let hosts = parse_hosts(&content, &self.path.display().to_string())?;
        tracing::debug!("Loaded {} host(s) from {}", hosts.len(), self.path.display());
        Ok(hosts)
    }

    fn source_name(&self) -> &'static str {
        "file"
    }
}

/// Parse hosts-file content
///
/// `origin` names the content in error messages (usually the file path).
pub fn parse_hosts(content: &str, origin: &str) -> Result<Vec<Host>> {
    let mut hosts = Vec::new();
    let mut seen = HashMap::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (address, description) = match line.split_once(char::is_whitespace) {
            Some((address, rest)) => (address, rest.trim()),
            None => (line, ""),
        };

        let address = crate::address::validate(address)
            .map_err(|e| Error::inventory(format!("{}:{}: {}", origin, line_no, e)))?;
        if let Some(first) = seen.insert(address.clone(), line_no) {
            return Err(Error::inventory(format!(
                "{}:{}: duplicate address {} (first seen on line {})",
                origin, line_no, address, first
            )));
        }

        hosts.push(Host::new(address, description));
    }

    Ok(hosts)
}
