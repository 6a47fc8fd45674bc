//! Registry status snapshot.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Resource counts for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostStatus {
    pub host: String,
    pub http_resources: usize,
    pub https_resources: usize,
}

/// A consistent view of one generation.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub hosts: Vec<HostStatus>,
    pub root: PathBuf,
    pub default_host: String,
    pub development: bool,
    pub custom_no_such_host: bool,
    pub custom_no_such_file: bool,
    pub files: usize,
    pub plain_bytes: usize,
    pub gzip_bytes: usize,
    /// HTTP date of the last successful load.
    pub loaded_at: Option<String>,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sites ({}):", self.hosts.len())?;
        for host in &self.hosts {
            writeln!(
                f,
                "\t{} ({} HTTP resources, {} HTTPS resources)",
                host.host, host.http_resources, host.https_resources
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Settings:")?;
        writeln!(f, "\tRoot:                {}", self.root.display())?;
        writeln!(f, "\tDefault host:        {}", self.default_host)?;
        writeln!(f, "\tDev mode:            {}", self.development)?;
        writeln!(f, "\tCustom no such host: {}", self.custom_no_such_host)?;
        writeln!(f, "\tCustom no such file: {}", self.custom_no_such_file)?;
        writeln!(f)?;
        writeln!(f, "Stats:")?;
        writeln!(f, "\tTotal plain file size: {}B", self.plain_bytes)?;
        writeln!(f, "\tTotal gzip file size:  {}B", self.gzip_bytes)?;
        writeln!(f, "\tTotal files:           {}", self.files)?;
        writeln!(
            f,
            "\tLoaded at:             {}",
            self.loaded_at.as_deref().unwrap_or("never")
        )
    }
}
