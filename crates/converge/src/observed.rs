//! Observed host state - what a probe found for one resource
//!
//! Observations are produced fresh every run and never cached; the host
//! itself is the only state store. "Does not exist" is a normal
//! observation, not an error.

use serde::{Deserialize, Serialize};

/// Current attributes of an existing directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryState {
    /// Permission bits (masked to 0o7777).
    pub mode: u32,
    /// Owner name, if the uid resolves to one.
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Current attributes of an existing managed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    /// Digest of the normalized file content.
    pub content_digest: String,
    pub mode: u32,
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Current passwd entry of an existing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    pub uid: u32,
    pub home: String,
    pub shell: String,
}

/// Current state of a systemd unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceState {
    /// Digest of the normalized unit file content; None if no unit file.
    pub unit_digest: Option<String>,
    pub active: bool,
    pub enabled: bool,
}

/// Current state of the two files behind a dconf login banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerState {
    /// Digest of the keyfile in the system database directory, if present.
    pub keyfile_digest: Option<String>,
    /// Digest of the dconf profile file, if present.
    pub profile_digest: Option<String>,
}

/// What a probe observed for one resource.
///
/// `Absent` covers every kind: missing path, no passwd entry, port not
/// open, package not installed. Kind-specific variants carry the current
/// attributes the reconciler compares against the declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observed {
    /// The resource does not exist on the host.
    Absent,
    Directory(DirectoryState),
    File(FileState),
    User(UserState),
    /// The firewall port is open.
    PortOpen,
    Service(ServiceState),
    Banner(BannerState),
    /// The package is installed.
    Installed {
        version: Option<String>,
    },
}

impl Observed {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}
