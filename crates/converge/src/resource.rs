//! Declared resources - the desired state of a host
//!
//! A [`Resource`] is one unit of desired host configuration: a directory
//! that must exist with a given mode, a service that must be running, a
//! firewall port that must be open. Resources are immutable once declared
//! for a run; the engine never mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource kinds understood by the engine.
///
/// The kind determines which probe reads current state and which policy
/// the reconciler applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Directory,
    FileContent,
    SystemUser,
    FirewallPort,
    ServiceUnit,
    RepoDefinition,
    Package,
    LoginBanner,
}

impl Kind {
    /// Stable name used in `requires` references and report output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::FileContent => "file_content",
            Self::SystemUser => "system_user",
            Self::FirewallPort => "firewall_port",
            Self::ServiceUnit => "service_unit",
            Self::RepoDefinition => "repo_definition",
            Self::Package => "package",
            Self::LoginBanner => "login_banner",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "directory" => Some(Self::Directory),
            "file_content" => Some(Self::FileContent),
            "system_user" => Some(Self::SystemUser),
            "firewall_port" => Some(Self::FirewallPort),
            "service_unit" => Some(Self::ServiceUnit),
            "repo_definition" => Some(Self::RepoDefinition),
            "package" => Some(Self::Package),
            "login_banner" => Some(Self::LoginBanner),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference to another declared resource, written as `kind:identity`.
///
/// Used for `requires` edges, e.g. `"system_user:loki"` or
/// `"file_content:/etc/loki/config.yml"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceRef {
    pub kind: Kind,
    pub identity: String,
}

impl ResourceRef {
    pub fn new(kind: Kind, identity: impl Into<String>) -> Self {
        Self {
            kind,
            identity: identity.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.identity)
    }
}

impl FromStr for ResourceRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, identity) = s
            .split_once(':')
            .ok_or_else(|| format!("'{s}' is not of the form kind:identity"))?;
        let kind =
            Kind::from_name(kind).ok_or_else(|| format!("'{kind}' is not a resource kind"))?;
        if identity.is_empty() {
            return Err(format!("'{s}' has an empty identity"));
        }
        Ok(Self::new(kind, identity))
    }
}

impl TryFrom<String> for ResourceRef {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ResourceRef> for String {
    fn from(r: ResourceRef) -> Self {
        r.to_string()
    }
}

/// Protocol for a firewall port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Udp => f.write_str("udp"),
        }
    }
}

/// Desired attributes for a directory. Identity is the absolute path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySpec {
    /// Permission bits (e.g. 0o755). None means "any mode is fine".
    pub mode: Option<u32>,
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Desired attributes for a managed file. Identity is the absolute path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    /// Full desired content. Compared after normalization, never by mtime.
    pub content: String,
    pub mode: Option<u32>,
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Desired attributes for a local user account. Identity is the username.
///
/// Users are create-only: an existing user's home/shell are never touched
/// on re-runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    /// Create as a system account (`useradd -r`).
    pub system: bool,
    pub home: Option<String>,
    pub shell: Option<String>,
    pub create_home: bool,
}

/// Desired attributes for a firewall port. Identity is `port/protocol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub port: u16,
    pub protocol: Protocol,
}

impl PortSpec {
    /// The `port/protocol` form firewalld uses in `--list-ports`.
    pub fn port_spec(&self) -> String {
        format!("{}/{}", self.port, self.protocol)
    }
}

/// Desired attributes for a systemd unit. Identity is the unit name
/// (e.g. `loki.service`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Full unit file content.
    pub unit: String,
}

/// Desired attributes for a package-manager repo definition. Identity is
/// the repo id (the `.repo` filename stem and section header).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSpec {
    /// Human-readable repo name.
    pub name: String,
    pub baseurl: String,
    pub enabled: bool,
    pub gpgcheck: bool,
}

impl RepoSpec {
    /// Render the `.repo` file content for this definition.
    pub fn render(&self, id: &str) -> String {
        format!(
            "[{id}]\nname={}\nbaseurl={}\nenabled={}\ngpgcheck={}\n",
            self.name,
            self.baseurl,
            u8::from(self.enabled),
            u8::from(self.gpgcheck),
        )
    }
}

/// Desired attributes for a login banner written through the dconf
/// system database. Identity is the dconf profile name (e.g. `gdm`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerSpec {
    pub text: String,
}

impl BannerSpec {
    /// Render the dconf keyfile enabling the banner.
    pub fn keyfile(&self) -> String {
        format!(
            "[org/gnome/login-screen]\nbanner-message-enable=true\nbanner-message-text='{}'\n",
            self.text.replace('\\', "\\\\").replace('\'', "\\'"),
        )
    }

    /// Render the dconf profile file naming the system database.
    pub fn profile(&self, identity: &str) -> String {
        format!("user-db:user\nsystem-db:{identity}\n")
    }
}

/// Kind-specific desired attributes. The variant determines the
/// resource's [`Kind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Desired {
    Directory(DirectorySpec),
    FileContent(FileSpec),
    SystemUser(UserSpec),
    FirewallPort(PortSpec),
    ServiceUnit(ServiceSpec),
    RepoDefinition(RepoSpec),
    Package,
    LoginBanner(BannerSpec),
}

impl Desired {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Directory(_) => Kind::Directory,
            Self::FileContent(_) => Kind::FileContent,
            Self::SystemUser(_) => Kind::SystemUser,
            Self::FirewallPort(_) => Kind::FirewallPort,
            Self::ServiceUnit(_) => Kind::ServiceUnit,
            Self::RepoDefinition(_) => Kind::RepoDefinition,
            Self::Package => Kind::Package,
            Self::LoginBanner(_) => Kind::LoginBanner,
        }
    }
}

/// One declared unit of desired host state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique key within the kind (path, username, port/proto, unit name).
    pub identity: String,
    pub desired: Desired,
    /// Hard dependencies: this resource is only attempted after every
    /// referenced resource converged in the same run.
    #[serde(default)]
    pub requires: Vec<String>,
}

impl Resource {
    pub fn new(identity: impl Into<String>, desired: Desired) -> Self {
        Self {
            identity: identity.into(),
            desired,
            requires: Vec::new(),
        }
    }

    pub fn with_requires(mut self, requires: Vec<String>) -> Self {
        self.requires = requires;
        self
    }

    pub fn kind(&self) -> Kind {
        self.desired.kind()
    }

    /// The `kind:identity` reference other resources use to depend on this one.
    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.kind(), self.identity.clone())
    }

    /// Rendered desired content for file-backed kinds, None otherwise.
    ///
    /// For `LoginBanner` this is the keyfile half; the profile file is a
    /// fixed two-liner.
    pub fn rendered_content(&self) -> Option<String> {
        match &self.desired {
            Desired::FileContent(spec) => Some(spec.content.clone()),
            Desired::ServiceUnit(spec) => Some(spec.unit.clone()),
            Desired::RepoDefinition(spec) => Some(spec.render(&self.identity)),
            Desired::LoginBanner(spec) => Some(spec.keyfile()),
            _ => None,
        }
    }

    /// Human-readable one-line description.
    pub fn describe(&self) -> String {
        match &self.desired {
            Desired::Directory(_) => format!("directory {}", self.identity),
            Desired::FileContent(_) => format!("file {}", self.identity),
            Desired::SystemUser(_) => format!("user {}", self.identity),
            Desired::FirewallPort(spec) => format!("firewall port {}", spec.port_spec()),
            Desired::ServiceUnit(_) => format!("service {}", self.identity),
            Desired::RepoDefinition(_) => format!("repo {}", self.identity),
            Desired::Package => format!("package {}", self.identity),
            Desired::LoginBanner(_) => format!("login banner ({})", self.identity),
        }
    }
}
