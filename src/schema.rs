//! Declaration schema - the host.toml read at startup
//!
//! The declaration is a static, versionable TOML file describing desired
//! host state. It is read once per run; there is no runtime
//! reconfiguration. Sections map one-to-one onto resource kinds, and
//! resources come out in a fixed order (users, packages, repos,
//! directories, files, services, ports, banner) with explicit `requires`
//! edges for everything ordering-sensitive.

use anyhow::{Context, Result, bail};
use converge::{
    BannerSpec, Desired, DirectorySpec, FileSpec, PortSpec, Protocol, RepoSpec, Resource,
    ServiceSpec, UserSpec,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default system-wide declaration location.
const SYSTEM_CONFIG: &str = "/etc/trueup/host.toml";

/// The host declaration as written in TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct HostDecl {
    #[serde(default)]
    pub users: Vec<UserDecl>,

    #[serde(default)]
    pub packages: Vec<PackageDecl>,

    #[serde(default)]
    pub repos: Vec<RepoDecl>,

    #[serde(default)]
    pub directories: Vec<DirectoryDecl>,

    #[serde(default)]
    pub files: Vec<FileDecl>,

    #[serde(default)]
    pub services: Vec<ServiceDecl>,

    #[serde(default)]
    pub firewall_ports: Vec<FirewallPortDecl>,

    #[serde(default)]
    pub banner: Option<BannerDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserDecl {
    pub name: String,
    #[serde(default = "default_true")]
    pub system: bool,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub create_home: bool,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDecl {
    pub name: String,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoDecl {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub baseurl: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub gpgcheck: bool,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryDecl {
    pub path: String,
    /// Octal string, e.g. "0755".
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileDecl {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceDecl {
    /// Unit name, e.g. "loki.service".
    pub name: String,
    /// Full unit file content.
    pub unit: String,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FirewallPortDecl {
    pub port: u16,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BannerDecl {
    pub text: String,
    /// dconf profile name.
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default)]
    pub requires: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_profile() -> String {
    "gdm".to_string()
}

impl HostDecl {
    /// Load and parse the declaration.
    ///
    /// An explicit `--config` path must exist; otherwise the system
    /// location is tried first, then the per-user fallback.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf)> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("declaration not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => find_config()?,
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("could not read declaration: {}", path.display()))?;
        let decl: HostDecl = toml::from_str(&content)
            .with_context(|| format!("invalid TOML in {}", path.display()))?;
        Ok((decl, path))
    }

    /// Flatten the declaration into engine resources.
    pub fn into_resources(self) -> Result<Vec<Resource>> {
        let mut resources = Vec::new();

        for user in self.users {
            resources.push(
                Resource::new(
                    user.name,
                    Desired::SystemUser(UserSpec {
                        system: user.system,
                        home: user.home.map(|h| expand(&h)),
                        shell: user.shell,
                        create_home: user.create_home,
                    }),
                )
                .with_requires(user.requires),
            );
        }

        for package in self.packages {
            resources
                .push(Resource::new(package.name, Desired::Package).with_requires(package.requires));
        }

        for repo in self.repos {
            let name = if repo.name.is_empty() {
                repo.id.clone()
            } else {
                repo.name
            };
            resources.push(
                Resource::new(
                    repo.id,
                    Desired::RepoDefinition(RepoSpec {
                        name,
                        baseurl: repo.baseurl,
                        enabled: repo.enabled,
                        gpgcheck: repo.gpgcheck,
                    }),
                )
                .with_requires(repo.requires),
            );
        }

        for dir in self.directories {
            let mode = dir.mode.as_deref().map(parse_mode).transpose()?;
            resources.push(
                Resource::new(
                    expand(&dir.path),
                    Desired::Directory(DirectorySpec {
                        mode,
                        owner: dir.owner,
                        group: dir.group,
                    }),
                )
                .with_requires(dir.requires),
            );
        }

        for file in self.files {
            let mode = file.mode.as_deref().map(parse_mode).transpose()?;
            resources.push(
                Resource::new(
                    expand(&file.path),
                    Desired::FileContent(FileSpec {
                        content: file.content,
                        mode,
                        owner: file.owner,
                        group: file.group,
                    }),
                )
                .with_requires(file.requires),
            );
        }

        for service in self.services {
            resources.push(
                Resource::new(
                    service.name,
                    Desired::ServiceUnit(ServiceSpec { unit: service.unit }),
                )
                .with_requires(service.requires),
            );
        }

        for port in self.firewall_ports {
            let spec = PortSpec {
                port: port.port,
                protocol: port.protocol,
            };
            resources.push(
                Resource::new(spec.port_spec(), Desired::FirewallPort(spec))
                    .with_requires(port.requires),
            );
        }

        if let Some(banner) = self.banner {
            resources.push(
                Resource::new(
                    banner.profile,
                    Desired::LoginBanner(BannerSpec { text: banner.text }),
                )
                .with_requires(banner.requires),
            );
        }

        Ok(resources)
    }
}

/// Parse and flatten a declaration in one step.
pub fn load(explicit: Option<&Path>) -> Result<(Vec<Resource>, PathBuf)> {
    let (decl, path) = HostDecl::load(explicit)?;
    let resources = decl
        .into_resources()
        .with_context(|| format!("invalid declaration: {}", path.display()))?;
    Ok((resources, path))
}

fn find_config() -> Result<PathBuf> {
    let system = PathBuf::from(SYSTEM_CONFIG);
    if system.exists() {
        return Ok(system);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("trueup").join("host.toml");
        if user.exists() {
            return Ok(user);
        }
    }
    bail!(
        "no declaration found: tried {SYSTEM_CONFIG} and ~/.config/trueup/host.toml \
         (use --config to point elsewhere)"
    );
}

/// Expand `~` in declared paths.
fn expand(path: &str) -> String {
    shellexpand::tilde(path).to_string()
}

/// Parse an octal mode string like "0755" or "755".
fn parse_mode(s: &str) -> Result<u32> {
    let digits = s.trim().trim_start_matches("0o");
    u32::from_str_radix(digits, 8).with_context(|| format!("invalid octal mode '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge::Kind;

    const SAMPLE: &str = r#"
        [[users]]
        name = "loki"
        home = "/var/lib/loki"
        shell = "/sbin/nologin"

        [[packages]]
        name = "httpd"

        [[repos]]
        id = "dvd"
        name = "Local media"
        baseurl = "http://repo.local/7.9"
        gpgcheck = false

        [[directories]]
        path = "/srv/repos/7.9"
        mode = "0755"
        owner = "root"

        [[files]]
        path = "/etc/loki/config.yml"
        content = "auth_enabled: false\n"
        mode = "0644"
        owner = "loki"
        requires = ["system_user:loki"]

        [[services]]
        name = "loki.service"
        unit = "[Service]\nExecStart=/usr/bin/loki\n"
        requires = ["file_content:/etc/loki/config.yml", "package:httpd"]

        [[firewall_ports]]
        port = 6558

        [banner]
        text = "Authorized use only"
    "#;

    #[test]
    fn test_sample_flattens_to_every_kind() {
        let decl: HostDecl = toml::from_str(SAMPLE).unwrap();
        let resources = decl.into_resources().unwrap();
        assert_eq!(resources.len(), 8);

        let kinds: Vec<Kind> = resources.iter().map(converge::Resource::kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::SystemUser,
                Kind::Package,
                Kind::RepoDefinition,
                Kind::Directory,
                Kind::FileContent,
                Kind::ServiceUnit,
                Kind::FirewallPort,
                Kind::LoginBanner,
            ]
        );

        // The flattened declaration passes engine validation as-is
        converge::validate(&resources).unwrap();
    }

    #[test]
    fn test_port_identity_is_port_slash_protocol() {
        let decl: HostDecl = toml::from_str("[[firewall_ports]]\nport = 6558\n").unwrap();
        let resources = decl.into_resources().unwrap();
        assert_eq!(resources[0].identity, "6558/tcp");
    }

    #[test]
    fn test_banner_defaults_to_gdm_profile() {
        let decl: HostDecl = toml::from_str("[banner]\ntext = \"hi\"\n").unwrap();
        let resources = decl.into_resources().unwrap();
        assert_eq!(resources[0].identity, "gdm");
        assert_eq!(resources[0].kind(), Kind::LoginBanner);
    }

    #[test]
    fn test_mode_parses_octal() {
        assert_eq!(parse_mode("0755").unwrap(), 0o755);
        assert_eq!(parse_mode("644").unwrap(), 0o644);
        assert_eq!(parse_mode("0o700").unwrap(), 0o700);
        assert!(parse_mode("rwxr-xr-x").is_err());
    }

    #[test]
    fn test_bad_mode_is_rejected_at_load() {
        let decl: HostDecl =
            toml::from_str("[[directories]]\npath = \"/a\"\nmode = \"whatever\"\n").unwrap();
        assert!(decl.into_resources().is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<HostDecl, _> = toml::from_str("[[users]]\nname = \"x\"\nuid = 7\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_tilde_expansion_in_paths() {
        let decl: HostDecl =
            toml::from_str("[[directories]]\npath = \"~/managed\"\n").unwrap();
        let resources = decl.into_resources().unwrap();
        assert!(!resources[0].identity.starts_with('~'));
    }

    #[test]
    fn test_missing_explicit_config_errors() {
        assert!(HostDecl::load(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let (resources, loaded_from) = load(Some(&path)).unwrap();
        assert_eq!(resources.len(), 8);
        assert_eq!(loaded_from, path);
    }
}
