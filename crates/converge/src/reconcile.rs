//! Pure reconciliation - desired vs. observed, no host access
//!
//! `reconcile` is a pure function so every kind policy is testable
//! without a live host. Comparison is attribute-wise equality; content is
//! compared by digest of the normalized text, never by timestamp, so
//! convergence is deterministic.

use crate::observed::{FileState, Observed};
use crate::resource::{Desired, DirectorySpec, FileSpec, Resource};
use crate::types::Action;

/// Normalize content before comparison: trailing whitespace trimmed per
/// line, exactly one trailing newline.
pub fn normalize(content: &str) -> String {
    let mut out = content
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    while out.ends_with('\n') {
        out.pop();
    }
    out.push('\n');
    out
}

/// Digest of normalized content, used for file-backed comparison.
pub fn content_digest(content: &str) -> String {
    blake3::hash(normalize(content).as_bytes())
        .to_hex()
        .to_string()
}

/// Compute the minimal action moving observed state to desired state.
pub fn reconcile(resource: &Resource, observed: &Observed) -> Action {
    match (&resource.desired, observed) {
        // Directories: create if absent, rewrite diverged attributes
        (Desired::Directory(_), Observed::Absent) => Action::create("directory is absent"),
        (Desired::Directory(spec), Observed::Directory(state)) => {
            if let Some(reason) = directory_divergence(spec, state) {
                Action::update(reason)
            } else {
                Action::noop("directory matches declaration")
            }
        }

        // Managed files and rendered repo definitions share file semantics
        (Desired::FileContent(_), Observed::Absent) => Action::create("file is absent"),
        (Desired::FileContent(spec), Observed::File(state)) => reconcile_file(spec, state),
        (Desired::RepoDefinition(_), Observed::Absent) => Action::create("repo file is absent"),
        (Desired::RepoDefinition(spec), Observed::File(state)) => {
            if content_digest(&spec.render(&resource.identity)) != state.content_digest {
                Action::update("repo file content differs")
            } else {
                Action::noop("repo file matches declaration")
            }
        }

        // Users are create-only: an existing account is never altered
        (Desired::SystemUser(_), Observed::Absent) => Action::create("user does not exist"),
        (Desired::SystemUser(_), Observed::User(_)) => Action::noop("user exists"),

        // Packages are create-only as well
        (Desired::Package, Observed::Absent) => Action::create("package is not installed"),
        (Desired::Package, Observed::Installed { .. }) => Action::noop("package is installed"),

        // Ports are additive: open if closed, never close automatically
        (Desired::FirewallPort(spec), Observed::Absent) => {
            Action::create(format!("port {} is not open", spec.port_spec()))
        }
        (Desired::FirewallPort(_), Observed::PortOpen) => Action::noop("port is open"),

        // Services: content first, then running state
        (Desired::ServiceUnit(_), Observed::Absent) => Action::create("unit file is absent"),
        (Desired::ServiceUnit(spec), Observed::Service(state)) => {
            let desired_digest = content_digest(&spec.unit);
            match &state.unit_digest {
                None => Action::create("unit file is absent"),
                Some(digest) if *digest != desired_digest => {
                    Action::update("unit file content differs")
                }
                Some(_) if !state.active => Action::create("unit is not active"),
                Some(_) if !state.enabled => Action::create("unit is not enabled"),
                Some(_) => Action::noop("unit matches and is running"),
            }
        }

        // Banner: keyfile plus profile, both content-compared
        (Desired::LoginBanner(_), Observed::Absent) => Action::create("banner is not configured"),
        (Desired::LoginBanner(spec), Observed::Banner(state)) => {
            let keyfile = content_digest(&spec.keyfile());
            let profile = content_digest(&spec.profile(&resource.identity));
            if state.keyfile_digest.as_deref() != Some(keyfile.as_str()) {
                match state.keyfile_digest {
                    None => Action::create("banner keyfile is absent"),
                    Some(_) => Action::update("banner keyfile content differs"),
                }
            } else if state.profile_digest.as_deref() != Some(profile.as_str()) {
                match state.profile_digest {
                    None => Action::create("dconf profile is absent"),
                    Some(_) => Action::update("dconf profile content differs"),
                }
            } else {
                Action::noop("banner matches declaration")
            }
        }

        // A probe returned a state shape for a different kind. Treated as
        // inert rather than guessing at a mutation.
        _ => Action::noop("observed state does not match declared kind"),
    }
}

fn directory_divergence(spec: &DirectorySpec, state: &crate::observed::DirectoryState) -> Option<String> {
    if let Some(mode) = spec.mode {
        if state.mode != mode {
            return Some(format!("mode is 0{:o}, want 0{mode:o}", state.mode));
        }
    }
    if let Some(owner) = &spec.owner {
        if state.owner.as_deref() != Some(owner.as_str()) {
            return Some(format!(
                "owner is {}, want {owner}",
                state.owner.as_deref().unwrap_or("(unresolved)")
            ));
        }
    }
    if let Some(group) = &spec.group {
        if state.group.as_deref() != Some(group.as_str()) {
            return Some(format!(
                "group is {}, want {group}",
                state.group.as_deref().unwrap_or("(unresolved)")
            ));
        }
    }
    None
}

fn reconcile_file(spec: &FileSpec, state: &FileState) -> Action {
    if content_digest(&spec.content) != state.content_digest {
        return Action::update("content differs");
    }
    if let Some(mode) = spec.mode {
        if state.mode != mode {
            return Action::update(format!("mode is 0{:o}, want 0{mode:o}", state.mode));
        }
    }
    if let Some(owner) = &spec.owner {
        if state.owner.as_deref() != Some(owner.as_str()) {
            return Action::update(format!(
                "owner is {}, want {owner}",
                state.owner.as_deref().unwrap_or("(unresolved)")
            ));
        }
    }
    if let Some(group) = &spec.group {
        if state.group.as_deref() != Some(group.as_str()) {
            return Action::update(format!(
                "group is {}, want {group}",
                state.group.as_deref().unwrap_or("(unresolved)")
            ));
        }
    }
    Action::noop("file matches declaration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observed::{BannerState, DirectoryState, ServiceState, UserState};
    use crate::resource::{BannerSpec, PortSpec, Protocol, RepoSpec, ServiceSpec, UserSpec};
    use crate::types::ActionKind;

    #[test]
    fn test_normalize_trims_trailing_whitespace() {
        assert_eq!(normalize("a  \nb\t\nc"), "a\nb\nc\n");
    }

    #[test]
    fn test_normalize_single_trailing_newline() {
        assert_eq!(normalize("a\n\n\n"), "a\n");
        assert_eq!(normalize("a"), "a\n");
    }

    #[test]
    fn test_digest_ignores_trailing_noise() {
        assert_eq!(content_digest("x=1 \ny=2"), content_digest("x=1\ny=2\n"));
        assert_ne!(content_digest("x=1"), content_digest("x=2"));
    }

    fn dir_resource(mode: Option<u32>) -> Resource {
        Resource::new(
            "/srv/repos/7.9",
            Desired::Directory(DirectorySpec {
                mode,
                owner: None,
                group: None,
            }),
        )
    }

    #[test]
    fn test_directory_absent_creates() {
        let action = reconcile(&dir_resource(Some(0o755)), &Observed::Absent);
        assert_eq!(action.kind, ActionKind::Create);
    }

    #[test]
    fn test_directory_matching_mode_is_noop() {
        let observed = Observed::Directory(DirectoryState {
            mode: 0o755,
            owner: None,
            group: None,
        });
        let action = reconcile(&dir_resource(Some(0o755)), &observed);
        assert_eq!(action.kind, ActionKind::NoOp);
    }

    #[test]
    fn test_directory_mode_divergence_updates() {
        let observed = Observed::Directory(DirectoryState {
            mode: 0o700,
            owner: None,
            group: None,
        });
        let action = reconcile(&dir_resource(Some(0o755)), &observed);
        assert_eq!(action.kind, ActionKind::Update);
        assert!(action.rationale.contains("mode"));
    }

    #[test]
    fn test_directory_without_declared_mode_accepts_any() {
        let observed = Observed::Directory(DirectoryState {
            mode: 0o700,
            owner: None,
            group: None,
        });
        assert!(reconcile(&dir_resource(None), &observed).is_noop());
    }

    #[test]
    fn test_file_content_compared_by_normalized_digest() {
        let resource = Resource::new(
            "/etc/app.conf",
            Desired::FileContent(FileSpec {
                content: "key=value".into(),
                mode: None,
                owner: None,
                group: None,
            }),
        );
        let observed = Observed::File(FileState {
            content_digest: content_digest("key=value  \n\n"),
            mode: 0o644,
            owner: None,
            group: None,
        });
        assert!(reconcile(&resource, &observed).is_noop());
    }

    #[test]
    fn test_existing_user_is_never_updated() {
        let resource = Resource::new(
            "loki",
            Desired::SystemUser(UserSpec {
                system: true,
                home: Some("/var/lib/loki".into()),
                shell: Some("/sbin/nologin".into()),
                create_home: false,
            }),
        );
        // Observed home/shell differ from declaration; still NoOp.
        let observed = Observed::User(UserState {
            uid: 989,
            home: "/home/loki".into(),
            shell: "/bin/bash".into(),
        });
        assert!(reconcile(&resource, &observed).is_noop());
        assert_eq!(
            reconcile(&resource, &Observed::Absent).kind,
            ActionKind::Create
        );
    }

    #[test]
    fn test_firewall_port_is_additive() {
        let resource = Resource::new(
            "6558/tcp",
            Desired::FirewallPort(PortSpec {
                port: 6558,
                protocol: Protocol::Tcp,
            }),
        );
        assert_eq!(
            reconcile(&resource, &Observed::Absent).kind,
            ActionKind::Create
        );
        assert!(reconcile(&resource, &Observed::PortOpen).is_noop());
    }

    fn service_resource() -> Resource {
        Resource::new(
            "loki.service",
            Desired::ServiceUnit(ServiceSpec {
                unit: "[Unit]\nDescription=Loki\n[Service]\nExecStart=/usr/bin/loki\n".into(),
            }),
        )
    }

    #[test]
    fn test_service_content_divergence_updates() {
        let observed = Observed::Service(ServiceState {
            unit_digest: Some(content_digest("[Unit]\nDescription=Old\n")),
            active: true,
            enabled: true,
        });
        assert_eq!(
            reconcile(&service_resource(), &observed).kind,
            ActionKind::Update
        );
    }

    #[test]
    fn test_service_stopped_but_correct_starts() {
        let resource = service_resource();
        let unit = match &resource.desired {
            Desired::ServiceUnit(spec) => spec.unit.clone(),
            _ => unreachable!(),
        };
        let observed = Observed::Service(ServiceState {
            unit_digest: Some(content_digest(&unit)),
            active: false,
            enabled: true,
        });
        let action = reconcile(&resource, &observed);
        assert_eq!(action.kind, ActionKind::Create);
        assert!(action.rationale.contains("not active"));
    }

    #[test]
    fn test_service_running_and_matching_is_noop() {
        let resource = service_resource();
        let unit = match &resource.desired {
            Desired::ServiceUnit(spec) => spec.unit.clone(),
            _ => unreachable!(),
        };
        let observed = Observed::Service(ServiceState {
            unit_digest: Some(content_digest(&unit)),
            active: true,
            enabled: true,
        });
        assert!(reconcile(&resource, &observed).is_noop());
    }

    #[test]
    fn test_repo_definition_compares_rendered_content() {
        let spec = RepoSpec {
            name: "Local media".into(),
            baseurl: "http://repo.local/7.9".into(),
            enabled: true,
            gpgcheck: false,
        };
        let resource = Resource::new("dvd", Desired::RepoDefinition(spec.clone()));
        let observed = Observed::File(FileState {
            content_digest: content_digest(&spec.render("dvd")),
            mode: 0o644,
            owner: None,
            group: None,
        });
        assert!(reconcile(&resource, &observed).is_noop());
    }

    #[test]
    fn test_banner_profile_divergence_updates() {
        let spec = BannerSpec {
            text: "Authorized use only".into(),
        };
        let resource = Resource::new("gdm", Desired::LoginBanner(spec.clone()));
        let observed = Observed::Banner(BannerState {
            keyfile_digest: Some(content_digest(&spec.keyfile())),
            profile_digest: Some(content_digest("user-db:user\n")),
        });
        assert_eq!(reconcile(&resource, &observed).kind, ActionKind::Update);
    }
}
