//! Declaration validation - every issue in one pass
//!
//! Validation runs before any probe and collects the complete list of
//! problems, so a misconfiguration is reported once, fully, instead of
//! one issue per run.

use crate::error::{Issue, ValidationError};
use crate::graph::execution_order;
use crate::resource::{Desired, Resource, ResourceRef};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[a-z_][a-z0-9_-]*$").unwrap())
}

/// Validate the whole declaration. `Err` carries every issue found.
pub fn validate(resources: &[Resource]) -> Result<(), ValidationError> {
    let mut issues = Vec::new();

    let mut seen: HashSet<(crate::resource::Kind, &str)> = HashSet::new();
    let declared: HashSet<String> = resources
        .iter()
        .map(|r| r.reference().to_string())
        .collect();

    for resource in resources {
        let kind = resource.kind();

        if resource.identity.is_empty() {
            issues.push(Issue::EmptyIdentity { kind });
            continue;
        }

        if !seen.insert((kind, resource.identity.as_str())) {
            issues.push(Issue::Duplicate {
                kind,
                identity: resource.identity.clone(),
            });
        }

        check_attributes(resource, &mut issues);

        for reference in &resource.requires {
            match reference.parse::<ResourceRef>() {
                Err(problem) => issues.push(Issue::BadRequires {
                    kind,
                    identity: resource.identity.clone(),
                    problem,
                }),
                Ok(parsed) => {
                    if parsed == resource.reference() {
                        issues.push(Issue::BadRequires {
                            kind,
                            identity: resource.identity.clone(),
                            problem: "resource requires itself".into(),
                        });
                    } else if !declared.contains(reference.as_str()) {
                        issues.push(Issue::UnknownRequires {
                            kind,
                            identity: resource.identity.clone(),
                            reference: reference.clone(),
                        });
                    }
                }
            }
        }
    }

    // Cycle detection only makes sense once the edges themselves are sound
    if issues.is_empty() {
        if let Err(stuck) = execution_order(resources) {
            issues.push(Issue::DependencyCycle(stuck.join(", ")));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}

fn check_attributes(resource: &Resource, issues: &mut Vec<Issue>) {
    let kind = resource.kind();
    let mut bad = |problem: String| {
        issues.push(Issue::BadAttribute {
            kind,
            identity: resource.identity.clone(),
            problem,
        });
    };

    match &resource.desired {
        Desired::Directory(spec) => {
            if !resource.identity.starts_with('/') {
                bad("path must be absolute".into());
            }
            if let Some(mode) = spec.mode {
                if mode > 0o7777 {
                    bad(format!("mode 0{mode:o} exceeds 0o7777"));
                }
            }
        }
        Desired::FileContent(spec) => {
            if !resource.identity.starts_with('/') {
                bad("path must be absolute".into());
            }
            if let Some(mode) = spec.mode {
                if mode > 0o7777 {
                    bad(format!("mode 0{mode:o} exceeds 0o7777"));
                }
            }
        }
        Desired::SystemUser(_) => {
            if !username_pattern().is_match(&resource.identity) {
                bad(format!("'{}' is not a valid username", resource.identity));
            }
        }
        Desired::FirewallPort(spec) => {
            if spec.port == 0 {
                bad("port must be 1-65535".into());
            }
            if resource.identity != spec.port_spec() {
                bad(format!(
                    "identity '{}' does not match declared port {}",
                    resource.identity,
                    spec.port_spec()
                ));
            }
        }
        Desired::ServiceUnit(spec) => {
            if resource.identity.contains('/') {
                bad("unit name must not contain '/'".into());
            }
            if spec.unit.trim().is_empty() {
                bad("unit file content is empty".into());
            }
        }
        Desired::RepoDefinition(spec) => {
            if resource.identity.contains('/') {
                bad("repo id must not contain '/'".into());
            }
            if spec.baseurl.trim().is_empty() {
                bad("baseurl is empty".into());
            }
        }
        Desired::Package => {
            if resource.identity.contains(char::is_whitespace) {
                bad("package name must not contain whitespace".into());
            }
        }
        Desired::LoginBanner(spec) => {
            if spec.text.trim().is_empty() {
                bad("banner text is empty".into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{
        DirectorySpec, FileSpec, PortSpec, Protocol, ServiceSpec, UserSpec,
    };

    fn dir(path: &str) -> Resource {
        Resource::new(path, Desired::Directory(DirectorySpec::default()))
    }

    #[test]
    fn test_valid_declaration_passes() {
        let resources = vec![
            Resource::new("loki", Desired::SystemUser(UserSpec::default())),
            dir("/var/lib/loki").with_requires(vec!["system_user:loki".into()]),
        ];
        assert!(validate(&resources).is_ok());
    }

    #[test]
    fn test_duplicate_kind_identity_rejected() {
        let resources = vec![dir("/srv/repos/7.9"), dir("/srv/repos/7.9")];
        let err = validate(&resources).unwrap_err();
        assert!(matches!(err.issues.as_slice(), [Issue::Duplicate { .. }]));
    }

    #[test]
    fn test_same_identity_different_kinds_allowed() {
        let resources = vec![
            dir("/etc/loki"),
            Resource::new(
                "/etc/loki",
                Desired::FileContent(FileSpec::default()),
            ),
        ];
        assert!(validate(&resources).is_ok());
    }

    #[test]
    fn test_all_issues_collected_in_one_pass() {
        let resources = vec![
            Resource::new("", Desired::Directory(DirectorySpec::default())),
            Resource::new("Bad Name", Desired::SystemUser(UserSpec::default())),
            Resource::new(
                "0/tcp",
                Desired::FirewallPort(PortSpec {
                    port: 0,
                    protocol: Protocol::Tcp,
                }),
            ),
            dir("/a").with_requires(vec!["directory:/missing".into()]),
        ];
        let err = validate(&resources).unwrap_err();
        assert_eq!(err.issues.len(), 4);
    }

    #[test]
    fn test_unknown_requires_rejected() {
        let resources = vec![dir("/a").with_requires(vec!["system_user:nobody-here".into()])];
        let err = validate(&resources).unwrap_err();
        assert!(matches!(
            err.issues.as_slice(),
            [Issue::UnknownRequires { .. }]
        ));
    }

    #[test]
    fn test_malformed_requires_rejected() {
        let resources = vec![dir("/a").with_requires(vec!["not-a-ref".into()])];
        let err = validate(&resources).unwrap_err();
        assert!(matches!(err.issues.as_slice(), [Issue::BadRequires { .. }]));
    }

    #[test]
    fn test_self_requires_rejected() {
        let resources = vec![dir("/a").with_requires(vec!["directory:/a".into()])];
        let err = validate(&resources).unwrap_err();
        assert!(matches!(err.issues.as_slice(), [Issue::BadRequires { .. }]));
    }

    #[test]
    fn test_cycle_rejected() {
        let resources = vec![
            dir("/a").with_requires(vec!["directory:/b".into()]),
            dir("/b").with_requires(vec!["directory:/a".into()]),
        ];
        let err = validate(&resources).unwrap_err();
        assert!(matches!(
            err.issues.as_slice(),
            [Issue::DependencyCycle(_)]
        ));
    }

    #[test]
    fn test_empty_unit_content_rejected() {
        let resources = vec![Resource::new(
            "loki.service",
            Desired::ServiceUnit(ServiceSpec { unit: "  \n".into() }),
        )];
        assert!(validate(&resources).is_err());
    }

    #[test]
    fn test_port_identity_must_match_spec() {
        let resources = vec![Resource::new(
            "6558/tcp",
            Desired::FirewallPort(PortSpec {
                port: 3100,
                protocol: Protocol::Tcp,
            }),
        )];
        assert!(validate(&resources).is_err());
    }
}
