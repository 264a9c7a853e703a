/*!
 * Reload Protocol Integration Tests
 */

use rolegate::{
    AccessMask, AuditChannel, CancelToken, DecisionEngine, JsonPolicyLoader, LoadError, Reason,
    ReloadCoordinator, ReloadFlags, Role, RoleBundle, RoleLoader, RoleStore, Rule, Target,
    EMPTY_ROLE,
};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

struct BundleLoader {
    make: Box<dyn Fn() -> Result<RoleBundle, LoadError> + Send + Sync>,
}

impl BundleLoader {
    fn new(make: impl Fn() -> Result<RoleBundle, LoadError> + Send + Sync + 'static) -> Self {
        Self {
            make: Box::new(make),
        }
    }
}

impl RoleLoader for BundleLoader {
    fn load_roles(&self) -> Result<RoleBundle, LoadError> {
        (self.make)()
    }
}

fn file_role(name: &str, mask: AccessMask) -> Role {
    Role::new(
        name,
        vec![Rule::FileAccess {
            target: Target::Exact(42),
            mask,
        }],
    )
}

#[test]
fn test_reload_from_json_policy() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"{
            "active_role": "admin",
            "roles": [
                {
                    "name": "admin",
                    "rules": [
                        { "class": "file_access", "target": { "exact": 42 }, "mask": ["read", "write"] },
                        { "class": "port_bind", "target": { "exact": 8080 } }
                    ]
                }
            ]
        }"#,
    )
    .unwrap();

    let store = RoleStore::new();
    let flags = Arc::new(ReloadFlags::new());
    let coordinator = ReloadCoordinator::new(
        store.clone(),
        Arc::clone(&flags),
        Arc::new(JsonPolicyLoader::from_path(file.path())),
    );

    let report = coordinator.reload().unwrap();
    assert_eq!(report.roles_loaded, 1);
    assert_eq!(report.active_role, "admin");
    assert!(!flags.is_reloading());

    let engine = DecisionEngine::new(store, flags, Arc::new(AuditChannel::new()));
    let token = CancelToken::new();
    assert!(engine
        .check_file_access(42, AccessMask::READ, &token)
        .unwrap()
        .is_allowed());
    assert!(engine.check_port_bind(8080, &token).unwrap().is_allowed());
    assert!(!engine.check_port_bind(22, &token).unwrap().is_allowed());
}

#[test]
fn test_failed_load_resets_to_default_deny() {
    let store = RoleStore::new();
    let flags = Arc::new(ReloadFlags::new());

    // First, a successful generation.
    ReloadCoordinator::new(
        store.clone(),
        Arc::clone(&flags),
        Arc::new(BundleLoader::new(|| {
            Ok(RoleBundle {
                roles: vec![file_role("admin", AccessMask::all())],
                active_role: "admin".to_string(),
            })
        })),
    )
    .reload()
    .unwrap();
    assert_eq!(store.active_role().name(), "admin");

    // Then a loader failure.
    let err = ReloadCoordinator::new(
        store.clone(),
        Arc::clone(&flags),
        Arc::new(BundleLoader::new(|| {
            Err(LoadError::Parse("boom".to_string()))
        })),
    )
    .reload()
    .unwrap_err();
    assert_eq!(err, LoadError::Parse("boom".to_string()));

    // The previously active role is gone; the store is default-deny.
    assert_eq!(store.active_role().name(), EMPTY_ROLE);
    assert!(store.lookup("admin").is_none());
    assert!(!flags.is_reloading());

    let engine = DecisionEngine::new(store, flags, Arc::new(AuditChannel::new()));
    let token = CancelToken::new();
    assert!(!engine.check_port_bind(8080, &token).unwrap().is_allowed());
}

#[test]
fn test_generation_advances_per_cycle() {
    let store = RoleStore::new();
    let flags = Arc::new(ReloadFlags::new());
    let coordinator = ReloadCoordinator::new(
        store.clone(),
        flags,
        Arc::new(BundleLoader::new(|| {
            Ok(RoleBundle {
                roles: vec![file_role("admin", AccessMask::READ)],
                active_role: "admin".to_string(),
            })
        })),
    );

    // Each cycle bumps twice: reset, then replace.
    let first = coordinator.reload().unwrap();
    assert_eq!(first.generation, 2);
    let second = coordinator.reload().unwrap();
    assert_eq!(second.generation, 4);
    assert_eq!(store.generation(), 4);
}

/// Reload atomicity under concurrent decisions.
///
/// Two generations alternate: "alpha" permits READ on file 42, "beta"
/// matches file 42 with an execute-only mask (so READ is denied by a rule,
/// not by the default). A decision must therefore resolve with one of three
/// reasons (alpha's rule, beta's rule, or the reload window) and never
/// with `Reason::Default`, which would mean a reader observed the
/// mid-reload reset state or a torn role set.
#[test]
fn test_decisions_never_observe_reset_state() {
    let store = RoleStore::new();
    let flags = Arc::new(ReloadFlags::new());
    let engine = DecisionEngine::new(
        store.clone(),
        Arc::clone(&flags),
        Arc::new(AuditChannel::new()),
    );

    let alpha = ReloadCoordinator::new(
        store.clone(),
        Arc::clone(&flags),
        Arc::new(BundleLoader::new(|| {
            Ok(RoleBundle {
                roles: vec![file_role("alpha", AccessMask::READ)],
                active_role: "alpha".to_string(),
            })
        })),
    );
    let beta = ReloadCoordinator::new(
        store.clone(),
        Arc::clone(&flags),
        Arc::new(BundleLoader::new(|| {
            Ok(RoleBundle {
                roles: vec![file_role("beta", AccessMask::EXECUTE)],
                active_role: "beta".to_string(),
            })
        })),
    );

    alpha.reload().unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let engine = engine.clone();
            scope.spawn(move || {
                let token = CancelToken::new();
                for _ in 0..500 {
                    let decision = engine
                        .check_file_access(42, AccessMask::READ, &token)
                        .unwrap();
                    match &decision.reason {
                        Reason::Rule { role, .. } => {
                            assert!(
                                &**role == "alpha" || &**role == "beta",
                                "decision from unexpected role {role}"
                            );
                        }
                        Reason::ReloadWindow => assert!(decision.is_allowed()),
                        Reason::Default => panic!("observed mid-reload reset state"),
                    }
                }
            });
        }

        for round in 0..50 {
            if round % 2 == 0 {
                beta.reload().unwrap();
            } else {
                alpha.reload().unwrap();
            }
        }
    });
}
