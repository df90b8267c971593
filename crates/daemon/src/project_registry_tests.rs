use super::*;
use tempfile::tempdir;

#[test]
fn derive_name_strips_git_suffix_and_path() {
    assert_eq!(derive_name("git@github.com:acme/widgets.git"), "widgets");
    assert_eq!(derive_name("https://example.invalid/acme/widgets"), "widgets");
}

#[test]
fn add_then_list_round_trips_declared_attributes() {
    let dir = tempdir().unwrap();
    let registry = ProjectRegistry::load(dir.path()).unwrap();
    registry
        .add(dir.path(), "https://example.invalid/acme/widgets.git".into(), None, Some(3), Some(true), None)
        .unwrap();

    let projects = registry.list();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "widgets");
    assert_eq!(projects[0].max_agents, 3);
    assert!(projects[0].autostart);
}

#[test]
fn add_duplicate_name_fails() {
    let dir = tempdir().unwrap();
    let registry = ProjectRegistry::load(dir.path()).unwrap();
    registry.add(dir.path(), "https://x/a.git".into(), Some("a".into()), None, None, None).unwrap();
    let err = registry.add(dir.path(), "https://x/a.git".into(), Some("a".into()), None, None, None);
    assert!(matches!(err, Err(ProjectError::AlreadyExists(_))));
}

#[test]
fn config_set_rejects_out_of_range_max_agents() {
    let dir = tempdir().unwrap();
    let registry = ProjectRegistry::load(dir.path()).unwrap();
    registry.add(dir.path(), "https://x/a.git".into(), Some("a".into()), None, None, None).unwrap();
    let err = registry.config_set("a", "max-agents", "0");
    assert!(matches!(err, Err(ProjectError::InvalidConfigValue { .. })));
}

#[test]
fn registry_persists_across_reload() {
    let dir = tempdir().unwrap();
    {
        let registry = ProjectRegistry::load(dir.path()).unwrap();
        registry.add(dir.path(), "https://x/a.git".into(), Some("a".into()), Some(5), None, None).unwrap();
    }
    let reloaded = ProjectRegistry::load(dir.path()).unwrap();
    assert_eq!(reloaded.get("a").unwrap().max_agents, 5);
}

#[test]
fn remove_unknown_project_fails() {
    let dir = tempdir().unwrap();
    let registry = ProjectRegistry::load(dir.path()).unwrap();
    assert!(matches!(registry.remove("ghost"), Err(ProjectError::NotFound(_))));
}
