// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn accepts_alphanumeric_start_with_separators() {
    assert!(validate_project_name("my-project_1.2").is_ok());
    assert!(validate_project_name("a").is_ok());
}

#[test]
fn rejects_empty_name() {
    assert_eq!(validate_project_name(""), Err(ProjectNameError::Empty));
}

#[test]
fn rejects_leading_separator() {
    assert_eq!(validate_project_name("-leading"), Err(ProjectNameError::BadStart));
    assert_eq!(validate_project_name(".leading"), Err(ProjectNameError::BadStart));
}

#[test]
fn rejects_invalid_characters() {
    assert_eq!(validate_project_name("has space"), Err(ProjectNameError::BadChar(' ')));
    assert_eq!(validate_project_name("has/slash"), Err(ProjectNameError::BadChar('/')));
}

#[test]
fn rejects_names_over_max_length() {
    let long = "a".repeat(MAX_PROJECT_NAME_LEN + 1);
    assert_eq!(
        validate_project_name(&long),
        Err(ProjectNameError::TooLong { max: MAX_PROJECT_NAME_LEN })
    );
}

#[test]
fn accepts_name_at_exactly_max_length() {
    let exact = "a".repeat(MAX_PROJECT_NAME_LEN);
    assert!(validate_project_name(&exact).is_ok());
}

#[test]
fn derive_repo_dir_is_under_repos_subdir() {
    let base = Path::new("/state/fab");
    assert_eq!(Project::derive_repo_dir(base, "widgets"), Path::new("/state/fab/repos/widgets"));
}

#[test]
fn max_agents_bounds() {
    assert!(Project::validate_max_agents(1).is_ok());
    assert!(Project::validate_max_agents(100).is_ok());
    assert!(Project::validate_max_agents(0).is_err());
    assert!(Project::validate_max_agents(101).is_err());
}
