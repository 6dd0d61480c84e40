//! Test data fixtures for the mock server.
//!
//! Provides factory functions for realistic Taiga objects, as the server
//! would return them.

use serde_json::{json, Value};

use super::state::MockState;

/// Username of the default scenario's account.
pub const ADMIN_USERNAME: &str = "admin";
/// Password of the default scenario's account.
pub const ADMIN_PASSWORD: &str = "123123";

/// Collection of fixture factories for test data.
pub struct Fixtures;

/// A ready-made set of objects for the default server.
#[derive(Debug)]
pub struct DefaultScenario {
    /// Objects per endpoint, inserted in order.
    pub objects: Vec<(&'static str, Value)>,
}

impl Fixtures {
    // =========================================================================
    // Project Fixtures
    // =========================================================================

    /// Create a project with the given id and name.
    pub fn project(id: i64, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "slug": name.to_lowercase().replace(' ', "-"),
            "description": format!("{name} description"),
            "is_private": false,
            "total_milestones": null,
            "total_story_points": null,
        })
    }

    /// Create a status for `endpoint` kinds such as `task-statuses`.
    pub fn status(id: i64, project: i64, name: &str, is_closed: bool) -> Value {
        json!({
            "id": id,
            "project": project,
            "name": name,
            "slug": name.to_lowercase(),
            "is_closed": is_closed,
            "color": "#999999",
            "order": id,
        })
    }

    // =========================================================================
    // Work Item Fixtures
    // =========================================================================

    /// Create a user story.
    pub fn user_story(id: i64, project: i64, subject: &str) -> Value {
        json!({
            "id": id,
            "ref": id,
            "project": project,
            "subject": subject,
            "is_closed": false,
            "milestone": null,
            "tags": [],
        })
    }

    /// Create a task, optionally under a user story.
    pub fn task(id: i64, project: i64, user_story: Option<i64>, subject: &str) -> Value {
        json!({
            "id": id,
            "ref": id,
            "project": project,
            "user_story": user_story,
            "subject": subject,
            "status": 1,
            "is_closed": false,
        })
    }

    /// Create an issue.
    pub fn issue(id: i64, project: i64, subject: &str) -> Value {
        json!({
            "id": id,
            "ref": id,
            "project": project,
            "subject": subject,
            "priority": 1,
            "status": 1,
            "type": 1,
            "severity": 1,
        })
    }

    /// Create a wiki page.
    pub fn wiki_page(id: i64, project: i64, slug: &str) -> Value {
        json!({
            "id": id,
            "project": project,
            "slug": slug,
            "content": format!("# {slug}"),
        })
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    /// One project with statuses, two user stories, a task, an issue and a
    /// wiki page.
    pub fn default_scenario() -> DefaultScenario {
        DefaultScenario {
            objects: vec![
                ("projects", Self::project(1, "Test Project")),
                ("task-statuses", Self::status(1, 1, "New", false)),
                ("task-statuses", Self::status(2, 1, "Closed", true)),
                ("issue-statuses", Self::status(3, 1, "New", false)),
                ("userstory-statuses", Self::status(4, 1, "New", false)),
                ("userstories", Self::user_story(10, 1, "Login form")),
                ("userstories", Self::user_story(11, 1, "Password reset")),
                ("tasks", Self::task(20, 1, Some(10), "Design login form")),
                ("issues", Self::issue(30, 1, "Login button misaligned")),
                ("wiki", Self::wiki_page(40, 1, "home")),
            ],
        }
    }

    /// The default scenario as server state, with a loginable admin.
    pub fn default_state() -> MockState {
        Self::default_scenario()
            .objects
            .into_iter()
            .fold(
                MockState::new().with_user(ADMIN_USERNAME, ADMIN_PASSWORD, "Administrator"),
                |state, (endpoint, object)| state.with_object(endpoint, object),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_state_contents() {
        let state = Fixtures::default_state();
        assert_eq!(state.get("projects", 1).unwrap()["name"], "Test Project");

        let mut filters = HashMap::new();
        filters.insert("project".to_string(), "1".to_string());
        assert_eq!(state.list("userstories", &filters).len(), 2);
    }

    #[test]
    fn test_fixture_ids_do_not_collide_with_new_objects() {
        let mut state = Fixtures::default_state();
        let created = state.insert("projects", Fixtures::project(0, "x"));
        // explicit id 0 is kept
        assert_eq!(created["id"], 0);
        let created = state.insert("projects", json!({"name": "auto"}));
        assert_eq!(created["id"], 41);
    }
}
