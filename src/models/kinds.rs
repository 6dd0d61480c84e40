//! Descriptor table for every resource kind the client knows about.

use super::descriptor::Descriptor;

const ATTACHMENT_FIELDS: &[&str] = &[
    "object_id",
    "project",
    "attached_file",
    "description",
    "is_deprecated",
];

const CUSTOM_ATTRIBUTE_FIELDS: &[&str] = &["name", "description", "order", "project"];

const NAMED_IN_PROJECT: &[&str] = &["project", "name"];

pub static USER: Descriptor = Descriptor {
    name: "User",
    endpoint: "users",
    repr_attribute: "full_name",
    ..Descriptor::BASE
};

pub static MEMBERSHIP: Descriptor = Descriptor {
    name: "Membership",
    endpoint: "memberships",
    allowed_write_fields: &["email", "role", "project"],
    create_fields: &["project", "email", "role"],
    repr_attribute: "email",
    ..Descriptor::BASE
};

pub static PRIORITY: Descriptor = Descriptor {
    name: "Priority",
    endpoint: "priorities",
    allowed_write_fields: &["name", "color", "order", "project"],
    create_fields: NAMED_IN_PROJECT,
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static USER_STORY_ATTACHMENT: Descriptor = Descriptor {
    name: "UserStoryAttachment",
    endpoint: "userstories/attachments",
    ..ATTACHMENT_TEMPLATE
};

pub static USER_STORY: Descriptor = Descriptor {
    name: "UserStory",
    endpoint: "userstories",
    allowed_write_fields: &[
        "assigned_to",
        "backlog_order",
        "blocked_note",
        "client_requirement",
        "description",
        "is_archived",
        "is_blocked",
        "is_closed",
        "kanban_order",
        "milestone",
        "points",
        "project",
        "sprint_order",
        "status",
        "subject",
        "tags",
        "team_requirement",
        "watchers",
    ],
    create_fields: &["project", "subject"],
    repr_attribute: "subject",
    relation_key: Some("user_story"),
    attachments: Some(&USER_STORY_ATTACHMENT),
    custom_attributes: true,
    history_entity: Some("userstory"),
    import_type: Some("us"),
    ..Descriptor::BASE
};

pub static USER_STORY_STATUS: Descriptor = Descriptor {
    name: "UserStoryStatus",
    endpoint: "userstory-statuses",
    allowed_write_fields: &["color", "is_closed", "name", "order", "project", "wip_limit"],
    create_fields: NAMED_IN_PROJECT,
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static POINT: Descriptor = Descriptor {
    name: "Point",
    endpoint: "points",
    allowed_write_fields: &["color", "value", "name", "order", "project"],
    create_fields: &["project", "name", "value"],
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static MILESTONE: Descriptor = Descriptor {
    name: "Milestone",
    endpoint: "milestones",
    allowed_write_fields: &[
        "name",
        "project",
        "estimated_start",
        "estimated_finish",
        "disponibility",
        "slug",
        "order",
        "watchers",
    ],
    nested: &[("user_stories", &USER_STORY)],
    create_fields: &["project", "name", "estimated_start", "estimated_finish"],
    relation_key: Some("milestone"),
    import_type: Some("milestone"),
    ..Descriptor::BASE
};

pub static TASK_STATUS: Descriptor = Descriptor {
    name: "TaskStatus",
    endpoint: "task-statuses",
    allowed_write_fields: &["name", "color", "order", "project", "is_closed"],
    create_fields: NAMED_IN_PROJECT,
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static TASK_ATTACHMENT: Descriptor = Descriptor {
    name: "TaskAttachment",
    endpoint: "tasks/attachments",
    ..ATTACHMENT_TEMPLATE
};

pub static TASK: Descriptor = Descriptor {
    name: "Task",
    endpoint: "tasks",
    allowed_write_fields: &[
        "assigned_to",
        "blocked_note",
        "description",
        "is_blocked",
        "is_closed",
        "milestone",
        "project",
        "user_story",
        "status",
        "subject",
        "tags",
        "us_order",
        "taskboard_order",
        "is_iocaine",
        "external_reference",
        "watchers",
    ],
    create_fields: &["project", "subject", "status"],
    repr_attribute: "subject",
    attachments: Some(&TASK_ATTACHMENT),
    custom_attributes: true,
    history_entity: Some("task"),
    import_type: Some("task"),
    ..Descriptor::BASE
};

pub static ISSUE_TYPE: Descriptor = Descriptor {
    name: "IssueType",
    endpoint: "issue-types",
    allowed_write_fields: &["name", "color", "order", "project"],
    create_fields: NAMED_IN_PROJECT,
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static ISSUE_STATUS: Descriptor = Descriptor {
    name: "IssueStatus",
    endpoint: "issue-statuses",
    allowed_write_fields: &["name", "color", "order", "project", "is_closed"],
    create_fields: NAMED_IN_PROJECT,
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static ISSUE_ATTACHMENT: Descriptor = Descriptor {
    name: "IssueAttachment",
    endpoint: "issues/attachments",
    ..ATTACHMENT_TEMPLATE
};

pub static ISSUE: Descriptor = Descriptor {
    name: "Issue",
    endpoint: "issues",
    allowed_write_fields: &[
        "assigned_to",
        "blocked_note",
        "description",
        "is_blocked",
        "is_closed",
        "milestone",
        "project",
        "status",
        "severity",
        "priority",
        "type",
        "subject",
        "tags",
        "watchers",
    ],
    create_fields: &["project", "subject", "priority", "status", "type", "severity"],
    repr_attribute: "subject",
    attachments: Some(&ISSUE_ATTACHMENT),
    custom_attributes: true,
    history_entity: Some("issue"),
    import_type: Some("issue"),
    ..Descriptor::BASE
};

pub static ISSUE_ATTRIBUTE: Descriptor = Descriptor {
    name: "IssueAttribute",
    endpoint: "issue-custom-attributes",
    ..CUSTOM_ATTRIBUTE_TEMPLATE
};

pub static TASK_ATTRIBUTE: Descriptor = Descriptor {
    name: "TaskAttribute",
    endpoint: "task-custom-attributes",
    ..CUSTOM_ATTRIBUTE_TEMPLATE
};

pub static USER_STORY_ATTRIBUTE: Descriptor = Descriptor {
    name: "UserStoryAttribute",
    endpoint: "userstory-custom-attributes",
    ..CUSTOM_ATTRIBUTE_TEMPLATE
};

pub static EPIC_ATTRIBUTE: Descriptor = Descriptor {
    name: "EpicAttribute",
    endpoint: "epic-custom-attributes",
    ..CUSTOM_ATTRIBUTE_TEMPLATE
};

pub static SEVERITY: Descriptor = Descriptor {
    name: "Severity",
    endpoint: "severities",
    allowed_write_fields: &["name", "color", "order", "project"],
    create_fields: NAMED_IN_PROJECT,
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static ROLE: Descriptor = Descriptor {
    name: "Role",
    endpoint: "roles",
    allowed_write_fields: &["name", "slug", "order", "computable"],
    create_fields: NAMED_IN_PROJECT,
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static PROJECT: Descriptor = Descriptor {
    name: "Project",
    endpoint: "projects",
    allowed_write_fields: &[
        "name",
        "description",
        "creation_template",
        "is_backlog_activated",
        "is_issues_activated",
        "is_kanban_activated",
        "is_private",
        "is_wiki_activated",
        "videoconferences",
        "videoconferences_salt",
        "total_milestones",
        "total_story_points",
    ],
    nested: &[
        ("users", &USER),
        ("priorities", &PRIORITY),
        ("issue_statuses", &ISSUE_STATUS),
        ("issue_types", &ISSUE_TYPE),
        ("task_statuses", &TASK_STATUS),
        ("severities", &SEVERITY),
        ("roles", &ROLE),
        ("points", &POINT),
        ("us_statuses", &USER_STORY_STATUS),
    ],
    create_fields: &["name", "description"],
    relation_key: Some("project"),
    ..Descriptor::BASE
};

pub static WIKI_ATTACHMENT: Descriptor = Descriptor {
    name: "WikiAttachment",
    endpoint: "wiki/attachments",
    ..ATTACHMENT_TEMPLATE
};

pub static WIKI_PAGE: Descriptor = Descriptor {
    name: "WikiPage",
    endpoint: "wiki",
    allowed_write_fields: &["project", "slug", "content", "watchers"],
    create_fields: &["project", "slug", "content"],
    repr_attribute: "slug",
    attachments: Some(&WIKI_ATTACHMENT),
    history_entity: Some("wiki"),
    import_type: Some("wiki_page"),
    ..Descriptor::BASE
};

pub static WIKI_LINK: Descriptor = Descriptor {
    name: "WikiLink",
    endpoint: "wiki-links",
    allowed_write_fields: &["project", "title", "href", "order"],
    create_fields: &["project", "title", "href"],
    repr_attribute: "title",
    ..Descriptor::BASE
};

pub static EPIC_ATTACHMENT: Descriptor = Descriptor {
    name: "EpicAttachment",
    endpoint: "epics/attachments",
    ..ATTACHMENT_TEMPLATE
};

pub static EPIC: Descriptor = Descriptor {
    name: "Epic",
    endpoint: "epics",
    allowed_write_fields: &[
        "assigned_to",
        "blocked_note",
        "description",
        "is_blocked",
        "is_closed",
        "color",
        "project",
        "subject",
        "tags",
        "watchers",
    ],
    create_fields: &["project", "subject"],
    repr_attribute: "subject",
    attachments: Some(&EPIC_ATTACHMENT),
    custom_attributes: true,
    history_entity: Some("epic"),
    import_type: Some("ep"),
    ..Descriptor::BASE
};

pub static EPIC_STATUS: Descriptor = Descriptor {
    name: "EpicStatus",
    endpoint: "epic-statuses",
    allowed_write_fields: &["name", "slug", "order", "is_closed", "color", "project"],
    create_fields: NAMED_IN_PROJECT,
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static SWIMLANE: Descriptor = Descriptor {
    name: "SwimLane",
    endpoint: "swimlanes",
    allowed_write_fields: &["name", "order", "project"],
    create_fields: NAMED_IN_PROJECT,
    requires_move_to: true,
    ..Descriptor::BASE
};

pub static WEBHOOK: Descriptor = Descriptor {
    name: "Webhook",
    endpoint: "webhooks",
    allowed_write_fields: &["name", "url", "key"],
    create_fields: &["project", "name", "url", "key"],
    ..Descriptor::BASE
};

const ATTACHMENT_TEMPLATE: Descriptor = Descriptor {
    allowed_write_fields: ATTACHMENT_FIELDS,
    create_fields: &["project", "object_id"],
    repr_attribute: "subject",
    is_attachment: true,
    ..Descriptor::BASE
};

const CUSTOM_ATTRIBUTE_TEMPLATE: Descriptor = Descriptor {
    allowed_write_fields: CUSTOM_ATTRIBUTE_FIELDS,
    create_fields: NAMED_IN_PROJECT,
    ..Descriptor::BASE
};

/// Every known kind, in table order.
pub static ALL: &[&Descriptor] = &[
    &USER,
    &MEMBERSHIP,
    &PRIORITY,
    &USER_STORY_ATTACHMENT,
    &USER_STORY,
    &USER_STORY_STATUS,
    &POINT,
    &MILESTONE,
    &TASK_STATUS,
    &TASK_ATTACHMENT,
    &TASK,
    &ISSUE_TYPE,
    &ISSUE_STATUS,
    &ISSUE_ATTACHMENT,
    &ISSUE,
    &ISSUE_ATTRIBUTE,
    &TASK_ATTRIBUTE,
    &USER_STORY_ATTRIBUTE,
    &EPIC_ATTRIBUTE,
    &SEVERITY,
    &ROLE,
    &PROJECT,
    &WIKI_ATTACHMENT,
    &WIKI_PAGE,
    &WIKI_LINK,
    &EPIC_ATTACHMENT,
    &EPIC,
    &EPIC_STATUS,
    &SWIMLANE,
    &WEBHOOK,
];

/// Find a kind by its collection endpoint.
pub fn by_endpoint(endpoint: &str) -> Option<&'static Descriptor> {
    ALL.iter().copied().find(|kind| kind.endpoint == endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_unique() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a.endpoint, b.endpoint, "{} and {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_move_to_kinds() {
        let move_to: Vec<&str> = ALL
            .iter()
            .filter(|k| k.requires_move_to)
            .map(|k| k.endpoint)
            .collect();
        assert_eq!(
            move_to,
            vec![
                "priorities",
                "userstory-statuses",
                "points",
                "task-statuses",
                "issue-types",
                "issue-statuses",
                "severities",
                "roles",
                "epic-statuses",
                "swimlanes",
            ]
        );
    }

    #[test]
    fn test_write_fields_never_contain_id() {
        for kind in ALL {
            assert!(!kind.is_writable("id"), "{}", kind.name);
        }
    }

    #[test]
    fn test_by_endpoint() {
        assert_eq!(by_endpoint("issue-types"), Some(&ISSUE_TYPE));
        assert_eq!(by_endpoint("nowhere"), None);
    }
}
