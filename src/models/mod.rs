//! Taiga resource model: descriptors, instances and the façades over them.

mod attachment;
mod collection;
mod custom_attributes;
mod descriptor;
mod history;
pub mod kinds;
mod related;
mod resource;
mod search;
mod searchable;

pub use attachment::AttachedFile;
pub use collection::Collection;
pub use descriptor::Descriptor;
pub use history::{History, HistoryEntity};
pub use resource::{Field, Resource};
pub use search::SearchResult;
pub use searchable::SearchableList;

use crate::client::TaigaClient;

impl TaigaClient {
    /// Collection façade for any kind.
    pub fn collection(&self, kind: &'static Descriptor) -> Collection {
        Collection::new(self, kind)
    }

    /// Access to change history and comments.
    pub fn history(&self) -> History {
        History::new(self)
    }

    pub fn projects(&self) -> Collection {
        self.collection(&kinds::PROJECT)
    }

    pub fn users(&self) -> Collection {
        self.collection(&kinds::USER)
    }

    pub fn memberships(&self) -> Collection {
        self.collection(&kinds::MEMBERSHIP)
    }

    pub fn user_stories(&self) -> Collection {
        self.collection(&kinds::USER_STORY)
    }

    pub fn user_story_attachments(&self) -> Collection {
        self.collection(&kinds::USER_STORY_ATTACHMENT)
    }

    pub fn user_story_statuses(&self) -> Collection {
        self.collection(&kinds::USER_STORY_STATUS)
    }

    pub fn user_story_attributes(&self) -> Collection {
        self.collection(&kinds::USER_STORY_ATTRIBUTE)
    }

    pub fn tasks(&self) -> Collection {
        self.collection(&kinds::TASK)
    }

    pub fn task_attachments(&self) -> Collection {
        self.collection(&kinds::TASK_ATTACHMENT)
    }

    pub fn task_statuses(&self) -> Collection {
        self.collection(&kinds::TASK_STATUS)
    }

    pub fn task_attributes(&self) -> Collection {
        self.collection(&kinds::TASK_ATTRIBUTE)
    }

    pub fn issues(&self) -> Collection {
        self.collection(&kinds::ISSUE)
    }

    pub fn issue_attachments(&self) -> Collection {
        self.collection(&kinds::ISSUE_ATTACHMENT)
    }

    pub fn issue_statuses(&self) -> Collection {
        self.collection(&kinds::ISSUE_STATUS)
    }

    pub fn issue_types(&self) -> Collection {
        self.collection(&kinds::ISSUE_TYPE)
    }

    pub fn issue_attributes(&self) -> Collection {
        self.collection(&kinds::ISSUE_ATTRIBUTE)
    }

    pub fn epics(&self) -> Collection {
        self.collection(&kinds::EPIC)
    }

    pub fn epic_attachments(&self) -> Collection {
        self.collection(&kinds::EPIC_ATTACHMENT)
    }

    pub fn epic_statuses(&self) -> Collection {
        self.collection(&kinds::EPIC_STATUS)
    }

    pub fn epic_attributes(&self) -> Collection {
        self.collection(&kinds::EPIC_ATTRIBUTE)
    }

    pub fn milestones(&self) -> Collection {
        self.collection(&kinds::MILESTONE)
    }

    pub fn points(&self) -> Collection {
        self.collection(&kinds::POINT)
    }

    pub fn priorities(&self) -> Collection {
        self.collection(&kinds::PRIORITY)
    }

    pub fn severities(&self) -> Collection {
        self.collection(&kinds::SEVERITY)
    }

    pub fn roles(&self) -> Collection {
        self.collection(&kinds::ROLE)
    }

    pub fn swimlanes(&self) -> Collection {
        self.collection(&kinds::SWIMLANE)
    }

    pub fn wikipages(&self) -> Collection {
        self.collection(&kinds::WIKI_PAGE)
    }

    pub fn wiki_attachments(&self) -> Collection {
        self.collection(&kinds::WIKI_ATTACHMENT)
    }

    pub fn wikilinks(&self) -> Collection {
        self.collection(&kinds::WIKI_LINK)
    }

    pub fn webhooks(&self) -> Collection {
        self.collection(&kinds::WEBHOOK)
    }
}
