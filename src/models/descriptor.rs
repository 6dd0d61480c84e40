//! Static per-kind resource descriptors.

use std::fmt;

/// Everything the generic façades need to know about one resource kind.
///
/// Descriptors are plain static data. A kind is identified by the address
/// of its descriptor, so two descriptors with the same endpoint are still
/// different kinds.
pub struct Descriptor {
    /// Type name used in `Display` fallbacks, e.g. `UserStory`.
    pub name: &'static str,
    /// Collection path relative to the API prefix, e.g. `userstories`.
    pub endpoint: &'static str,
    /// Fields sent back to the server on `update`.
    pub allowed_write_fields: &'static [&'static str],
    /// Fields parsed recursively into instances of another kind.
    pub nested: &'static [(&'static str, &'static Descriptor)],
    /// Fields `create` insists on, in the order they are usually given.
    pub create_fields: &'static [&'static str],
    /// Field printed by `Display`.
    pub repr_attribute: &'static str,
    /// Deleting an instance needs a replacement id (`moveTo`).
    pub requires_move_to: bool,
    /// Field children of this kind use to point back at it.
    pub relation_key: Option<&'static str>,
    /// Collection that stores files attached to this kind.
    pub attachments: Option<&'static Descriptor>,
    /// This kind is itself an attachment collection; creating one needs a
    /// file.
    pub is_attachment: bool,
    /// Instances expose `custom-attributes-values`.
    pub custom_attributes: bool,
    /// Entity name under the `history` endpoint.
    pub history_entity: Option<&'static str>,
    /// Type segment of `importer/{project}/{type}`.
    pub import_type: Option<&'static str>,
}

impl Descriptor {
    /// Template the other descriptors are built from.
    pub(crate) const BASE: Descriptor = Descriptor {
        name: "",
        endpoint: "",
        allowed_write_fields: &[],
        nested: &[],
        create_fields: &[],
        repr_attribute: "name",
        requires_move_to: false,
        relation_key: None,
        attachments: None,
        is_attachment: false,
        custom_attributes: false,
        history_entity: None,
        import_type: None,
    };

    /// Descriptor used to parse the nested field `key`, if any.
    pub fn nested_kind(&self, key: &str) -> Option<&'static Descriptor> {
        self.nested
            .iter()
            .find(|(field, _)| *field == key)
            .map(|(_, kind)| *kind)
    }

    /// Returns true if `key` may be sent on `update`.
    pub fn is_writable(&self, key: &str) -> bool {
        self.allowed_write_fields.contains(&key)
    }

    /// Returns true for attachment collections.
    pub fn is_attachment(&self) -> bool {
        self.is_attachment
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Descriptor {}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
