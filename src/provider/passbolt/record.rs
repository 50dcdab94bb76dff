use crate::crd::FieldName;
use std::fmt;
use zeroize::Zeroizing;

/// Everything Passbolt returns for one resource ID
///
/// Only lives for the duration of a pass. The password is wiped on drop.
#[derive(Clone, Default)]
pub struct ResolvedSecret {
    pub id: String,
    pub name: String,
    pub username: String,
    pub uri: String,
    pub password: Zeroizing<String>,
    pub description: String,
    pub folder_parent_id: String,
}

impl ResolvedSecret {
    #[must_use]
    pub fn field(&self, field: FieldName) -> &str {
        match field {
            FieldName::Username => &self.username,
            FieldName::Password => &self.password,
            FieldName::Uri => &self.uri,
        }
    }
}

impl fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("uri", &self.uri)
            .field("password", &"<redacted>")
            .field("folder_parent_id", &self.folder_parent_id)
            .finish_non_exhaustive()
    }
}
