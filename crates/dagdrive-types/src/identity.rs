use serde::{Deserialize, Serialize};

/// Identity of the local store node.
///
/// The `id` is the name under which the node publishes its own root, so a
/// root configured as `/ipns/local/...` is rewritten to `/ipns/<id>/...`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "AgentVersion", default)]
    pub agent_version: Option<String>,
}

impl Identity {
    /// Identity with no agent version.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_version: None,
        }
    }
}
