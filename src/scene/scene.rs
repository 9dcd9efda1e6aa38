//! Scene identifier type.

use serde::{Deserialize, Serialize};

/// Unique identifier for a scene.
///
/// Scene IDs are strings that name a loadable unit of content. They're used when
/// requesting a switch via [`SceneTransitionDriver::request_scene`](super::SceneTransitionDriver::request_scene)
/// and when registering scenes with an [`AssetStore`](crate::AssetStore).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub(crate) String);

impl SceneId {
    /// Create a new scene ID from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the scene ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SceneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for SceneId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SceneId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_id_compares_with_str() {
        let id = SceneId::from("scene2");
        assert_eq!(id, "scene2");
        assert_eq!(id.as_str(), "scene2");
        assert_eq!(id.to_string(), "scene2");
    }

    #[test]
    fn scene_id_deserializes_from_plain_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            id: SceneId,
        }

        let w: Wrapper = toml::from_str(r#"id = "menu""#).unwrap();
        assert_eq!(w.id, SceneId::new("menu"));
    }
}
