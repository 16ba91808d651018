//! The signed-in player, if any.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Who is playing. Players without an identity can play but not save scores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, new)]
pub struct PlayerIdentity {
    id: String,
    display_name: String,
    photo_url: Option<String>,
}

impl PlayerIdentity {
    /// Creates a local identity whose id is derived from the display name.
    ///
    /// The id is lowercase with whitespace runs collapsed to `-`, so
    /// `"Ada Lovelace"` becomes `"ada-lovelace"`.
    #[instrument]
    pub fn local(display_name: &str) -> Self {
        let id = display_name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        let display_name = display_name.trim();
        let display_name = if display_name.is_empty() {
            "Anonymous".to_string()
        } else {
            display_name.to_string()
        };
        let id = if id.is_empty() {
            "anonymous".to_string()
        } else {
            id
        };
        Self::new(id, display_name, None)
    }
}
