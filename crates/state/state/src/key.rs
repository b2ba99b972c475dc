use serde::{Deserialize, Serialize};

/// The kind of entry being stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// A drop record addressed by its access code.
    Drop,
    Custom(String),
}

impl KeyKind {
    /// Return a string representation of the key kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Drop => "drop",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key used to address entries in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub kind: KeyKind,
    pub id: String,
}

impl StateKey {
    /// Create a new state key.
    #[must_use]
    pub fn new(kind: KeyKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Key of the drop record for an (already normalized) access code.
    #[must_use]
    pub fn drop(code: impl Into<String>) -> Self {
        Self::new(KeyKind::Drop, code)
    }

    /// Return a canonical string representation: `kind:id`
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }

    /// Parse a canonical `kind:id` string back into a key.
    #[must_use]
    pub fn parse(canonical: &str) -> Option<Self> {
        let (kind, id) = canonical.split_once(':')?;
        if id.is_empty() {
            return None;
        }
        let kind = match kind {
            "drop" => KeyKind::Drop,
            "" => return None,
            other => KeyKind::Custom(other.to_owned()),
        };
        Some(Self::new(kind, id))
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}
