use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// Number of characters kept by [`ContainerID::short`].
const SHORT_ID_LEN: usize = 12;

/// A validated container identifier.
///
/// # Examples
///
/// ```
/// # use creo_stats::container::ContainerID;
/// let raw_id = "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.short(), "abc123abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty or longer than
    /// [`CONTAINER_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    /// Returns the display form of the id: an optional `<algorithm>:` prefix is
    /// dropped and the remainder is cut to 12 characters.
    pub fn short(&self) -> &str {
        let id = self
            .0
            .split_once(':')
            .map_or(&*self.0, |(_, digest)| digest);
        match id.char_indices().nth(SHORT_ID_LEN) {
            Some((end, _)) => &id[..end],
            None => id,
        }
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A container as reported by the runtime: identity, display data and whether
/// it was running when listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    id: ContainerID,
    names: Vec<String>,
    command: String,
    running: bool,
}

impl ContainerRef {
    pub fn new(id: ContainerID, names: Vec<String>, command: String, running: bool) -> Self {
        Self {
            id,
            names,
            command,
            running,
        }
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the first name without the leading `/` docker adds, or the short
    /// id when the container has no name.
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|name| name.trim_start_matches('/'))
            .unwrap_or_else(|| self.id.short())
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_rejects_empty_and_oversized() {
        assert!(ContainerID::new("").is_err());
        assert!(ContainerID::new("a".repeat(CONTAINER_ID_MAX_LEN + 1)).is_err());
        assert!(ContainerID::new("a".repeat(CONTAINER_ID_MAX_LEN)).is_ok());
    }

    #[test]
    fn test_short_id() {
        let id = ContainerID::new("0123456789abcdef0123").unwrap();
        assert_eq!(id.short(), "0123456789ab");

        let id = ContainerID::new("sha256:0123456789abcdef").unwrap();
        assert_eq!(id.short(), "0123456789ab");

        let id = ContainerID::new("abc").unwrap();
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn test_display_name() {
        let id = ContainerID::new("0123456789abcdef0123").unwrap();
        let container = ContainerRef::new(
            id.clone(),
            vec!["/web".to_owned(), "/alias".to_owned()],
            "nginx".to_owned(),
            true,
        );
        assert_eq!(container.display_name(), "web");

        let unnamed = ContainerRef::new(id, Vec::new(), String::new(), false);
        assert_eq!(unnamed.display_name(), "0123456789ab");
        assert!(!unnamed.is_running());
    }
}
