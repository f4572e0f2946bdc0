use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};
use rand::Rng;
use std::fmt::{Debug, Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique document identifier: 24 lowercase hex characters.
///
/// The first 8 characters encode the unix timestamp in seconds at generation
/// time, so freshly generated ids sort roughly by creation time; the remaining
/// 16 characters are random.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(String);

impl ObjectId {
    /// Generates a fresh id.
    pub fn generate() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut rng = rand::thread_rng();
        let suffix: u64 = rng.gen();
        ObjectId(format!("{:08x}{:016x}", seconds as u32, suffix))
    }

    /// Parses and validates an id from its hex representation.
    pub fn parse(raw: &str) -> MongoliteResult<Self> {
        if raw.len() != 24 || !raw.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()) {
            log::error!("Invalid object id '{}'", raw);
            return Err(MongoliteError::new(
                &format!("Invalid object id '{}'", raw),
                ErrorKind::InvalidId,
            ));
        }
        Ok(ObjectId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_format() {
        let id = ObjectId::generate();
        let raw = id.to_string();
        assert_eq!(raw.len(), 24);
        assert!(raw.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_unique() {
        let a = ObjectId::generate();
        let b = ObjectId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamp_prefix() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;
        let id = ObjectId::generate();
        let prefix = u32::from_str_radix(&id.to_string()[..8], 16).unwrap();
        assert!(prefix >= before);
        assert!(prefix <= before + 2);
    }

    #[test]
    fn test_parse_valid() {
        let id = ObjectId::generate();
        let parsed = ObjectId::parse(id.as_str()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(ObjectId::parse("short").is_err());
        assert!(ObjectId::parse("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        assert!(ObjectId::parse("ABCDEF0123456789ABCDEF01").is_err());
        let err = ObjectId::parse("").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
    }
}
