use std::fmt;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// A typed value stored in or compared against a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    Int(i32),
    Str(String),
}

impl Constant {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Constant::Int(v) => Some(*v),
            Constant::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Int(_) => None,
            Constant::Str(s) => Some(s),
        }
    }

    /// FNV-1a hash of the value's encoding. Unlike `std::hash::Hash` the
    /// result never changes between builds, so it can decide where a value
    /// is stored on disk.
    pub fn hash_code(&self) -> u32 {
        let (tag, bytes): (u8, Vec<u8>) = match self {
            Constant::Int(v) => (0, v.to_be_bytes().to_vec()),
            Constant::Str(s) => (1, s.as_bytes().to_vec()),
        };
        std::iter::once(tag)
            .chain(bytes)
            .fold(FNV_OFFSET, |hash, b| (hash ^ b as u32).wrapping_mul(FNV_PRIME))
    }
}

impl From<i32> for Constant {
    fn from(v: i32) -> Self {
        Constant::Int(v)
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Constant::Str(s.to_string())
    }
}

impl From<String> for Constant {
    fn from(s: String) -> Self {
        Constant::Str(s)
    }
}

/// Formats as a SQL literal.
impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_code_is_stable() {
        assert_eq!(Constant::Int(10).hash_code(), Constant::from(10).hash_code());
        assert_eq!(
            Constant::from("rec10").hash_code(),
            Constant::Str("rec10".into()).hash_code()
        );
        assert_ne!(Constant::Int(1).hash_code(), Constant::Int(2).hash_code());
        // fixed value pins the function across builds
        assert_eq!(Constant::Str(String::new()).hash_code(), 0x040c_5b8c);
    }

    #[test]
    fn test_display_quotes_strings() {
        assert_eq!(Constant::Int(-4).to_string(), "-4");
        assert_eq!(Constant::from("it's").to_string(), "'it''s'");
    }
}
