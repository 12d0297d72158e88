use crate::error::{Error, Result};

/// An empty `match-any` traffic class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMap {
    pub name: String,
    pub description: String,
}

impl ClassMap {
    pub fn new(name: &str, description: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::invalid("class-map name", name, "must not be empty"));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::invalid("class-map name", name, "must be a single word"));
        }
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_map_name_rules() {
        assert!(ClassMap::new("VOICE", "Voice bearer traffic").is_ok());
        assert!(ClassMap::new("", "x").is_err());
        assert!(ClassMap::new("two words", "x").is_err());
    }
}
