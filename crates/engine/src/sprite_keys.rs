use thiserror::Error;

/// Sprite keys are asset-relative paths without extension, e.g. `npcs/maire`
/// or `objet/Blé`. Item ids come straight from map data, so non-ASCII letters
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must not start with '/'")]
    LeadingSlash,
    #[error("sprite key must not contain '\\\\'")]
    Backslash,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains an empty path segment")]
    EmptySegment,
    #[error("sprite key contains invalid character {character:?}")]
    InvalidCharacter { character: char },
}

pub(crate) fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(SpriteKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(SpriteKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    if key.split('/').any(str::is_empty) {
        return Err(SpriteKeyError::EmptySegment);
    }
    for ch in key.chars() {
        if ch.is_alphanumeric() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(SpriteKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_asset_relative_keys() {
        for key in [
            "player/player_front_0",
            "npcs/maire",
            "objet/Blé",
            "tilesets/village.v2",
        ] {
            assert!(validate_sprite_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_keys_escaping_the_asset_root() {
        assert_eq!(validate_sprite_key(""), Err(SpriteKeyError::Empty));
        assert_eq!(validate_sprite_key("/etc"), Err(SpriteKeyError::LeadingSlash));
        assert_eq!(validate_sprite_key(r"a\b"), Err(SpriteKeyError::Backslash));
        assert_eq!(
            validate_sprite_key("objet/../secret"),
            Err(SpriteKeyError::ParentTraversal)
        );
        assert_eq!(validate_sprite_key("npcs//maire"), Err(SpriteKeyError::EmptySegment));
        assert_eq!(
            validate_sprite_key("c:drive"),
            Err(SpriteKeyError::InvalidCharacter { character: ':' })
        );
    }
}
