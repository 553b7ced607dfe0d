use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandleError {
    #[error("shader identifier must not be empty")]
    Empty,
    #[error("shader identifier missing after 'shadertoy://' scheme")]
    MissingAfterScheme,
    #[error("unable to extract shader id from '{0}'")]
    UnrecognisedUrl(String),
    #[error("shader identifier '{0}' contains characters outside [A-Za-z0-9_-]")]
    InvalidCharacters(String),
}

/// Reduces `ID`, `shadertoy://ID` and `https://www.shadertoy.com/view/ID`
/// to the bare identifier.
pub fn normalize_shader_id(input: &str) -> Result<String, HandleError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(HandleError::Empty);
    }

    let id = if let Some(rest) = trimmed.strip_prefix("shadertoy://") {
        let id = rest.trim().trim_end_matches('/');
        if id.is_empty() {
            return Err(HandleError::MissingAfterScheme);
        }
        id
    } else if trimmed.contains("shadertoy.com") {
        let without_suffix = trimmed
            .split(&['?', '#'][..])
            .next()
            .unwrap_or(trimmed);
        without_suffix
            .split('/')
            .rev()
            .find(|segment| !segment.is_empty())
            .filter(|segment| !segment.contains("shadertoy.com"))
            .ok_or_else(|| HandleError::UnrecognisedUrl(trimmed.to_string()))?
    } else {
        trimmed
    };

    if !id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(HandleError::InvalidCharacters(id.to_string()));
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_id_passes_through() {
        assert_eq!(normalize_shader_id("  mslfWr ").unwrap(), "mslfWr");
    }

    #[test]
    fn strips_scheme() {
        assert_eq!(normalize_shader_id("shadertoy://3dXyWj").unwrap(), "3dXyWj");
        assert_eq!(
            normalize_shader_id("shadertoy://").unwrap_err(),
            HandleError::MissingAfterScheme
        );
    }

    #[test]
    fn extracts_id_from_view_url() {
        assert_eq!(
            normalize_shader_id("https://www.shadertoy.com/view/dt3GDl?tab=code#top").unwrap(),
            "dt3GDl"
        );
        assert_eq!(
            normalize_shader_id("https://www.shadertoy.com/view/7lKSWW/").unwrap(),
            "7lKSWW"
        );
    }

    #[test]
    fn rejects_host_only_url() {
        assert!(matches!(
            normalize_shader_id("https://www.shadertoy.com/"),
            Err(HandleError::UnrecognisedUrl(_))
        ));
    }

    #[test]
    fn rejects_empty_and_odd_characters() {
        assert_eq!(normalize_shader_id("   ").unwrap_err(), HandleError::Empty);
        assert!(matches!(
            normalize_shader_id("abc def"),
            Err(HandleError::InvalidCharacters(_))
        ));
    }
}
