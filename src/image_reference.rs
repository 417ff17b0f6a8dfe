use std::fmt;

/// Fully qualified, tag-addressed reference to a container image in a
/// registry. Digest references are rejected: the pipeline always deploys by
/// tag and overwrites that tag on every push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub registry: String,
    pub repository: String,
    pub tag: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ImageReferenceError {
    MissingRegistry,
    MissingRepository,
    MissingTag,
    DigestNotAllowed,
    InvalidCharacter(String),
}

impl std::error::Error for ImageReferenceError {}
impl fmt::Display for ImageReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageReferenceError::MissingRegistry => write!(f, "registry is missing"),
            ImageReferenceError::MissingRepository => write!(f, "repository is missing"),
            ImageReferenceError::MissingTag => write!(f, "tag is missing"),
            ImageReferenceError::DigestNotAllowed => write!(f, "digest references are not allowed"),
            ImageReferenceError::InvalidCharacter(part) => {
                write!(f, "invalid character in image reference part: {}", part)
            }
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.registry, self.repository, self.tag)
    }
}

impl ImageReference {
    pub fn new(registry: &str, repository: &str, tag: &str) -> Result<Self, ImageReferenceError> {
        if registry.is_empty() {
            return Err(ImageReferenceError::MissingRegistry);
        }
        if repository.is_empty() {
            return Err(ImageReferenceError::MissingRepository);
        }
        if tag.is_empty() {
            return Err(ImageReferenceError::MissingTag);
        }
        for part in [registry, repository, tag] {
            if part.contains('@') {
                return Err(ImageReferenceError::DigestNotAllowed);
            }
            if part.contains(char::is_whitespace) {
                return Err(ImageReferenceError::InvalidCharacter(part.to_string()));
            }
        }
        // A colon in the tag would make the rendered reference ambiguous
        if tag.contains(':') || tag.contains('/') {
            return Err(ImageReferenceError::InvalidCharacter(tag.to_string()));
        }

        Ok(Self {
            registry: registry.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_registry_repository_and_tag() {
        let reference = ImageReference::new(
            "123456789012.dkr.ecr.us-west-2.amazonaws.com",
            "opencap-processing/squat-analysis",
            "latest",
        )
        .expect("reference should be valid");
        assert_eq!(
            reference.to_string(),
            "123456789012.dkr.ecr.us-west-2.amazonaws.com/opencap-processing/squat-analysis:latest"
        );
    }

    #[test]
    fn test_rejects_empty_parts() {
        assert_eq!(
            ImageReference::new("", "repo", "latest"),
            Err(ImageReferenceError::MissingRegistry)
        );
        assert_eq!(
            ImageReference::new("registry.example.com", "", "latest"),
            Err(ImageReferenceError::MissingRepository)
        );
        assert_eq!(
            ImageReference::new("registry.example.com", "repo", ""),
            Err(ImageReferenceError::MissingTag)
        );
    }

    #[test]
    fn test_rejects_digest_references() {
        assert_eq!(
            ImageReference::new("registry.example.com", "repo", "sha256@abc"),
            Err(ImageReferenceError::DigestNotAllowed)
        );
    }

    #[test]
    fn test_rejects_whitespace_and_separator_characters() {
        assert!(matches!(
            ImageReference::new("registry.example.com", "my repo", "latest"),
            Err(ImageReferenceError::InvalidCharacter(_))
        ));
        assert!(matches!(
            ImageReference::new("registry.example.com", "repo", "v1:2"),
            Err(ImageReferenceError::InvalidCharacter(_))
        ));
    }
}
