//! Artifact naming conventions.
//!
//! Images are keyed by the SHA-256 of their prompt, so identical prompts map
//! to the same file. Documents are named either from a sanitised title
//! (same title overwrites) or from a content hash.

use crate::error::CoreError;
use crate::hashing::{prompt_hash, sha256_hex};

/// Filename prefix for generated images.
pub const IMAGE_PREFIX: &str = "generated_image_";

/// Stem used when a title sanitises to nothing.
pub const UNTITLED: &str = "untitled";

/// Characters that may not appear in a document filename.
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// How document filenames are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentNaming {
    /// Sanitised title. Documents with the same title overwrite each other.
    #[default]
    Title,
    /// SHA-256 of title, body and image reference.
    ContentHash,
}

impl DocumentNaming {
    /// Parse from a configuration value (`"title"` or `"content_hash"`).
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "content_hash" | "content-hash" | "hash" => Ok(Self::ContentHash),
            other => Err(CoreError::Validation(format!(
                "Unknown document naming '{other}'. Must be one of: title, content_hash"
            ))),
        }
    }
}

/// Image filename for a prompt: `generated_image_{sha256(prompt)}.png`.
///
/// # Examples
///
/// ```
/// use storyloom_core::naming::image_filename;
///
/// let name = image_filename("a red fox");
/// assert!(name.starts_with("generated_image_"));
/// assert!(name.ends_with(".png"));
/// assert_eq!(name, image_filename("a red fox"));
/// ```
pub fn image_filename(prompt: &str) -> String {
    format!("{IMAGE_PREFIX}{}.png", prompt_hash(prompt))
}

/// Turn a title into a safe filename stem.
///
/// Path separators, reserved and control characters become `_`; leading and
/// trailing dots and whitespace are trimmed. Everything else, including
/// non-ASCII letters, is kept.
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Document filename (`{stem}.pdf`) under the given naming policy.
pub fn document_filename(
    naming: DocumentNaming,
    title: &str,
    body: &str,
    image: Option<&str>,
) -> String {
    let stem = match naming {
        DocumentNaming::Title => sanitize_title(title),
        DocumentNaming::ContentHash => {
            let mut material = Vec::with_capacity(title.len() + body.len() + 2);
            material.extend_from_slice(title.as_bytes());
            material.push(0);
            material.extend_from_slice(body.as_bytes());
            material.push(0);
            material.extend_from_slice(image.unwrap_or_default().as_bytes());
            sha256_hex(&material)
        }
    };
    format!("{stem}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_name_depends_only_on_prompt() {
        assert_eq!(image_filename("castle"), image_filename("castle"));
        assert_ne!(image_filename("castle"), image_filename("Castle"));
    }

    #[test]
    fn plain_title_unchanged() {
        assert_eq!(sanitize_title("The Lost Key"), "The Lost Key");
    }

    #[test]
    fn path_traversal_is_neutralised() {
        assert_eq!(sanitize_title("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_title("a\\b:c"), "a_b_c");
    }

    #[test]
    fn control_characters_replaced() {
        assert_eq!(sanitize_title("line\nbreak\t"), "line_break_");
    }

    #[test]
    fn empty_title_becomes_untitled() {
        assert_eq!(sanitize_title(""), UNTITLED);
        assert_eq!(sanitize_title(" . . "), UNTITLED);
    }

    #[test]
    fn unicode_title_kept() {
        assert_eq!(sanitize_title("Élan vital"), "Élan vital");
    }

    #[test]
    fn title_naming_collides_on_same_title() {
        let a = document_filename(DocumentNaming::Title, "Tale", "one", None);
        let b = document_filename(DocumentNaming::Title, "Tale", "two", Some("x.png"));
        assert_eq!(a, "Tale.pdf");
        assert_eq!(a, b);
    }

    #[test]
    fn content_hash_naming_separates_content() {
        let a = document_filename(DocumentNaming::ContentHash, "Tale", "one", None);
        let b = document_filename(DocumentNaming::ContentHash, "Tale", "two", None);
        let c = document_filename(DocumentNaming::ContentHash, "Tale", "one", Some("x.png"));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64 + ".pdf".len());
    }

    #[test]
    fn naming_parses_from_config() {
        assert_eq!(DocumentNaming::from_name("title").unwrap(), DocumentNaming::Title);
        assert_eq!(
            DocumentNaming::from_name(" Content_Hash ").unwrap(),
            DocumentNaming::ContentHash
        );
        assert!(DocumentNaming::from_name("uuid").is_err());
    }
}
