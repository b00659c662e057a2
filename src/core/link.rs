//! Reference classification utilities.

/// Syntactic classification of a reference string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind<'a> {
    /// Reference with a URL scheme (https:, data:, javascript:) or a
    /// protocol-relative `//host/...` prefix. Never a local asset.
    External(&'a str),
    /// Site-root path (`/img/a.png`) or a non-path token (`{{ $static }}/a.js`)
    /// that is used verbatim as a file identity.
    Identity(&'a str),
    /// Directory-relative path (`a.png`, `./a.png`, `../img/a.png`).
    Relative(&'a str),
}

impl<'a> LinkKind<'a> {
    /// Parse a reference string into its syntactic kind.
    #[inline]
    pub fn parse(raw: &'a str) -> Self {
        if is_external_reference(raw) {
            Self::External(raw)
        } else if starts_relative(raw) {
            Self::Relative(raw)
        } else {
            Self::Identity(raw)
        }
    }
}

/// Check whether a reference points outside the build (network scheme or
/// protocol-relative URL).
#[inline]
pub fn is_external_reference(raw: &str) -> bool {
    if raw.starts_with("//") {
        return true;
    }
    raw.find(':').is_some_and(|pos| {
        pos > 1
            && raw[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// A reference is directory-relative when it starts with a word character,
/// `./` or `../`.
#[inline]
fn starts_relative(raw: &str) -> bool {
    raw.chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_external() {
        for raw in [
            "https://cdn.example.com/a.css",
            "http://example.com/a.js",
            "data:image/png;base64,AAAA",
            "javascript:void(0)",
            "//cdn.example.com/a.js",
            "HTTPS://EXAMPLE.COM/A.CSS",
        ] {
            assert!(matches!(LinkKind::parse(raw), LinkKind::External(_)), "{raw}");
        }
    }

    #[test]
    fn test_parse_relative() {
        assert_eq!(LinkKind::parse("a.png"), LinkKind::Relative("a.png"));
        assert_eq!(LinkKind::parse("./a.png"), LinkKind::Relative("./a.png"));
        assert_eq!(
            LinkKind::parse("../img/a.png"),
            LinkKind::Relative("../img/a.png")
        );
        assert_eq!(LinkKind::parse("_x/a.png"), LinkKind::Relative("_x/a.png"));
    }

    #[test]
    fn test_parse_identity() {
        assert_eq!(
            LinkKind::parse("/img/a.png"),
            LinkKind::Identity("/img/a.png")
        );
        assert_eq!(
            LinkKind::parse("{{ $static }}/a.js"),
            LinkKind::Identity("{{ $static }}/a.js")
        );
        assert_eq!(LinkKind::parse("${root}/a.js"), LinkKind::Identity("${root}/a.js"));
    }

    #[test]
    fn test_single_letter_scheme_is_not_external() {
        // Drive letters are paths, not schemes.
        assert!(!is_external_reference("c:/assets/a.css"));
    }
}
