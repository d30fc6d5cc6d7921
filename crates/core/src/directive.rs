//! Enhancement directives and the deterministic mock rewrite.

use std::fmt;
use std::str::FromStr;

/// The fixed set of rewriting directives a client can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnhancementType {
    Simplify,
    Storytelling,
    Professional,
    Accessible,
    Engaging,
    Concise,
    Elaborate,
    Academic,
    Creative,
}

impl EnhancementType {
    /// Every directive, in display order.
    pub const ALL: [EnhancementType; 9] = [
        Self::Simplify,
        Self::Storytelling,
        Self::Professional,
        Self::Accessible,
        Self::Engaging,
        Self::Concise,
        Self::Elaborate,
        Self::Academic,
        Self::Creative,
    ];

    /// Resolve a client-supplied tag. Tags are matched exactly.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// The wire tag for this directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simplify => "simplify",
            Self::Storytelling => "storytelling",
            Self::Professional => "professional",
            Self::Accessible => "accessible",
            Self::Engaging => "engaging",
            Self::Concise => "concise",
            Self::Elaborate => "elaborate",
            Self::Academic => "academic",
            Self::Creative => "creative",
        }
    }

    /// Clause appended to the model instruction.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Simplify => "by simplifying the language and making it easier to understand",
            Self::Storytelling => "by adding storytelling elements and narrative structure",
            Self::Professional => "by making it more professional and business-appropriate",
            Self::Accessible => "by improving accessibility and inclusivity",
            Self::Engaging => "by making it more engaging and captivating for the audience",
            Self::Concise => "by making it more concise and focused on key points",
            Self::Elaborate => "by elaborating on the content with more details and explanation",
            Self::Academic => {
                "by giving it an academic style appropriate for research or educational settings"
            }
            Self::Creative => "by adding creative elements and unique perspectives",
        }
    }

    /// Label used in the mock rewrite, e.g. `SIMPLIFIED VERSION`.
    pub fn mock_label(&self) -> &'static str {
        match self {
            Self::Simplify => "SIMPLIFIED VERSION",
            Self::Storytelling => "STORYTELLING VERSION",
            Self::Professional => "PROFESSIONAL VERSION",
            Self::Accessible => "ACCESSIBLE VERSION",
            Self::Engaging => "ENGAGING VERSION",
            Self::Concise => "CONCISE VERSION",
            Self::Elaborate => "ELABORATE VERSION",
            Self::Academic => "ACADEMIC VERSION",
            Self::Creative => "CREATIVE VERSION",
        }
    }

    /// Sentence describing the mock rewrite.
    pub fn mock_note(&self) -> &'static str {
        match self {
            Self::Simplify => "This slide now uses clearer language and simpler explanations.",
            Self::Storytelling => {
                "This slide now includes a compelling narrative arc and emotional elements."
            }
            Self::Professional => "This slide now uses business terminology and formal language.",
            Self::Accessible => "This slide now uses inclusive language and avoids jargon.",
            Self::Engaging => "This slide now includes questions and interactive elements.",
            Self::Concise => "This slide now focuses on key messages without redundancy.",
            Self::Elaborate => "This slide now includes more details and examples.",
            Self::Academic => "This slide now includes citations and research-based structure.",
            Self::Creative => {
                "This slide now incorporates metaphors and innovative presentation styles."
            }
        }
    }
}

impl fmt::Display for EnhancementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a tag outside the directive set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown enhancement type: {0}")]
pub struct UnknownEnhancementType(pub String);

impl FromStr for EnhancementType {
    type Err = UnknownEnhancementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownEnhancementType(s.to_string()))
    }
}

/// Deterministic offline rewrite: the original text followed by a labelled note.
///
/// `None` stands for a tag outside the directive set.
pub fn mock_enhancement(slide_text: &str, directive: Option<EnhancementType>) -> String {
    match directive {
        Some(kind) => format!(
            "{}\n\n[{}]\n{}",
            slide_text,
            kind.mock_label(),
            kind.mock_note()
        ),
        None => format!(
            "{}\n\n[ENHANCED VERSION]\nThis is a mock enhancement.",
            slide_text
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_round_trips_every_directive() {
        for kind in EnhancementType::ALL {
            assert_eq!(EnhancementType::from_tag(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_from_tag_is_exact() {
        assert_eq!(EnhancementType::from_tag("Simplify"), None);
        assert_eq!(EnhancementType::from_tag(" simplify"), None);
        assert_eq!(EnhancementType::from_tag("summarize"), None);
        assert_eq!(
            "poetic".parse::<EnhancementType>(),
            Err(UnknownEnhancementType("poetic".to_string()))
        );
        assert_eq!(
            UnknownEnhancementType("poetic".to_string()).to_string(),
            "unknown enhancement type: poetic"
        );
        assert_eq!("concise".parse::<EnhancementType>(), Ok(EnhancementType::Concise));
    }

    #[test]
    fn test_mock_simplify_exact_text() {
        assert_eq!(
            mock_enhancement("Revenue grew 20%", Some(EnhancementType::Simplify)),
            "Revenue grew 20%\n\n[SIMPLIFIED VERSION]\nThis slide now uses clearer language and simpler explanations."
        );
    }

    #[test]
    fn test_mock_unknown_tag() {
        assert_eq!(
            mock_enhancement("Q3 results", None),
            "Q3 results\n\n[ENHANCED VERSION]\nThis is a mock enhancement."
        );
    }

    #[test]
    fn test_mock_keeps_original_text_first() {
        for kind in EnhancementType::ALL {
            let out = mock_enhancement("Body", Some(kind));
            assert!(out.starts_with("Body\n\n["));
            assert!(out.contains(kind.mock_label()));
        }
    }
}
