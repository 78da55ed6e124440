//! Content-enhancement rewrite: augment weak citations with supporting
//! high-authority references. Existing citation spans are never altered or
//! removed; enhancement only appends.

use citeguard_common::types::{
    ContentInput, ContentSection, Segment, StructuredContent, VerificationResult,
};

/// High-authority supporting sources cycled through per segment.
const B2B_SUPPORT_SOURCES: &[&str] = &[
    "https://www.nist.gov/publications",
    "https://www.nature.com/subjects/research",
    "https://www.oecd.org/en/publications.html",
];

const B2C_SUPPORT_SOURCES: &[&str] = &[
    "https://www.consumerreports.org/research",
    "https://www.who.int/publications",
    "https://www.ftc.gov/news-events",
];

/// Append a supporting reference for each weak citation, next to the
/// section it appeared in.
pub(super) fn rewrite_weak_citations(
    content: &ContentInput,
    weak: &[&VerificationResult],
    segment: Segment,
) -> ContentInput {
    let pool = match segment {
        Segment::B2b => B2B_SUPPORT_SOURCES,
        Segment::B2c => B2C_SUPPORT_SOURCES,
    };

    match content {
        ContentInput::Text(text) => {
            let mut enhanced = text.clone();
            enhanced.push_str("\n\nSupporting sources:");
            for (i, result) in weak.iter().enumerate() {
                enhanced.push_str(&format!(
                    "\nFor \"{}\", see also {}",
                    truncate(&result.citation.text, 60),
                    pool[i % pool.len()]
                ));
            }
            ContentInput::Text(enhanced)
        }
        ContentInput::Structured(structured) => {
            let mut enhanced = StructuredContent {
                title: structured.title.clone(),
                sections: structured.sections.clone(),
            };
            for (i, result) in weak.iter().enumerate() {
                let addition = format!(
                    " For corroboration of \"{}\", see {}",
                    truncate(&result.citation.text, 60),
                    pool[i % pool.len()]
                );
                enhanced
                    .sections
                    .entry(result.citation.section.clone())
                    .or_insert_with(|| ContentSection {
                        content: String::new(),
                    })
                    .content
                    .push_str(&addition);
            }
            ContentInput::Structured(enhanced)
        }
    }
}

/// Flatten content to a single string for reporting.
pub(super) fn flatten_content(content: &ContentInput) -> String {
    match content {
        ContentInput::Text(text) => text.clone(),
        ContentInput::Structured(structured) => structured
            .sections
            .iter()
            .map(|(name, section)| format!("## {}\n{}", name, section.content))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citeguard_common::config::StatusThresholds;
    use citeguard_common::types::{
        Citation, CitationType, Span, VerificationMethod, VerificationScores,
        VerificationStatus,
    };

    fn weak_result(text: &str, section: &str) -> VerificationResult {
        VerificationResult {
            citation: Citation {
                id: "cit-weak-0".to_string(),
                citation_type: CitationType::Url,
                text: text.to_string(),
                section: section.to_string(),
                span: Span {
                    start: 0,
                    end: text.len(),
                },
                url: Some(text.to_string()),
                doi: None,
                authors: Vec::new(),
                year: None,
                title: None,
                source: None,
            },
            verification: VerificationScores {
                source_reputation: 2.0,
                recency: 5.0,
                authority_score: 2.0,
                relevance_score: 3.0,
            },
            overall_score: 2.5,
            verification_status: VerificationStatus::from_score(
                2.5,
                &StatusThresholds::default(),
            ),
            issues: Vec::new(),
            suggestions: Vec::new(),
            verification_method: VerificationMethod::HeuristicFallback,
        }
    }

    #[test]
    fn test_rewrite_preserves_original_text() {
        let content = ContentInput::from("Check https://sketchy.example/post today.");
        let weak = weak_result("https://sketchy.example/post", "body");
        let enhanced = rewrite_weak_citations(&content, &[&weak], Segment::B2b);

        let rendered = flatten_content(&enhanced);
        assert!(rendered.contains("https://sketchy.example/post"));
        assert!(rendered.contains("nist.gov"));
    }

    #[test]
    fn test_rewrite_structured_appends_to_citation_section() {
        let mut structured = StructuredContent::default();
        structured.sections.insert(
            "introduction".to_string(),
            ContentSection {
                content: "See https://sketchy.example/post now.".to_string(),
            },
        );
        let weak = weak_result("https://sketchy.example/post", "introduction");

        let enhanced =
            rewrite_weak_citations(&structured.into(), &[&weak], Segment::B2c);
        match enhanced {
            ContentInput::Structured(content) => {
                let section = &content.sections["introduction"].content;
                assert!(section.starts_with("See https://sketchy.example/post now."));
                assert!(section.contains("consumerreports.org"));
            }
            _ => panic!("expected structured content"),
        }
    }

    #[test]
    fn test_supporting_sources_cycle_deterministically() {
        let content = ContentInput::from("a https://one.example b https://two.example c");
        let first = rewrite_weak_citations(
            &content,
            &[
                &weak_result("https://one.example", "body"),
                &weak_result("https://two.example", "body"),
            ],
            Segment::B2b,
        );
        let second = rewrite_weak_citations(
            &content,
            &[
                &weak_result("https://one.example", "body"),
                &weak_result("https://two.example", "body"),
            ],
            Segment::B2b,
        );
        assert_eq!(flatten_content(&first), flatten_content(&second));
    }
}
