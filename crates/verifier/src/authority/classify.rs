/// Domain class flags derived purely from TLD/domain heuristics.
/// Independent of any network call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DomainFlags {
    pub is_government: bool,
    pub is_educational: bool,
    pub is_non_profit: bool,
    pub is_news: bool,
}

/// Established news outlets recognized without a provider lookup.
const NEWS_DOMAINS: &[&str] = &[
    "reuters.com",
    "apnews.com",
    "bbc.com",
    "bbc.co.uk",
    "nytimes.com",
    "washingtonpost.com",
    "theguardian.com",
    "wsj.com",
    "bloomberg.com",
    "ft.com",
    "economist.com",
    "npr.org",
    "cnn.com",
];

pub fn classify_domain(domain: &str) -> DomainFlags {
    let domain = domain.to_lowercase();
    let domain = domain.trim_start_matches("www.");

    let is_government = domain.ends_with(".gov")
        || domain.ends_with(".mil")
        || domain.contains(".gov.")
        || domain.contains(".mil.");
    let is_educational =
        domain.ends_with(".edu") || domain.contains(".edu.") || domain.ends_with(".ac.uk");
    let is_news = NEWS_DOMAINS
        .iter()
        .any(|news| domain == *news || domain.ends_with(&format!(".{}", news)));
    let is_non_profit = domain.ends_with(".org") && !is_news;

    DomainFlags {
        is_government,
        is_educational,
        is_non_profit,
        is_news,
    }
}

/// Extract the host portion of a URL, without port or credentials.
pub fn extract_domain(url: &str) -> String {
    url.split("//")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("unknown")
        .rsplit('@')
        .next()
        .unwrap_or("unknown")
        .split(':')
        .next()
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_government_domains() {
        assert!(classify_domain("cdc.gov").is_government);
        assert!(classify_domain("www.nih.gov").is_government);
        assert!(classify_domain("gov.uk").is_government == false);
        assert!(classify_domain("stats.gov.uk").is_government);
    }

    #[test]
    fn test_educational_domains() {
        assert!(classify_domain("stanford.edu").is_educational);
        assert!(classify_domain("cs.stanford.edu").is_educational);
        assert!(classify_domain("ox.ac.uk").is_educational);
        assert!(!classify_domain("example.com").is_educational);
    }

    #[test]
    fn test_news_takes_precedence_over_org() {
        let npr = classify_domain("npr.org");
        assert!(npr.is_news);
        assert!(!npr.is_non_profit);

        let wiki = classify_domain("wikipedia.org");
        assert!(wiki.is_non_profit);
        assert!(!wiki.is_news);
    }

    #[test]
    fn test_commercial_domain_has_no_flags() {
        assert_eq!(classify_domain("example.com"), DomainFlags::default());
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://example.com/path"), "example.com");
        assert_eq!(extract_domain("http://www.test.org/a/b"), "www.test.org");
        assert_eq!(extract_domain("https://example.com:8443/x"), "example.com");
    }
}
