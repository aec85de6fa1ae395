use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::Anchor;

/// Which hop of the navigation a link is being judged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavLevel {
    Department,
    Section,
    Program,
}

const DEPT_KEYWORDS: &[&str] = &[
    "health department",
    "health services",
    "public health",
    "health and human services",
    "hhs",
    "hhsa",
    "department of public health",
];
const DEPT_PATHS: &[&str] = &["/health", "/public-health"];

const SECTION_KEYWORDS: &[&str] = &[
    "maternal health",
    "maternal child health",
    "mch",
    "mcah",
    "women's health",
    "family health",
    "perinatal",
    "reproductive health",
    "prenatal",
    "postpartum",
];
const SECTION_PATHS: &[&str] = &["/mch", "/mcah", "/maternal", "/perinatal", "/family-health"];

const PROGRAM_KEYWORDS: &[&str] = &[
    "healthy start",
    "wic",
    "home visiting",
    "miechv",
    "black infant health",
    "first 5",
    "nurse-family partnership",
    "title v",
    "perinatal equity",
    "postpartum",
    "breastfeeding",
    "lactation",
    "family planning",
    "parents as teachers",
    "nfp",
];
const PROGRAM_PATHS: &[&str] = &["/apply", "/program", "/services", "/maternal", "/perinatal"];

const SOCIAL_HOSTS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "youtube.com",
    "linkedin.com",
];
const SOCIAL_PENALTY: i32 = -3;

impl NavLevel {
    /// (keywords, keyword bonus, path fragments, path bonus)
    fn rules(self) -> (&'static [&'static str], i32, &'static [&'static str], i32) {
        match self {
            NavLevel::Department => (DEPT_KEYWORDS, 3, DEPT_PATHS, 2),
            NavLevel::Section => (SECTION_KEYWORDS, 3, SECTION_PATHS, 2),
            NavLevel::Program => (PROGRAM_KEYWORDS, 2, PROGRAM_PATHS, 1),
        }
    }
}

/// Additive heuristic score of one anchor for `level`.
pub fn score_link(href: &str, text: &str, level: NavLevel) -> i32 {
    let h = href.to_lowercase();
    let t = text.to_lowercase();
    let (keywords, keyword_bonus, paths, path_bonus) = level.rules();

    let mut score = 0;
    if keywords.iter().any(|k| t.contains(k) || h.contains(k)) {
        score += keyword_bonus;
    }
    let path = url_path(&h);
    if paths.iter().any(|p| path.contains(p)) {
        score += path_bonus;
    }
    if is_social_host(&h) {
        score += SOCIAL_PENALTY;
    }
    score
}

/// The first anchor with the strictly highest positive score among same-site
/// http(s) links, if any.
pub fn choose_best_link<'a>(anchors: &'a [Anchor], base: &str, level: NavLevel) -> Option<&'a Anchor> {
    let mut best: Option<(&Anchor, i32)> = None;
    for anchor in anchors {
        if !is_http(&anchor.href) || !is_same_site(base, &anchor.href) {
            continue;
        }
        let score = score_link(&anchor.href, &anchor.text, level);
        if score <= 0 {
            continue;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((anchor, score));
        }
    }
    best.map(|(a, _)| a)
}

/// Positively scored http(s) program links from any domain, highest score
/// first, unique by URL, at most `cap`.
pub fn rank_program_links(anchors: &[Anchor], cap: usize) -> Vec<(i32, &Anchor)> {
    let mut scored: Vec<(i32, &Anchor)> = anchors
        .iter()
        .filter(|a| is_http(&a.href))
        .map(|a| (score_link(&a.href, &a.text, NavLevel::Program), a))
        .filter(|(score, _)| *score > 0)
        .collect();
    // stable: equal scores keep page order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut seen = HashSet::new();
    scored
        .into_iter()
        .filter(|(_, a)| seen.insert(a.href.clone()))
        .take(cap)
        .collect()
}

/// `candidate` is on `base`'s site: same host ignoring a leading `www.`, or a
/// subdomain of it.
pub fn is_same_site(base: &str, candidate: &str) -> bool {
    let (Some(b), Some(c)) = (host_of(base), host_of(candidate)) else {
        return false;
    };
    let b = b.trim_start_matches("www.");
    let c = c.trim_start_matches("www.");
    c == b || c.ends_with(&format!(".{}", b))
}

pub fn is_social_host(url: &str) -> bool {
    let Some(host) = host_of(url) else {
        return false;
    };
    SOCIAL_HOSTS
        .iter()
        .any(|s| host == *s || host.ends_with(&format!(".{}", s)))
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_ascii_lowercase())
}

fn url_path(href: &str) -> String {
    match Url::parse(href) {
        Ok(u) => u.path().to_string(),
        Err(_) => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(href: &str, text: &str) -> Anchor {
        Anchor {
            href: href.to_string(),
            raw_href: href.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn department_keywords_and_path() {
        assert_eq!(score_link("https://c.gov/about", "Public Health", NavLevel::Department), 3);
        assert_eq!(score_link("https://c.gov/health", "Click", NavLevel::Department), 2);
        assert_eq!(
            score_link("https://c.gov/public-health", "Public Health Department", NavLevel::Department),
            5
        );
        assert_eq!(score_link("https://c.gov/contact", "Contact Us", NavLevel::Department), 0);
    }

    #[test]
    fn section_keywords_and_path() {
        assert_eq!(score_link("https://c.gov/x", "Maternal Health", NavLevel::Section), 3);
        assert_eq!(score_link("https://c.gov/mcah/", "MCAH", NavLevel::Section), 5);
        assert_eq!(score_link("https://c.gov/family-health/", "Overview", NavLevel::Section), 2);
    }

    #[test]
    fn program_keywords_and_path() {
        assert_eq!(score_link("https://c.gov/x", "WIC", NavLevel::Program), 2);
        assert_eq!(score_link("https://c.gov/services/x", "Info", NavLevel::Program), 1);
        assert_eq!(
            score_link("https://c.gov/programs/home-visiting", "Home Visiting", NavLevel::Program),
            3
        );
        assert_eq!(score_link("https://c.gov/x", "Black Infant Health", NavLevel::Program), 2);
    }

    #[test]
    fn keyword_in_href_counts() {
        assert_eq!(score_link("https://c.gov/wic-info", "More", NavLevel::Program), 2);
    }

    #[test]
    fn path_bonus_ignores_host() {
        // "/health" only in the host part must not earn the path bonus
        assert_eq!(score_link("https://health.c.gov/", "Go", NavLevel::Department), 0);
    }

    #[test]
    fn levels_do_not_share_buckets() {
        assert_eq!(score_link("https://c.gov/x", "WIC", NavLevel::Department), 0);
        assert_eq!(score_link("https://c.gov/x", "Public Health", NavLevel::Program), 0);
    }

    #[test]
    fn scoring_is_deterministic() {
        for level in [NavLevel::Department, NavLevel::Section, NavLevel::Program] {
            let a = score_link("https://c.gov/mcah/wic", "Public Health WIC", level);
            let b = score_link("https://c.gov/mcah/wic", "Public Health WIC", level);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn social_penalty_dominates() {
        for level in [NavLevel::Department, NavLevel::Section, NavLevel::Program] {
            for host in SOCIAL_HOSTS {
                let social = score_link(&format!("https://www.{}/public-health", host), "Public Health WIC MCAH", level);
                let plain = score_link("https://c.gov/public-health", "Public Health WIC MCAH", level);
                assert!(social <= plain, "{host} at {level:?}");
                assert_eq!(social, plain + SOCIAL_PENALTY);
            }
        }
    }

    #[test]
    fn same_site_rules() {
        assert!(is_same_site("https://www.acgov.org/", "https://www.acgov.org/health"));
        assert!(is_same_site("https://www.acgov.org/", "https://acgov.org/health"));
        assert!(is_same_site("https://www.acgov.org/", "https://phd.acgov.org/"));
        assert!(!is_same_site("https://www.acgov.org/", "https://notacgov.org/"));
        assert!(!is_same_site("https://www.acgov.org/", "https://facebook.com/acgov"));
        assert!(!is_same_site("https://www.acgov.org/", "mailto:x@acgov.org"));
    }

    #[test]
    fn best_link_prefers_health_over_contact() {
        let links = vec![
            anchor("https://c.gov/contact", "Contact Us"),
            anchor("https://c.gov/health", "Public Health Department"),
        ];
        let best = choose_best_link(&links, "https://c.gov/", NavLevel::Department).unwrap();
        assert_eq!(best.href, "https://c.gov/health");
    }

    #[test]
    fn best_link_ties_keep_first_seen() {
        let links = vec![
            anchor("https://c.gov/a", "Public Health"),
            anchor("https://c.gov/b", "Health Services"),
        ];
        let best = choose_best_link(&links, "https://c.gov/", NavLevel::Department).unwrap();
        assert_eq!(best.href, "https://c.gov/a");
    }

    #[test]
    fn best_link_skips_off_site_and_unscored() {
        let links = vec![
            anchor("https://state.gov/public-health", "Public Health"),
            anchor("https://c.gov/parks", "Parks"),
            anchor("mailto:health@c.gov", "Public Health"),
        ];
        assert!(choose_best_link(&links, "https://c.gov/", NavLevel::Department).is_none());
    }

    #[test]
    fn program_ranking_sorts_dedups_and_caps() {
        let links = vec![
            anchor("https://c.gov/info", "WIC"),
            anchor("https://c.gov/about", "About"),
            anchor("https://other.org/programs/nfp", "Nurse-Family Partnership"),
            anchor("https://c.gov/info", "WIC again"),
            anchor("https://c.gov/services/x", "Services"),
            anchor("tel:5551234567", "WIC hotline"),
        ];
        let ranked = rank_program_links(&links, 25);
        let urls: Vec<&str> = ranked.iter().map(|(_, a)| a.href.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://other.org/programs/nfp", "https://c.gov/info", "https://c.gov/services/x"]
        );
        assert_eq!(ranked[1].1.text, "WIC");
        assert!(ranked.iter().all(|(s, _)| *s > 0));

        assert_eq!(rank_program_links(&links, 2).len(), 2);
    }
}
