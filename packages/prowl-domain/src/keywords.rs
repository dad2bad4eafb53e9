use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'\-]*").expect("Token pattern must compile.")
});
static QUOTE_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"["'`“”‘’«»]"#).expect("Quote pattern must compile."));

const STOPWORDS: &[&str] = &[
	"a", "about", "an", "and", "are", "as", "at", "be", "best", "by", "for", "from", "in", "into",
	"is", "it", "its", "of", "on", "or", "the", "this", "to", "with", "your",
];

/// Canonical form used for fingerprinting: NFKC, lower-cased, single-spaced.
pub fn normalize_keywords(keywords: &str) -> String {
	let normalized: String = keywords.nfkc().collect();

	normalized.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleans advisory output into a single-line phrase of at most `max_words` words.
pub fn sanitize_keywords(raw: &str, max_words: usize) -> String {
	let unquoted = QUOTE_RE.replace_all(raw, "");
	let words = unquoted.split_whitespace().take(max_words.max(1)).collect::<Vec<_>>().join(" ");

	words.trim_end_matches(|ch: char| ch.is_ascii_punctuation()).trim().to_string()
}

/// Lower-cased tokens that carry meaning on their own.
pub fn significant_tokens(text: &str) -> Vec<String> {
	let normalized: String = text.nfkc().collect();

	TOKEN_RE
		.find_iter(&normalized)
		.map(|m| m.as_str().trim_matches(|ch| ch == '\'' || ch == '-').to_lowercase())
		.filter(|token| token.chars().count() >= 2 && !STOPWORDS.contains(&token.as_str()))
		.collect()
}

/// The broadest single-term query derivable from `base`.
pub fn broadest_keyword(base: &str) -> Option<String> {
	significant_tokens(base).into_iter().next()
}

/// Deterministic query built from raw content when no advisory keywords are available.
pub fn keywords_from_content(content: &str, max_words: usize) -> String {
	let mut seen = Vec::new();

	for token in significant_tokens(content) {
		if seen.len() >= max_words.max(1) {
			break;
		}
		if !seen.contains(&token) {
			seen.push(token);
		}
	}

	seen.join(" ")
}
