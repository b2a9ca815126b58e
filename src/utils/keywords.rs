//! Keyword extraction from free-text research queries.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::MAX_KEYWORDS;

/// Function words that never make useful search terms
const STOP_WORDS: &[&str] = &[
    "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也", "很",
    "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这",
];

/// Minimum keyword length in characters
const MIN_KEYWORD_CHARS: usize = 2;

static PUNCTUATION: OnceLock<Regex> = OnceLock::new();

fn punctuation() -> &'static Regex {
    PUNCTUATION.get_or_init(|| Regex::new(r"[\p{P}\p{S}]").expect("valid punctuation pattern"))
}

/// Extract up to five search keywords from a query.
///
/// Punctuation and symbols become whitespace, then tokens shorter than two
/// characters and stop words are dropped. Duplicates keep their first position.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let cleaned = punctuation().replace_all(query, " ");

    let mut keywords: Vec<String> = Vec::with_capacity(MAX_KEYWORDS);
    for token in cleaned.split_whitespace() {
        if token.chars().count() < MIN_KEYWORD_CHARS || is_stop_word(token) {
            continue;
        }
        if keywords.iter().any(|k| k == token) {
            continue;
        }
        keywords.push(token.to_string());
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }

    tracing::debug!(?keywords, "extracted keywords");
    keywords
}

/// Check if a token is in the stop-word set
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Map well-known Chinese research terms to English, passing others through.
pub fn translate_to_english(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| match keyword.as_str() {
            "机器学习" => "machine learning".to_string(),
            "深度学习" => "deep learning".to_string(),
            "人工智能" => "artificial intelligence".to_string(),
            "神经网络" => "neural network".to_string(),
            "图像识别" => "image recognition".to_string(),
            "自然语言处理" => "natural language processing".to_string(),
            "计算机视觉" => "computer vision".to_string(),
            "数据挖掘" => "data mining".to_string(),
            other => other.to_string(),
        })
        .collect()
}
