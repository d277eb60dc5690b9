//! Markup stripping for HTML email bodies
//!
//! Provider notification mails arrive as tag soup; amounts and labels are
//! frequently split across table cells. Before pattern matching, every tag
//! is replaced with a single space so that text on either side of a tag
//! boundary does not run together.

use regex::Regex;

/// Strips `<...>` markup from email bodies ahead of label extraction
pub struct Normalizer {
    tag_re: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            tag_re: Regex::new(r"<[^>]+>").expect("valid regex"),
        }
    }

    /// Replace each markup tag with one space, leaving all other text
    /// (full-width characters, punctuation) unmodified.
    ///
    /// The output contains no tags, so the function is idempotent.
    pub fn normalize(&self, raw: &str) -> String {
        self.tag_re.replace_all(raw, " ").into_owned()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_become_spaces() {
        let n = Normalizer::new();
        assert_eq!(
            n.normalize("<td>お支払い金額</td><td>1,234円</td>"),
            " お支払い金額  1,234円 "
        );
    }

    #[test]
    fn test_adjacent_words_stay_separated() {
        let n = Normalizer::new();
        // A deleted (rather than replaced) tag would concatenate "金額" and "500"
        let out = n.normalize("金額<br>500円");
        assert_eq!(out, "金額 500円");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let n = Normalizer::new();
        let body = "ご利用店舗 スーパーABC\n決済総額 1,234円";
        assert_eq!(n.normalize(body), body);
    }

    #[test]
    fn test_attributes_and_fullwidth_text() {
        let n = Normalizer::new();
        let out = n.normalize(r#"<a href="https://example.com">提携サイト「ネット書店」</a>"#);
        assert_eq!(out, " 提携サイト「ネット書店」 ");
    }

    #[test]
    fn test_idempotent() {
        let n = Normalizer::new();
        for raw in [
            "<p>text</p>",
            "plain",
            "<td><b>注文</b></td>",
            "a < b, c > d",
        ] {
            let once = n.normalize(raw);
            assert_eq!(n.normalize(&once), once);
        }
    }
}
