//! Email parsers for the supported payment providers
//!
//! Each source has a dedicated parser that turns a raw mail body into zero,
//! one, or many [`TransactionRecord`]s. A parse that finds no usable
//! shop+amount is a miss, not an error: the parser returns an empty vec and
//! the caller treats the message as unmatched. Only an unknown source key is
//! an error (a configuration bug, surfaced loudly via `Error::UnknownSource`).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::error::Error;
use crate::models::TransactionRecord;
use crate::normalize::Normalizer;

/// Known mail sources, keyed by stable string identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// In-person app payment notice (plain text, single record)
    RakutenPay,
    /// Online order notice (HTML body, single record)
    RakutenPayOnline,
    /// Consolidated card statement digest (plain text, many records)
    RakutenCard,
}

impl Source {
    /// Stable key used in config and on the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RakutenPay => "rakuten-pay",
            Self::RakutenPayOnline => "rakuten-pay-online",
            Self::RakutenCard => "rakuten-card",
        }
    }

    /// Human-readable payment source name (ledger display, logs)
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::RakutenPay | Self::RakutenPayOnline => "楽天ペイ",
            Self::RakutenCard => "楽天カード",
        }
    }

    /// Subject substring identifying this source's notification mails
    ///
    /// Partial match: some providers put variable bracketed suffixes in
    /// the subject line.
    pub fn subject_needle(&self) -> &'static str {
        match self {
            Self::RakutenPay => "楽天ペイアプリご利用内容確認メール",
            Self::RakutenPayOnline => "楽天ペイ 注文受付",
            Self::RakutenCard => "カード利用のお知らせ",
        }
    }

    /// Route a mail subject to its source, if any matches
    pub fn detect(subject: &str) -> Option<Source> {
        Self::all()
            .iter()
            .copied()
            .find(|s| subject.contains(s.subject_needle()))
    }

    /// All supported sources
    pub fn all() -> &'static [Source] {
        &[Self::RakutenPay, Self::RakutenPayOnline, Self::RakutenCard]
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rakuten-pay" => Ok(Self::RakutenPay),
            "rakuten-pay-online" => Ok(Self::RakutenPayOnline),
            "rakuten-card" => Ok(Self::RakutenCard),
            _ => Err(Error::UnknownSource(s.to_string())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatches mail bodies to the per-source parsers
///
/// Holds the shared [`Normalizer`] and the configured internal-transfer
/// substrings used to flag card-statement records as `skip`.
pub struct ParserRegistry {
    normalizer: Normalizer,
    skip_merchants: Vec<String>,
}

impl ParserRegistry {
    pub fn new(skip_merchants: Vec<String>) -> Self {
        Self {
            normalizer: Normalizer::new(),
            skip_merchants,
        }
    }

    /// Parse a mail body with the parser registered for `source`
    ///
    /// Pure per call: the same body always yields the same records.
    pub fn parse(&self, source: Source, body: &str) -> Vec<TransactionRecord> {
        let records = match source {
            Source::RakutenPay => self.parse_rakuten_pay(body),
            Source::RakutenPayOnline => self.parse_rakuten_pay_online(body),
            Source::RakutenCard => self.parse_rakuten_card(body),
        };
        debug!(
            source = source.as_str(),
            count = records.len(),
            "parsed mail body"
        );
        records
    }

    /// In-person payment notice
    ///
    /// ```text
    /// ご利用店舗    スーパーABC
    /// 電話番号      000-0000-0000
    /// ご利用日時    2024/1/15
    /// 決済総額      1,234円
    /// ```
    ///
    /// Shop runs from the store label to the phone-number label or line end;
    /// one record iff both shop and amount are present.
    fn parse_rakuten_pay(&self, body: &str) -> Vec<TransactionRecord> {
        let shop_re = Regex::new(r"ご利用店舗\s*(.+?)\s*電話番号").expect("valid regex");
        let shop_line_re = Regex::new(r"ご利用店舗[ \t　]*([^\r\n]+)").expect("valid regex");
        let amount_re = Regex::new(r"決済総額\s*([0-9,]+)\s*円").expect("valid regex");
        let date_re = Regex::new(r"ご利用日時\s*(\d{4}/\d{1,2}/\d{1,2})").expect("valid regex");

        let shop = shop_re
            .captures(body)
            .or_else(|| shop_line_re.captures(body))
            .map(|c| c[1].trim().to_string())
            .filter(|s| !s.is_empty());
        let amount = amount_re.captures(body).and_then(|c| parse_amount(&c[1]));

        let (Some(shop), Some(amount)) = (shop, amount) else {
            return Vec::new();
        };

        let mut record = TransactionRecord::new(shop, amount);
        if let Some(date) = date_re.captures(body).and_then(|c| parse_slash_date(&c[1])) {
            record = record.with_date(date);
        }
        vec![record]
    }

    /// Online order notice (HTML body)
    ///
    /// Markup is stripped first; the shop sits inside the affiliated-site
    /// quotation (`提携サイト「…」`). The amount has two tiers: a single
    /// labeled total (`お支払い金額 … 円`), and failing that the sum of every
    /// line-item subtotal (`＝ N円`). Zero matched subtotal lines means the
    /// amount is unresolved, not zero, so no record is produced.
    fn parse_rakuten_pay_online(&self, body: &str) -> Vec<TransactionRecord> {
        let shop_re = Regex::new(r"提携サイト[「『]([^」』]+)[」』]").expect("valid regex");
        let total_re = Regex::new(r"お支払い金額[：:]?\s*([0-9,]+)\s*円").expect("valid regex");
        let item_re = Regex::new(r"＝\s*([0-9,]+)\s*円").expect("valid regex");
        let date_re = Regex::new(r"注文日[：:]?\s*(\d{4}-\d{1,2}-\d{1,2})").expect("valid regex");

        let text = self.normalizer.normalize(body);

        let shop = shop_re
            .captures(&text)
            .map(|c| c[1].trim().to_string())
            .filter(|s| !s.is_empty());

        let amount = match total_re.captures(&text).and_then(|c| parse_amount(&c[1])) {
            Some(total) => Some(total),
            None => {
                let subtotals: Vec<i64> = item_re
                    .captures_iter(&text)
                    .filter_map(|c| parse_amount(&c[1]))
                    .collect();
                if subtotals.is_empty() {
                    None
                } else {
                    Some(subtotals.iter().sum())
                }
            }
        };

        let (Some(shop), Some(amount)) = (shop, amount) else {
            return Vec::new();
        };

        let mut record = TransactionRecord::new(shop, amount);
        if let Some(date) = date_re
            .captures(&text)
            .and_then(|c| parse_hyphen_date(&c[1]))
        {
            record = record.with_date(date);
        }
        vec![record]
    }

    /// Consolidated card statement digest
    ///
    /// ```text
    /// ■利用日: 2024/01/05
    /// ■利用先: ローソン
    /// ■利用金額: 1,234 円
    /// ```
    ///
    /// The body splits into blocks at each usage-date marker; the preamble
    /// before the first marker is discarded. Stricter than the other parsers:
    /// a block yields a record only when date, shop, and amount are all
    /// present. Records whose shop matches a configured internal-transfer
    /// substring are flagged `skip` so the caller marks the message processed
    /// without submitting them.
    fn parse_rakuten_card(&self, body: &str) -> Vec<TransactionRecord> {
        const BLOCK_MARKER: &str = "■利用日";

        let date_re = Regex::new(r"■利用日[：:]?\s*(\d{4}/\d{1,2}/\d{1,2})").expect("valid regex");
        let shop_re = Regex::new(r"■利用先[：:]?\s*([^\r\n]+)").expect("valid regex");
        let amount_re = Regex::new(r"■利用金額[：:]?\s*([0-9,]+)").expect("valid regex");

        let starts: Vec<usize> = body.match_indices(BLOCK_MARKER).map(|(i, _)| i).collect();

        let mut records = Vec::new();
        for (n, &start) in starts.iter().enumerate() {
            let end = starts.get(n + 1).copied().unwrap_or(body.len());
            let block = &body[start..end];

            let date = date_re
                .captures(block)
                .and_then(|c| parse_slash_date(&c[1]));
            let shop = shop_re
                .captures(block)
                .map(|c| c[1].trim().to_string())
                .filter(|s| !s.is_empty());
            let amount = amount_re.captures(block).and_then(|c| parse_amount(&c[1]));

            let (Some(date), Some(shop), Some(amount)) = (date, shop, amount) else {
                debug!(block = n, "card statement block missing fields, skipped");
                continue;
            };

            let skip = self.skip_merchants.iter().any(|m| shop.contains(m));
            let mut record = TransactionRecord::new(shop, amount).with_date(date);
            record.skip = skip;
            records.push(record);
        }
        records
    }
}

/// Parse a digit run with thousands separators into whole yen
fn parse_amount(s: &str) -> Option<i64> {
    s.replace(',', "").parse::<i64>().ok()
}

/// Parse `YYYY/M/D` (slash form used in statement mails)
fn parse_slash_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y/%m/%d").ok()
}

/// Parse `YYYY-M-D` (hyphen form used in order mails)
fn parse_hyphen_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
