//! End-to-end pipeline tests: mail body -> parse -> resolve -> ledger entry

use chrono::NaiveDate;
use kakeibo_core::{
    CategoryResolver, Config, GatewayClient, LedgerEntry, MockBackend, ParserRegistry, Source,
};

fn fixtures() -> (ParserRegistry, Config) {
    let config = Config::embedded_default().expect("embedded config");
    let registry = ParserRegistry::new(config.skip_merchants.clone());
    (registry, config)
}

fn resolver(config: Config, mock: MockBackend) -> CategoryResolver {
    let mut settings = config.gateway.clone();
    settings.min_call_interval = std::time::Duration::ZERO;
    CategoryResolver::new(
        config.taxonomy,
        config.shop_map,
        Some(GatewayClient::Mock(mock)),
        &settings,
    )
}

#[tokio::test]
async fn app_payment_mail_to_ledger_entry() {
    let (registry, config) = fixtures();
    let body = "ご利用店舗    ユニクロ 渋谷店\n\
                電話番号      000-0000-0000\n\
                ご利用日時    2024/1/15\n\
                決済総額      3,990円\n";

    let mock = MockBackend::with_reply("101,10101");
    let resolver = resolver(config, mock.clone());

    let mut records = registry.parse(Source::RakutenPay, body);
    assert_eq!(records.len(), 1);

    let resolved = resolver.resolve(&records[0].shop).await;
    records[0].category_id = Some(resolved.category_id);
    records[0].genre_id = Some(resolved.genre_id);

    // Static rule matched, so the gateway was never consulted
    assert_eq!(records[0].category_id, Some(111));
    assert_eq!(mock.call_count(), 0);

    let default_date = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
    let entry = LedgerEntry::from_record(&records[0], default_date, "Created by kakeibo").unwrap();
    // Parsed date takes priority over the receipt date
    assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    assert_eq!(entry.amount, 3990);
    assert_eq!(entry.comment, "Created by kakeibo");
}

#[tokio::test]
async fn card_statement_mail_skips_transfers_but_classifies_the_rest() {
    let (registry, config) = fixtures();
    let body = "カード利用のお知らせ\n\
                ■利用日: 2024/02/01\n\
                ■利用先: 楽天キャッシュ・セット設定\n\
                ■利用金額: 5,000 円\n\
                ■利用日: 2024/02/03\n\
                ■利用先: 喫茶アルプス\n\
                ■利用金額: 880 円\n";

    let mock = MockBackend::with_reply("101,10103");
    let resolver = resolver(config, mock.clone());

    let records = registry.parse(Source::RakutenCard, body);
    assert_eq!(records.len(), 2);
    assert!(records[0].skip);
    assert!(!records[1].skip);

    // Only the non-skipped record goes through classification
    let resolved = resolver.resolve(&records[1].shop).await;
    assert_eq!(resolved.category_id, 101);
    assert_eq!(resolved.genre_id, 10103);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn online_order_mail_with_unavailable_gateway_still_produces_entries() {
    let (registry, config) = fixtures();
    let body = "<div>提携サイト「ネット書店XYZ」</div>\
                <div>文庫本 500円 × 1 ＝ 500円</div>\
                <div>新書 700円 × 1 ＝ 700円</div>";

    let resolver = resolver(config, MockBackend::unavailable());

    let records = registry.parse(Source::RakutenPayOnline, body);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, 1200);

    // Classification failure degrades to the fallback pair, never drops data
    let resolved = resolver.resolve(&records[0].shop).await;
    assert_eq!(resolved.category_id, 199);
    assert_eq!(resolved.genre_id, 19901);
}

#[test]
fn subject_routing_covers_all_sources() {
    for source in Source::all() {
        let subject = format!("Re: {}", source.subject_needle());
        assert_eq!(Source::detect(&subject), Some(*source));
    }
}
