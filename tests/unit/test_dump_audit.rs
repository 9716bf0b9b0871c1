use chrono::Local;
use kurly_store::models::load_dump;
use kurly_store::services::audit::{
    find_duplicate_reviews, find_missing_products, render_insert_sql,
};
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

const DUMP: &str = r#"[
    {
        "product_no": 5051001,
        "name": "라운드랩 독도 토너",
        "review_count": 3,
        "short_description": "순한 각질 케어",
        "product_vertical_medium_url": "https://img.example.com/5051001.jpg",
        "sales_price": 18000,
        "discounted_price": 15300,
        "product_notice_notices": [{"title": "용량", "description": "200ml"}],
        "reviews": [
            {"contents": "촉촉해요", "registeredAt": "2024-03-01T10:00:00"},
            {"contents": "촉촉해요", "registeredAt": "2024-03-01T10:00:00"},
            {"contents": "재구매", "registeredAt": "2024-03-02T09:00:00"}
        ]
    },
    {
        "product_no": "5051002",
        "name": "Mom's 'gentle' cream",
        "reviews": [
            {"contents": "촉촉해요", "registeredAt": "2024-03-01T10:00:00"}
        ]
    },
    {
        "product_no": 5051003,
        "name": "선크림",
        "sales_price": 22000
    }
]"#;

fn write_dump(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("kurly_skin_products_merged.json");
    fs::write(&path, DUMP).unwrap();
    path
}

#[test]
fn test_duplicate_audit_on_dump_file() {
    let dir = TempDir::new().unwrap();
    let products = load_dump(&write_dump(&dir)).unwrap();
    assert_eq!(products.len(), 3);

    let report = find_duplicate_reviews(&products);
    assert_eq!(report.total_reviews, 4);
    assert_eq!(report.unique_reviews, 3);
    assert_eq!(report.redundant_reviews(), 1);
    assert_eq!(report.groups.len(), 1);

    let group = &report.groups[0];
    assert_eq!(group.key.product_no, "5051001");
    assert_eq!(group.key.contents, "촉촉해요");
    assert_eq!(group.occurrences, 2);
}

#[test]
fn test_missing_products_script() {
    let dir = TempDir::new().unwrap();
    let products = load_dump(&write_dump(&dir)).unwrap();
    let existing: HashSet<String> = ["5051001".to_string()].into_iter().collect();

    let missing = find_missing_products(&products, &existing);
    let nos: Vec<_> = missing.iter().map(|p| p.product_no.as_str()).collect();
    assert_eq!(nos, vec!["5051002", "5051003"]);

    let sql = render_insert_sql(&missing, Local::now());
    assert!(sql.contains("BEGIN;"));
    assert!(sql.trim_end().ends_with("COMMIT;"));
    assert_eq!(sql.matches("INSERT INTO kurly_skin_products").count(), 2);
    assert!(sql.contains("'Mom''s ''gentle'' cream'"));
    assert!(sql.contains("22000"));
    // Absent notices become an empty JSON array
    assert!(sql.contains("$notice$[]$notice$::jsonb"));
    assert!(!sql.contains("5051001"));
}

#[test]
fn test_nothing_missing() {
    let dir = TempDir::new().unwrap();
    let products = load_dump(&write_dump(&dir)).unwrap();
    let existing: HashSet<String> = products.iter().map(|p| p.product_no.clone()).collect();

    assert!(find_missing_products(&products, &existing).is_empty());
}

#[test]
fn test_malformed_dump_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"[{"product_no": true, "name": "x"}]"#).unwrap();
    assert!(load_dump(&path).is_err());

    assert!(load_dump(&dir.path().join("absent.json")).is_err());
}
