use std::path::PathBuf;

use ragops::{FileTextExtractor, FileType, TextExtractor};

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("read {}: {}", path.display(), e))
}

#[tokio::test]
async fn pdf_text_is_extracted_in_reading_order() {
    let text = FileTextExtractor::new()
        .extract(FileType::Pdf, &fixture("quarterly.pdf"))
        .await
        .expect("extract pdf");

    let title = text.find("Quarterly report").expect("title");
    let body = text
        .find("Revenue grew 12 percent in the north region.")
        .expect("body");
    assert!(title < body, "{:?}", text);
    assert!(text[title..body].contains('\n'), "{:?}", text);
}

#[tokio::test]
async fn xlsx_first_sheet_is_rendered_as_a_table() {
    let text = FileTextExtractor::new()
        .extract(FileType::Xlsx, &fixture("sales.xlsx"))
        .await
        .expect("extract xlsx");

    assert_eq!(
        text,
        "   region  Unnamed: 1  amount\n0   north          q1      10\n1   south         NaN      20"
    );
    assert!(!text.contains("secret"));
}
