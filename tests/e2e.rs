//! End-to-end tests against a real pdfium library.
//!
//! Gated behind the `E2E_ENABLED` environment variable so they do not run
//! in CI unless a pdfium library is available.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture
//!
//! The PDFs are generated in-process, so no test files are needed.

use pdf2jpg::{
    convert_to_dir, AppStatus, ConversionConfig, DirectorySink, Pdf2JpgError, Session,
};
use std::fmt::Write as _;
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// A minimal PDF with `pages` blank US-Letter pages and a correct xref table.
fn blank_pdf(pages: usize) -> Vec<u8> {
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        {
            let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", i + 3)).collect();
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                pages
            )
        },
    ];
    for _ in 0..pages {
        objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".to_string());
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        writeln!(out, "{} 0 obj\n{}\nendobj", i + 1, body).unwrap();
    }

    let xref_at = out.len();
    writeln!(out, "xref\n0 {}", objects.len() + 1).unwrap();
    out.push_str("0000000000 65535 f \n");
    for off in offsets {
        writeln!(out, "{off:010} 00000 n ").unwrap();
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    )
    .unwrap();
    out.into_bytes()
}

fn fast_config() -> ConversionConfig {
    ConversionConfig::builder()
        .download_pacing(Duration::ZERO)
        .build()
        .expect("valid config")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_three_page_document_at_150_dpi() {
    e2e_skip_unless_enabled!();

    let mut session = Session::with_pdfium(fast_config());
    let status = session
        .open_bytes("letter.pdf", "application/pdf", blank_pdf(3))
        .await
        .expect("media type is valid");
    assert_eq!(status, AppStatus::Result, "failure: {:?}", session.failure());

    let pages = session.pages();
    assert_eq!(pages.len(), 3);
    // 8.5 × 11 in at 150 DPI, give or take float truncation
    assert!((1274..=1275).contains(&pages[0].width), "{}", pages[0].width);
    assert!((1649..=1650).contains(&pages[0].height), "{}", pages[0].height);
    let width = pages[0].width;

    let dir = tempfile::tempdir().unwrap();
    let dispatcher = session.dispatcher(DirectorySink::new(dir.path()));
    assert_eq!(session.download_selected(&dispatcher).await.unwrap(), 3);
    for n in 1..=3 {
        let path = dir.path().join(format!("letter_p{n:02}.jpg"));
        let img = image::open(&path).expect("valid JPEG");
        assert_eq!(img.width(), width);
    }
}

#[tokio::test]
async fn test_twenty_one_pages_rejected() {
    e2e_skip_unless_enabled!();

    let mut session = Session::with_pdfium(fast_config());
    let status = session
        .open_bytes("long.pdf", "application/pdf", blank_pdf(21))
        .await
        .unwrap();
    assert_eq!(status, AppStatus::Error);
    assert!(matches!(
        session.failure(),
        Some(Pdf2JpgError::TooManyPages { pages: 21, .. })
    ));
}

#[tokio::test]
async fn test_garbage_is_invalid_document() {
    e2e_skip_unless_enabled!();

    let mut session = Session::with_pdfium(fast_config());
    session
        .open_bytes("fake.pdf", "application/pdf", b"this is not a pdf".to_vec())
        .await
        .unwrap();
    assert_eq!(session.status(), AppStatus::Error);
    assert_eq!(session.error().unwrap().title, "Invalid file");
}

#[tokio::test]
async fn test_convert_to_dir() {
    e2e_skip_unless_enabled!();

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("Handout.PDF");
    std::fs::write(&input, blank_pdf(2)).unwrap();
    let out = dir.path().join("out");

    let stats = convert_to_dir(&input, &out, &fast_config())
        .await
        .expect("conversion should succeed");
    assert_eq!(stats.total_pages, 2);
    assert!(stats.total_jpeg_bytes > 0);
    assert!(out.join("Handout_p01.jpg").exists());
    assert!(out.join("Handout_p02.jpg").exists());
}
