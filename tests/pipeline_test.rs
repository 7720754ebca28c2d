//! End-to-end tests: PDF + pre-rendered page -> regions -> edits -> HTML -> zip.

use std::io::{Cursor, Read};
use std::path::Path;

use image::{Rgba, RgbaImage};
use lopdf::{dictionary, Document as LopdfDocument, Object, Stream};

use relayout::generate::{to_html, GenerateOptions, HtmlGenerator};
use relayout::package::{package_document, ZipArchiver};
use relayout::{
    Command, EditorSession, Error, FontFamily, RegionId, RegionKind, Relayout, TextAlign,
    TextStyle,
};

const CONTENT: &str = "BT /F1 12 Tf 72 700 Td (Quarterly) Tj 60 0 Td (report) Tj ET \
                       BT /F1 10 Tf 72 100 Td (Footnote) Tj ET";

fn write_pdf(path: &Path, content: &str) {
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        "MediaBox" => vec![0.into(), 0.into(), 600.into(), 800.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn write_page_png(path: &Path) {
    let mut bitmap = RgbaImage::from_pixel(600, 800, Rgba([255, 255, 255, 255]));
    for y in 300..450 {
        for x in 300..500 {
            bitmap.put_pixel(x, y, Rgba([20, 40, 200, 255]));
        }
    }
    bitmap.save(path).unwrap();
}

fn fixture() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("report.pdf");
    let pages = dir.path().join("pages");
    std::fs::create_dir_all(&pages).unwrap();
    write_pdf(&pdf, CONTENT);
    write_page_png(&pages.join("page-1.png"));
    (dir, pdf, pages)
}

#[test]
fn test_analyze_detects_text_and_images() {
    let (_dir, pdf, pages) = fixture();
    let doc = Relayout::new()
        .with_scale(1.0)
        .with_raster_dir(&pages)
        .analyze(&pdf)
        .unwrap();

    assert_eq!(doc.name, "report");
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.count(RegionKind::Text), 2);
    assert_eq!(doc.count(RegionKind::Image), 1);

    let page = doc.page(1).unwrap();
    let heading = &page.regions[0];
    assert_eq!(heading.content.as_deref(), Some("Quarterly report"));
    assert!((heading.rect.x - 72.0).abs() < 1e-3);
    assert!((heading.rect.y - 88.0).abs() < 1e-3);
    assert_eq!(heading.style.unwrap().font_size, 12);
    assert_eq!(heading.style.unwrap().font_family, FontFamily::Sans);

    assert_eq!(page.regions[1].content.as_deref(), Some("Footnote"));
    assert!(page.regions[2].is_image());
    assert_eq!(page.regions[2].rect, relayout::Rect::new(300.0, 300.0, 200.0, 150.0));
    assert!(page.overlapping_regions().is_empty());
}

#[test]
fn test_full_round_trip_to_zip() {
    let (_dir, pdf, pages) = fixture();
    let doc = Relayout::new()
        .with_scale(1.0)
        .with_raster_dir(&pages)
        .analyze(&pdf)
        .unwrap();

    let mut session = EditorSession::new(doc);
    let style = TextStyle::new(FontFamily::Serif, 20, TextAlign::Center);
    session
        .apply_all([
            Command::ToggleActive {
                id: RegionId::new(1, 1),
            },
            Command::Select {
                id: RegionId::new(1, 0),
            },
            Command::SetStyle { style },
        ])
        .unwrap();
    let doc = session.into_document();

    let result = to_html(&doc).unwrap();
    assert!(!result.html.contains("Footnote"));
    let heading = result.html.find("Quarterly report").unwrap();
    let image = result.html.find("asset://image-1-1.png").unwrap();
    assert!(heading < image);
    assert!(result.html.contains("font-size: 20px; text-align: center;"));

    assert_eq!(result.assets.len(), 1);
    let crop = image::load_from_memory(&result.assets[0].data).unwrap().to_rgba8();
    assert_eq!(crop.dimensions(), (200, 150));
    assert_eq!(crop.get_pixel(0, 0).0, [20, 40, 200, 255]);

    let bytes = package_document(&result, &doc.name, &ZipArchiver).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut index = String::new();
    archive
        .by_name("index.html")
        .unwrap()
        .read_to_string(&mut index)
        .unwrap();
    assert!(index.contains("<title>report</title>"));
    assert!(index.contains("src=\"images/image-1-1.png\""));
    assert!(archive.by_name("images/image-1-1.png").is_ok());
}

#[test]
fn test_text_only_mode_has_no_images() {
    let (_dir, pdf, _pages) = fixture();
    let doc = relayout::analyze_file(&pdf).unwrap();
    assert_eq!(doc.count(RegionKind::Image), 0);
    assert_eq!(doc.count(RegionKind::Text), 2);
}

#[test]
fn test_missing_page_image_aborts() {
    let (dir, pdf, _pages) = fixture();
    let empty = dir.path().join("empty");
    std::fs::create_dir_all(&empty).unwrap();

    let err = Relayout::new().with_raster_dir(&empty).analyze(&pdf).unwrap_err();
    assert!(matches!(err, Error::Page { page: 1, .. }));
}

#[test]
fn test_reclassified_image_is_ocrd() {
    let (_dir, pdf, pages) = fixture();
    let doc = Relayout::new()
        .with_scale(1.0)
        .with_raster_dir(&pages)
        .analyze(&pdf)
        .unwrap();

    let mut session = EditorSession::new(doc);
    session.reclassify(RegionId::new(1, 2)).unwrap();
    let doc = session.into_document();

    let engine = |crop: &RgbaImage| -> relayout::Result<String> {
        Ok(format!("Chart {}x{}\n\nQ1 revenue", crop.width(), crop.height()))
    };
    let result = HtmlGenerator::new(GenerateOptions::new().with_ocr_workers(2), &engine)
        .generate(&doc)
        .unwrap();

    assert!(result.assets.is_empty());
    assert!(result.html.contains(">Chart 200x150</p>"));
    assert!(result.html.contains(">Q1 revenue</p>"));
}
