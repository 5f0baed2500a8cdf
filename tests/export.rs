mod common;

use std::io::Cursor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use certificate_generator::generators::{CertificateExporter, ExportFormat};
use certificate_generator::CertificateError;
use common::{five_jobs, job, StubRasterizer};

fn zip_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[tokio::test]
async fn partial_failures_are_skipped_in_pdf() {
    let exporter = CertificateExporter::new(Arc::new(StubRasterizer::failing(&["c2", "c4"])));
    let outcome = exporter
        .export_pdf("Hội thao", &five_jobs(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.format, ExportFormat::Pdf);
    assert_eq!(outcome.generated, 3);
    assert_eq!(outcome.attempted, 5);
    assert_eq!(outcome.skipped.len(), 2);
    assert_eq!(outcome.skipped[0].certificate_id, "c2");
    assert!(outcome.file_name.starts_with("Hội_thao_"));
    assert!(outcome.file_name.ends_with(".pdf"));

    let document = lopdf::Document::load_mem(&outcome.bytes).unwrap();
    assert_eq!(document.get_pages().len(), 3);
}

#[tokio::test]
async fn partial_failures_are_skipped_in_zip() {
    let exporter = CertificateExporter::new(Arc::new(StubRasterizer::failing(&["c2", "c4"])));
    let outcome = exporter
        .export_zip("Lớp 10A1", &five_jobs(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.generated, 3);
    assert_eq!(
        zip_names(&outcome.bytes),
        vec!["Nguyễn_Văn_A_c1.pdf", "Lê_Văn_C_c3.pdf", "Hoàng_Văn_E_c5.pdf"]
    );

    let mut archive = zip::ZipArchive::new(Cursor::new(outcome.bytes)).unwrap();
    let mut entry = archive.by_index(0).unwrap();
    let mut pdf = Vec::new();
    std::io::Read::read_to_end(&mut entry, &mut pdf).unwrap();
    assert_eq!(lopdf::Document::load_mem(&pdf).unwrap().get_pages().len(), 1);
}

#[tokio::test]
async fn zero_successes_produce_no_file() {
    let ids = ["c1", "c2", "c3", "c4", "c5"];
    let exporter = CertificateExporter::new(Arc::new(StubRasterizer::failing(&ids)));

    let err = exporter
        .export_pdf("x", &five_jobs(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CertificateError::NoOutput { attempted: 5 }));

    let err = exporter
        .export_zip("x", &[], &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CertificateError::NoOutput { attempted: 0 }));
}

#[tokio::test]
async fn duplicate_inputs_keep_every_entry() {
    let exporter = CertificateExporter::new(Arc::new(StubRasterizer::failing(&[])));
    let jobs = vec![job("c1", "An"), job("c1", "An")];

    let pdf = exporter.export_pdf("dup", &jobs, &CancellationToken::new()).await.unwrap();
    assert_eq!(lopdf::Document::load_mem(&pdf.bytes).unwrap().get_pages().len(), 2);

    let zip = exporter.export_zip("dup", &jobs, &CancellationToken::new()).await.unwrap();
    assert_eq!(zip_names(&zip.bytes), vec!["An_c1.pdf", "An_c1_2.pdf"]);
}

#[tokio::test]
async fn worker_pool_preserves_input_order() {
    let stub = StubRasterizer::failing(&[]).with_delay(60);
    let exporter = CertificateExporter::new(Arc::new(stub)).with_workers(4);

    let outcome = exporter
        .export_zip("order", &five_jobs(), &CancellationToken::new())
        .await
        .unwrap();
    let names = zip_names(&outcome.bytes);
    let ids: Vec<&str> = names
        .iter()
        .map(|n| n.trim_end_matches(".pdf").rsplit('_').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["c1", "c2", "c3", "c4", "c5"]);
}

#[tokio::test]
async fn cancelled_exports_stop_between_recipients() {
    let stub = Arc::new(StubRasterizer::failing(&[]));
    let exporter = CertificateExporter::new(stub.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = exporter.export_pdf("x", &five_jobs(), &cancel).await.unwrap_err();
    assert!(matches!(err, CertificateError::Cancelled { completed: 0 }));
    assert_eq!(stub.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelling_mid_batch_keeps_the_completed_count() {
    let cancel = CancellationToken::new();
    let stub = Arc::new(StubRasterizer::failing(&[]).cancelling_after("c2", cancel.clone()));
    let exporter = CertificateExporter::new(stub.clone());

    let err = exporter.export_zip("x", &five_jobs(), &cancel).await.unwrap_err();
    assert!(matches!(err, CertificateError::Cancelled { completed: 2 }));
    assert_eq!(stub.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cancelling_after_the_last_job_still_delivers() {
    let cancel = CancellationToken::new();
    let stub = StubRasterizer::failing(&[]).cancelling_after("c5", cancel.clone());
    let exporter = CertificateExporter::new(Arc::new(stub));

    let outcome = exporter.export_pdf("x", &five_jobs(), &cancel).await.unwrap();
    assert!(cancel.is_cancelled());
    assert_eq!(outcome.generated, 5);
    assert_eq!(outcome.attempted, 5);
}

#[tokio::test]
async fn page_orientation_follows_the_bitmap() {
    let exporter = CertificateExporter::new(Arc::new(StubRasterizer::failing(&[])));
    let jobs = vec![job("c1-portrait", "An"), job("c2", "Bình")];
    let outcome = exporter.export_pdf("mixed", &jobs, &CancellationToken::new()).await.unwrap();

    let document = lopdf::Document::load_mem(&outcome.bytes).unwrap();
    let boxes: Vec<(f64, f64)> = document
        .get_pages()
        .values()
        .map(|id| {
            let page = document.get_object(*id).unwrap().as_dict().unwrap();
            let media = page.get(b"MediaBox").unwrap().as_array().unwrap();
            let number = |o: &lopdf::Object| o.as_float().map(f64::from).or_else(|_| o.as_i64().map(|v| v as f64)).unwrap();
            (number(&media[2]), number(&media[3]))
        })
        .collect();

    assert!(boxes[0].0 < boxes[0].1);
    assert!(boxes[1].0 > boxes[1].1);
}
