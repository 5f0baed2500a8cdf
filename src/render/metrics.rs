use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter, IntCounterVec};

pub static CERTIFICATES_RASTERIZED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "certgen_certificates_rasterized_total",
        "Certificates captured to a bitmap"
    )
    .expect("metric name is valid and unique")
});

pub static CERTIFICATES_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "certgen_certificates_failed_total",
        "Certificates skipped because rasterization failed"
    )
    .expect("metric name is valid and unique")
});

pub static RASTERIZE_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "certgen_rasterize_duration_seconds",
        "Time spent rasterizing one certificate",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("metric name is valid and unique")
});

pub static EXPORT_FILES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "certgen_export_files_total",
        "Export files produced, by format",
        &["format"]
    )
    .expect("metric name is valid and unique")
});
