use quittung_core::config::Settings;
use quittung_core::error::QuittungError;
use quittung_core::extraction::pdftotext::PdftotextExtractor;
use tracing::warn;

pub fn run(settings: &Settings) -> Result<(), QuittungError> {
    if !PdftotextExtractor::is_available() {
        warn!("pdftotext was not found on PATH, every document will fail to extract");
    }

    let extractor = PdftotextExtractor::with_options(settings.extraction.clone());
    let summary = quittung_core::run_batch(settings, &extractor)?;

    println!(
        "{} document(s): {} exported to {}, {} without table, {} failed",
        summary.total(),
        summary.processed.len(),
        settings.paths.output_dir.display(),
        summary.no_table.len(),
        summary.failed.len()
    );
    for (path, reason) in &summary.failed {
        println!("  failed: {} ({})", path.display(), reason);
    }

    Ok(())
}
