use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use anyhow::{bail, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use log::info;
use pdfium_render::prelude::*;

use crate::pages::PageSelection;

const JPEG_QUALITY: u8 = 90;

/// One conversion request, built when the user hits start and consumed by a
/// single run.
pub struct ConvertRequest {
    pub pdf_path: PathBuf,
    pub out_dir: PathBuf,
    pub selection: PageSelection,
}

/// Events the worker pushes back to the UI. Progress is percent of the
/// rasterized span handled so far; exactly one terminal event ends a run.
pub enum ConvertEvent {
    Progress(f32),
    Done,
    Failed(String),
}

/// Convert the selected pages of `request.pdf_path` into numbered JPEGs in
/// `request.out_dir`, emitting a `Progress` event per span position.
///
/// Returns the number of files written. Any failure aborts the run; files
/// already written are left in place.
pub fn convert(request: &ConvertRequest, events: &Sender<ConvertEvent>) -> Result<usize> {
    if !request.out_dir.is_dir() {
        bail!("save path {} is not an existing directory", request.out_dir.display());
    }

    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(&request.pdf_path, None)
        .with_context(|| format!("could not open {}", request.pdf_path.display()))?;
    let page_count = document.pages().len();

    let Some((first, last)) = raster_span(&request.selection, page_count) else {
        // Nothing falls inside the document; an empty run still succeeds
        return Ok(0);
    };
    let total = (last - first + 1) as usize;

    let render_config = PdfRenderConfig::new()
        .set_target_width(1600)
        .set_maximum_height(2400);

    let mut written = 0;
    for (i, page_number) in (first..=last).enumerate() {
        // Selection membership and file numbering are both relative to the
        // rasterized span, not to the document
        if request.selection.keeps(i) {
            let page = document.pages().get(page_number - 1)?;
            let bitmap = page.render_with_config(&render_config)?;
            let rgb = bitmap.as_image().to_rgb8();

            let path = request.out_dir.join(output_file_name(i));
            let file = File::create(&path)
                .with_context(|| format!("could not create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)
                .with_context(|| format!("could not encode {}", path.display()))?;
            writer
                .flush()
                .with_context(|| format!("could not write {}", path.display()))?;

            info!("wrote page {} of {} to {}", page_number, page_count, path.display());
            written += 1;
        }
        let _ = events.send(ConvertEvent::Progress(progress_percent(i + 1, total)));
    }

    Ok(written)
}

/// The contiguous 1-based page span to rasterize: the whole document for
/// `All`, otherwise the minimal span covering the selection, clamped to the
/// document length. `None` when there is nothing to rasterize at all.
fn raster_span(selection: &PageSelection, page_count: u16) -> Option<(u16, u16)> {
    if page_count == 0 {
        return None;
    }
    match selection.bounds() {
        None => Some((1, page_count)),
        Some((min, max)) => {
            if min >= page_count as usize {
                return None;
            }
            let first = (min + 1) as u16;
            let last = (max + 1).min(page_count as usize) as u16;
            Some((first, last))
        }
    }
}

fn output_file_name(span_index: usize) -> String {
    format!("output_{}.jpg", span_index + 1)
}

fn progress_percent(handled: usize, total: usize) -> f32 {
    handled as f32 / total as f32 * 100.0
}

fn bind_pdfium() -> Result<Pdfium> {
    // Prefer a pdfium library shipped next to the executable, then the system one
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .context("pdfium library not found next to the executable or on the system")?;
    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_destination_fails_before_any_work() {
        let (tx, rx) = std::sync::mpsc::channel();
        let request = ConvertRequest {
            pdf_path: PathBuf::from("document.pdf"),
            out_dir: PathBuf::from("/nonexistent/outdir"),
            selection: PageSelection::All,
        };

        let result = convert(&request, &tx);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("not an existing directory"));
        // Nothing was rasterized, so no progress was emitted either
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn span_for_all_pages_is_whole_document() {
        assert_eq!(raster_span(&PageSelection::All, 7), Some((1, 7)));
        assert_eq!(raster_span(&PageSelection::All, 1), Some((1, 1)));
    }

    #[test]
    fn span_for_empty_document_is_empty() {
        assert_eq!(raster_span(&PageSelection::All, 0), None);
        assert_eq!(raster_span(&PageSelection::parse("1,2"), 0), None);
    }

    #[test]
    fn span_covers_min_to_max_of_selection() {
        // "2,4" -> indices {1,3} -> pages 2..=4
        assert_eq!(raster_span(&PageSelection::parse("2,4"), 10), Some((2, 4)));
    }

    #[test]
    fn span_end_is_clamped_to_document() {
        // "2,4,9" in a 7-page document -> pages 2..=7
        assert_eq!(raster_span(&PageSelection::parse("2,4,9"), 7), Some((2, 7)));
    }

    #[test]
    fn span_entirely_past_document_is_empty() {
        assert_eq!(raster_span(&PageSelection::parse("9"), 5), None);
    }

    #[test]
    fn file_names_are_one_based_within_span() {
        assert_eq!(output_file_name(0), "output_1.jpg");
        assert_eq!(output_file_name(6), "output_7.jpg");
    }

    #[test]
    fn span_relative_matching_drops_out_of_span_indices() {
        // Selecting "3,5" from a 10-page document rasterizes pages 3..=5 and
        // keeps only span position 2, written as output_3.jpg
        let selection = PageSelection::parse("3,5");
        let (first, last) = raster_span(&selection, 10).unwrap();
        assert_eq!((first, last), (3, 5));
        let names: Vec<String> = (0..(last - first + 1) as usize)
            .filter(|&i| selection.keeps(i))
            .map(output_file_name)
            .collect();
        assert_eq!(names, vec!["output_3.jpg"]);
    }

    #[test]
    fn progress_reaches_exactly_one_hundred() {
        // 7-page document, spec "2,4,9": 6-page span, 2 files, progress
        // still climbs to 100 across the skipped tail
        let selection = PageSelection::parse("2,4,9");
        let (first, last) = raster_span(&selection, 7).unwrap();
        let total = (last - first + 1) as usize;

        let mut written = 0;
        let mut progress = Vec::new();
        for i in 0..total {
            if selection.keeps(i) {
                written += 1;
            }
            progress.push(progress_percent(i + 1, total));
        }

        assert_eq!(written, 2);
        assert!(progress.windows(2).all(|p| p[0] <= p[1]));
        assert_eq!(*progress.last().unwrap(), 100.0);
    }

    #[test]
    fn full_document_writes_every_page() {
        let (first, last) = raster_span(&PageSelection::All, 4).unwrap();
        let names: Vec<String> = (0..(last - first + 1) as usize)
            .filter(|&i| PageSelection::All.keeps(i))
            .map(output_file_name)
            .collect();
        assert_eq!(names, vec!["output_1.jpg", "output_2.jpg", "output_3.jpg", "output_4.jpg"]);
    }
}
