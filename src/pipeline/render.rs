//! PDF rasterisation: render every page via pdfium and scan it for a QR code.
//!
//! ## Threading
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! async-safe. The whole open → render → scan loop runs on the blocking
//! pool, bounded by the configured load timeout.
//!
//! pdfium keeps process-global state: dropping a `Pdfium` tears the library
//! down for every other holder. The library is therefore bound once, kept
//! in [`shared_pdfium`], and never dropped.
//!
//! A timed-out scan cannot be interrupted mid-page. It sees its cancel flag
//! before the next page and stops there.
//!
//! Pages are visited in order, one at a time. Each rendered bitmap goes
//! straight to [`locate_qr_in_image`] in tolerant mode, since a page without
//! a QR code is expected in a multi-page certificate.

use crate::config::{PageHitPolicy, VerifierConfig};
use crate::error::VerifyError;
use crate::pipeline::locate::locate_qr_in_image;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

static SHARED_PDFIUM: Mutex<Option<Arc<Pdfium>>> = Mutex::new(None);

/// The process-wide pdfium instance, bound on first use.
///
/// `library_path` only matters for the first successful binding; later
/// callers share that instance whatever path they name. A failed binding is
/// not cached, so a later call with a valid path can still succeed.
pub fn shared_pdfium(library_path: Option<&Path>) -> Result<Arc<Pdfium>, VerifyError> {
    let mut slot = SHARED_PDFIUM.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(ref pdfium) = *slot {
        return Ok(Arc::clone(pdfium));
    }

    let bindings = match library_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| VerifyError::PdfiumBindingFailed(format!("{:?}", e)))?;

    info!(
        "Bound pdfium ({})",
        library_path.map_or("system library".to_string(), |p| p.display().to_string())
    );
    let pdfium = Arc::new(Pdfium::new(bindings));
    *slot = Some(Arc::clone(&pdfium));
    Ok(pdfium)
}

/// Renders PDF pages and scans them for a QR code.
///
/// Built from a [`VerifierConfig`]; carries the render scale, pixel cap,
/// hit policy and pdfium library location explicitly rather than through
/// process-wide state.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    scale: f32,
    max_pixels: u32,
    policy: PageHitPolicy,
    library_path: Option<PathBuf>,
    load_timeout: Duration,
}

impl PdfRenderer {
    pub fn from_config(config: &VerifierConfig) -> Self {
        Self {
            scale: config.render_scale,
            max_pixels: config.max_rendered_pixels,
            policy: config.page_policy,
            library_path: config.pdfium_library_path.clone(),
            load_timeout: Duration::from_secs(config.pdf_load_timeout_secs),
        }
    }

    /// Scan every page of `bytes` and return the winning QR payload.
    pub async fn scan(&self, bytes: Vec<u8>, format: &str) -> Result<String, VerifyError> {
        let renderer = self.clone();
        let label = format.to_string();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let task =
            tokio::task::spawn_blocking(move || renderer.scan_blocking(&bytes, &label, &flag));

        match tokio::time::timeout(self.load_timeout, task).await {
            Ok(joined) => {
                joined.map_err(|e| VerifyError::Internal(format!("Render task panicked: {e}")))?
            }
            Err(_) => {
                cancelled.store(true, Ordering::Relaxed);
                warn!(
                    "PDF rendering exceeded {}s; stopping after the current page",
                    self.load_timeout.as_secs()
                );
                Err(VerifyError::Internal(format!(
                    "PDF rendering timed out after {}s",
                    self.load_timeout.as_secs()
                )))
            }
        }
    }

    /// Blocking implementation of the page loop.
    fn scan_blocking(
        &self,
        bytes: &[u8],
        format: &str,
        cancelled: &AtomicBool,
    ) -> Result<String, VerifyError> {
        let pdfium = shared_pdfium(self.library_path.as_deref())?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| VerifyError::InvalidPdf {
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let max_px = i32::try_from(self.max_pixels).unwrap_or(i32::MAX);
        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(self.scale)
            .set_maximum_width(max_px)
            .set_maximum_height(max_px);

        let page_results =
            (0..total_pages).map(|idx| scan_page(&pages, idx, &render_config, format));

        match select_hit(page_results, self.policy, cancelled)? {
            Some((page_num, text)) => {
                info!("Using QR code from page {}/{}", page_num, total_pages);
                Ok(text)
            }
            None => Err(VerifyError::NoQrFound {
                format: format.to_string(),
            }),
        }
    }
}

/// Render page `idx` (0-based) and look for a QR code on it.
fn scan_page(
    pages: &PdfPages<'_>,
    idx: usize,
    render_config: &PdfRenderConfig,
    format: &str,
) -> Result<Option<String>, VerifyError> {
    let page_num = idx + 1;
    let page = pages
        .get(idx as u16)
        .map_err(|e| VerifyError::RasterisationFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| VerifyError::RasterisationFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );

    let found = locate_qr_in_image(&image, format, true)?;
    if found.is_some() {
        debug!("QR code found on page {}", page_num);
    }
    Ok(found)
}

/// Pick the winning page from lazily produced per-page scan results.
///
/// Results are pulled one page at a time, so `FirstHit` never renders past
/// the first hit and a raised `cancelled` flag stops before the next page.
/// Returns the 1-based page number with its payload.
pub(crate) fn select_hit<I>(
    page_results: I,
    policy: PageHitPolicy,
    cancelled: &AtomicBool,
) -> Result<Option<(usize, String)>, VerifyError>
where
    I: IntoIterator<Item = Result<Option<String>, VerifyError>>,
{
    let mut pages = page_results.into_iter();
    let mut hit = None;
    let mut page_num = 0;

    loop {
        if cancelled.load(Ordering::Relaxed) {
            return Err(VerifyError::Internal(format!(
                "PDF scan cancelled after {page_num} page(s)"
            )));
        }
        let Some(result) = pages.next() else {
            break;
        };
        page_num += 1;

        if let Some(text) = result? {
            hit = Some((page_num, text));
            if policy == PageHitPolicy::FirstHit {
                break;
            }
        }
    }
    Ok(hit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_copies_settings() {
        let config = VerifierConfig::builder()
            .render_scale(2.0)
            .page_policy(PageHitPolicy::FirstHit)
            .pdf_load_timeout_secs(5)
            .build()
            .unwrap();
        let r = PdfRenderer::from_config(&config);
        assert_eq!(r.scale, 2.0);
        assert_eq!(r.policy, PageHitPolicy::FirstHit);
        assert_eq!(r.load_timeout, Duration::from_secs(5));
        assert!(r.library_path.is_none());
    }

    #[tokio::test]
    async fn missing_library_is_a_binding_failure() {
        let config = VerifierConfig::builder()
            .pdfium_library_path("/nonexistent/libpdfium.so")
            .build()
            .unwrap();
        let err = PdfRenderer::from_config(&config)
            .scan(b"%PDF-1.4".to_vec(), "QRCode")
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::PdfiumBindingFailed(_)), "got: {err}");
        assert!(err.scan_bucket().starts_with("Unknown error: "));
    }

    fn pages(results: &[Option<&str>]) -> Vec<Result<Option<String>, VerifyError>> {
        results.iter().map(|r| Ok(r.map(str::to_string))).collect()
    }

    #[test]
    fn last_hit_keeps_scanning() {
        let flag = AtomicBool::new(false);
        let hit = select_hit(
            pages(&[Some("one"), None, Some("three")]),
            PageHitPolicy::LastHit,
            &flag,
        )
        .unwrap();
        assert_eq!(hit, Some((3, "three".to_string())));
    }

    #[test]
    fn first_hit_stops_pulling_pages() {
        let flag = AtomicBool::new(false);
        let pulled = std::cell::Cell::new(0);
        let lazy = [None, Some("two"), Some("three")].into_iter().map(|r| {
            pulled.set(pulled.get() + 1);
            Ok(r.map(str::to_string))
        });
        let hit = select_hit(lazy, PageHitPolicy::FirstHit, &flag).unwrap();
        assert_eq!(hit, Some((2, "two".to_string())));
        assert_eq!(pulled.get(), 2);
    }

    #[test]
    fn only_middle_page_wins_under_either_policy() {
        let flag = AtomicBool::new(false);
        for policy in [PageHitPolicy::LastHit, PageHitPolicy::FirstHit] {
            let hit = select_hit(pages(&[None, Some("p2"), None]), policy, &flag).unwrap();
            assert_eq!(hit, Some((2, "p2".to_string())), "{policy:?}");
        }
    }

    #[test]
    fn no_hit_is_none() {
        let flag = AtomicBool::new(false);
        assert_eq!(
            select_hit(pages(&[None, None]), PageHitPolicy::LastHit, &flag).unwrap(),
            None
        );
        assert_eq!(
            select_hit(Vec::new(), PageHitPolicy::LastHit, &flag).unwrap(),
            None
        );
    }

    #[test]
    fn page_error_propagates() {
        let flag = AtomicBool::new(false);
        let results = vec![
            Ok(Some("one".to_string())),
            Err(VerifyError::RasterisationFailed {
                page: 2,
                detail: "boom".into(),
            }),
        ];
        let err = select_hit(results, PageHitPolicy::LastHit, &flag).unwrap_err();
        assert!(matches!(err, VerifyError::RasterisationFailed { page: 2, .. }));
    }

    #[test]
    fn cancel_flag_stops_before_next_page() {
        let flag = AtomicBool::new(false);
        let pulled = std::cell::Cell::new(0);
        let lazy = [None, None, Some("late")].into_iter().map(|r| {
            pulled.set(pulled.get() + 1);
            // a timeout fires while page 1 is rendering
            flag.store(true, Ordering::Relaxed);
            Ok(r.map(str::to_string))
        });
        let err = select_hit(lazy, PageHitPolicy::LastHit, &flag).unwrap_err();
        assert!(err.to_string().contains("cancelled after 1 page"), "got: {err}");
        assert_eq!(pulled.get(), 1);
    }
}
