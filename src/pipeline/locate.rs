//! Image rasterisation and QR symbol location.
//!
//! The blob is decoded at its natural resolution, flattened to 8-bit luma
//! and handed to `rqrr`, which finds candidate grids and decodes them. The
//! first grid that decodes wins.
//!
//! The `tolerant` flag exists for PDF scanning: a page without a QR code is
//! normal there (the code may be on another page), so it yields `Ok(None)`
//! instead of [`VerifyError::NoQrFound`].

use crate::error::VerifyError;
use image::DynamicImage;
use tracing::debug;

/// Decode an image blob and look for a QR code in it.
pub fn locate_qr(bytes: &[u8], format: &str, tolerant: bool) -> Result<Option<String>, VerifyError> {
    let img = image::load_from_memory(bytes).map_err(|e| VerifyError::InvalidFile {
        detail: e.to_string(),
    })?;
    locate_qr_in_image(&img, format, tolerant)
}

/// Look for a QR code in an already-decoded image.
pub fn locate_qr_in_image(
    img: &DynamicImage,
    format: &str,
    tolerant: bool,
) -> Result<Option<String>, VerifyError> {
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    debug!("Scanning {}x{} px for {}", width, height, format);

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| luma.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    debug!("{} candidate grid(s)", grids.len());

    for (i, grid) in grids.iter().enumerate() {
        match grid.decode() {
            Ok((_meta, content)) => {
                debug!("Grid {} decoded → {} chars", i, content.len());
                return Ok(Some(content));
            }
            Err(e) => debug!("Grid {} did not decode: {:?}", i, e),
        }
    }

    if tolerant {
        Ok(None)
    } else {
        Err(VerifyError::NoQrFound {
            format: format.to_string(),
        })
    }
}
