use eframe::egui::ColorImage;
use tracing::debug;

/// Longest edge of the preview shown next to the form
const PREVIEW_MAX: u32 = 240;

/// Downloads and decodes the thumbnail a metadata record points at.
/// Blocking; run it off the UI thread.
pub fn fetch_thumbnail(url: &str) -> Option<ColorImage> {
    let resp = match reqwest::blocking::get(url).and_then(|r| r.error_for_status()) {
        Ok(resp) => resp,
        Err(e) => {
            debug!(url, error = %e, "thumbnail request failed");
            return None;
        }
    };
    let bytes = resp.bytes().ok()?;
    decode_thumbnail(&bytes)
}

/// Decodes image bytes into an egui image scaled down to preview size.
pub fn decode_thumbnail(bytes: &[u8]) -> Option<ColorImage> {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            debug!(error = %e, "thumbnail decode failed");
            return None;
        }
    };
    let img = if img.width() > PREVIEW_MAX || img.height() > PREVIEW_MAX {
        img.thumbnail(PREVIEW_MAX, PREVIEW_MAX)
    } else {
        img
    }
    .to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, &img))
}
