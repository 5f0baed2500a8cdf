use image::RgbImage;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg::{fontdb::Database, Options, Tree};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{CertificateError, CertificateResult};

static LIVE_TARGETS: AtomicUsize = AtomicUsize::new(0);

/// Bitmap of one certificate at `pixel_ratio` device pixels per CSS pixel.
#[derive(Debug, Clone)]
pub struct Raster {
    pub image: RgbImage,
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

/// An isolated, mounted certificate tree. Dropping it tears it down, so the
/// target never outlives the job that created it.
pub struct RenderTarget {
    id: Uuid,
    tree: Tree,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Parses the visual tree; fails when the root is missing or has nothing to draw.
    pub fn mount(svg: &str, width: u32, height: u32, fontdb: Arc<Database>) -> CertificateResult<Self> {
        if width == 0 || height == 0 {
            return Err(CertificateError::Render(format!(
                "Invalid canvas size {}x{}",
                width, height
            )));
        }

        let options = Options {
            fontdb,
            ..Options::default()
        };
        let tree = Tree::from_str(svg, &options)
            .map_err(|e| CertificateError::Render(format!("Certificate root could not be mounted: {}", e)))?;
        if !tree.root().has_children() {
            return Err(CertificateError::Render("Certificate root is empty".to_string()));
        }

        let id = Uuid::new_v4();
        LIVE_TARGETS.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(target_id = %id, width, height, "Render target mounted");

        Ok(RenderTarget { id, tree, width, height })
    }

    /// Captures exactly the canvas box onto a white backdrop.
    pub fn capture(&self, pixel_ratio: f32) -> CertificateResult<Raster> {
        let width = (self.width as f32 * pixel_ratio).round() as u32;
        let height = (self.height as f32 * pixel_ratio).round() as u32;
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| CertificateError::Render(format!("Cannot allocate a {}x{} bitmap", width, height)))?;
        pixmap.fill(Color::WHITE);

        let size = self.tree.size();
        let transform = Transform::from_scale(width as f32 / size.width(), height as f32 / size.height());
        resvg::render(&self.tree, transform, &mut pixmap.as_mut());

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for pixel in pixmap.pixels() {
            let color = pixel.demultiply();
            rgb.extend_from_slice(&[color.red(), color.green(), color.blue()]);
        }
        let image = RgbImage::from_raw(width, height, rgb)
            .ok_or_else(|| CertificateError::Render("Captured bitmap has the wrong size".to_string()))?;

        Ok(Raster {
            image,
            width,
            height,
            pixel_ratio,
        })
    }

    /// Targets currently mounted in this process.
    pub fn live() -> usize {
        LIVE_TARGETS.load(Ordering::SeqCst)
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        LIVE_TARGETS.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(target_id = %self.id, "Render target torn down");
    }
}
