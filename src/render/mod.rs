pub mod assets;
pub mod fonts;
pub mod metrics;
pub mod rasterizer;
pub mod target;

pub use assets::AssetResolver;
pub use fonts::FontRegistry;
pub use rasterizer::{RasterOptions, Rasterizer, RenderJob, ResvgRasterizer};
pub use target::{Raster, RenderTarget};
