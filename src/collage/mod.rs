//! Collage rendering: raster, text, item photos, composition and persistence.

/// Premultiplied RGBA8 canvas and source-over compositing.
pub mod canvas;
/// Paints a layout plan into a canvas.
pub mod compositor;
/// Item photo loading.
pub mod loader;
/// Output persistence and timestamped file names.
pub mod store;
/// Text overlay rasterized through SVG.
pub mod text;
