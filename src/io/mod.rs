//! Raster ingestion and artifact output

pub mod assets;
pub mod raster;

pub use assets::AssetWriter;
pub use raster::RasterReader;
