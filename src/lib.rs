pub mod acquire;
pub mod app;
pub mod cog;
pub mod config;
pub mod constants;
pub mod error;
pub mod extent;
pub mod fs_util;
pub mod metadata;
pub mod opendata;
pub mod output;
pub mod process;
pub mod raster;
pub mod stac;
pub mod tiler;
