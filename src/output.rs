use std::io::{self, Write};

use serde::Serialize;

use crate::app::{CogResult, CollectionResult, ExtentAssetResult, ItemResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_collection(result: &CollectionResult) -> io::Result<()> {
        Self::emit(result)
    }

    pub fn print_cog(result: &CogResult) -> io::Result<()> {
        Self::emit(result)
    }

    pub fn print_item(result: &ItemResult) -> io::Result<()> {
        Self::emit(result)
    }

    pub fn print_extent_asset(result: &ExtentAssetResult) -> io::Result<()> {
        Self::emit(result)
    }

    /// One pretty-printed JSON document per command on stdout.
    fn emit<T: Serialize>(value: &T) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, value).map_err(io::Error::other)?;
        writeln!(stdout)
    }
}

pub struct HumanOutput;

impl HumanOutput {
    pub fn print_collection(result: &CollectionResult) {
        println!("collection {} -> {}", result.id, result.path);
        for item in &result.items {
            Self::print_item(item);
        }
    }

    pub fn print_cog(result: &CogResult) {
        if result.dry_run {
            println!("dry run, no COGs written");
        }
        for cog in &result.cogs {
            println!("cog {cog}");
        }
    }

    pub fn print_item(result: &ItemResult) {
        let kind = if result.tiled { "tile" } else { "full" };
        println!("item {} ({kind}) -> {}", result.id, result.path);
    }

    pub fn print_extent_asset(result: &ExtentAssetResult) {
        println!("extent {}", result.path);
    }
}
