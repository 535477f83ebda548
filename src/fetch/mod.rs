// src/fetch/mod.rs

pub mod registries;
pub mod zips;

pub use registries::download_registries;
pub use zips::{download_file, extract_zip, file_name_from_url};
