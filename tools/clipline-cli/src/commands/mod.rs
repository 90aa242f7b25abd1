pub mod config;
pub mod estimate;
pub mod replay;
pub mod thumbnails;
