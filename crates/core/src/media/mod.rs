//! Local media tooling: ffmpeg/ffprobe, ImageMagick, LibreOffice
//!
//! Every operation builds its argv through a pure function and runs it with
//! [`tools::run`], so the builders can be unit tested without the tools
//! installed.

pub mod audio;
pub mod image;
pub mod office;
pub mod tools;
pub mod video;

pub use tools::Tool;
