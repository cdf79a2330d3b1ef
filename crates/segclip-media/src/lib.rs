//! FFmpeg wrapper for clip extraction.
//!
//! Invokes the `ffmpeg` binary as a subprocess; stream-copy cuts for
//! clips and a two-pass palette pipeline for GIFs. Individual transcoder
//! failures are reported as boolean results so batch extraction can
//! continue past them.

pub mod command;
pub mod error;
pub mod extract;

pub use command::{check_ffmpeg, FfmpegCommand};
pub use error::{MediaError, MediaResult};
pub use extract::{
    convert_to_gif, extract_all_segments, extract_all_segments_as_gifs, extract_segment,
    GifOptions,
};
