#![forbid(unsafe_code)]

//! Interactive light-strip segmenter: command line and terminal loop.

pub mod app;
pub mod cli;
