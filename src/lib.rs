//! subgen - video to subtitle pipeline
//!
//! Extracts audio from video with ffmpeg, asks a generative model for
//! subtitles or translations, and only hands back SRT that passed validation.

pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod media;
pub mod model;
pub mod server;
pub mod subtitle;
pub mod transcribe;
pub mod translate;
pub mod workflow;
