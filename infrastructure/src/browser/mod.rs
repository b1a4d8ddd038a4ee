//! Local browser process management

mod launcher;

pub use launcher::{ChromeLauncher, LaunchSettings};
