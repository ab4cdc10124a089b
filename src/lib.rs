//! Copy Steam library artwork onto non-Steam shortcuts.
//!
//! The registry side reads `userdata/<account>/config/shortcuts.vdf` and
//! recovers each shortcut's AppID; the artwork side downloads the four
//! library images for a real AppID into `config/grid` under the shortcut's
//! id, plus the logo placement sidecar.

pub mod app;
pub mod appid;
pub mod cdn;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod shortcuts;
pub mod sidecar;
pub mod tui;
pub mod userdata;
pub mod vdf;
