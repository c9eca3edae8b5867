pub mod file;
pub mod frame;
pub mod playback;

pub use file::AudioFile;
pub use frame::AudioFrame;
pub use playback::{FilePlayback, FilePlaybackConfig};
