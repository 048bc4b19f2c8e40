mod mpv;

pub use mpv::play;
