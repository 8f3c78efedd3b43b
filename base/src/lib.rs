pub mod setting;
pub mod util;

pub const CLI_NAME: &str = "discog";
pub const VERSION: &str = "0.2.0";
pub const GITHUB: &str = "codeberg.org/discog/discog";

// logging constants
pub const DISCOG_LOGLEVEL: &str = "DISCOG_LOGLEVEL";

// credential overrides, read once while loading settings
pub const SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
