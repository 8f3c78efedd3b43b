pub mod dump;
pub mod fetch;
pub mod pipeline;
pub mod rank;
pub mod release;
pub mod render;

pub use pipeline::{run, Report};
pub use release::{Embed, Provider, Release, ReleaseClass, ReleaseType, Track};
