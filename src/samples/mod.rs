pub(crate) mod join;
mod loader;
mod selection;
mod window;

pub use loader::load_samples;
pub use selection::SampleSession;
