mod window;

pub use window::*;
