pub mod logging;
pub mod window;
