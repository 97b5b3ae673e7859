// Sun Jul 26 2026 - Alex

pub mod logging;

pub use logging::ScopedTimer;
