pub mod locks;
pub mod presence;
pub mod registry;
pub mod relay;
pub mod session;

pub use locks::*;
pub use registry::*;
pub use session::*;
