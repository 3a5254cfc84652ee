pub mod context;
pub mod mercure;
pub mod resolver;
pub mod stage;
pub mod subscription;

pub use context::*;
pub use mercure::*;
pub use resolver::*;
pub use stage::*;
pub use subscription::*;
