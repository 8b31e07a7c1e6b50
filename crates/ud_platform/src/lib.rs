pub mod screenshot;
pub mod traits;
pub mod window;

pub use screenshot::*;
pub use traits::*;
pub use window::*;
