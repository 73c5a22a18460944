pub mod events;
pub mod models;
pub mod shutdown;
pub mod traits;

pub use events::*;
pub use models::*;
pub use shutdown::*;
pub use traits::*;
