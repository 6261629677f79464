mod bbox;
mod detection;
mod frame;
mod inference_device;
mod model_config;
mod model_version;

pub use bbox::*;
pub use detection::*;
pub use frame::*;
pub use inference_device::*;
pub use model_config::*;
pub use model_version::*;
