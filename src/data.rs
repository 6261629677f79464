mod config_ort;
mod fps_counter;
mod loop_config;
mod session_params;
mod time_calc;

pub use config_ort::ConfigOrt;
pub use fps_counter::FpsCounter;
pub use loop_config::*;
pub use session_params::*;
pub use time_calc::TimeCalc;

pub use crate::detection_runners::ort_detector::input_wrapper::X;

pub(crate) const CROSS_MARK: &str = "❌";
