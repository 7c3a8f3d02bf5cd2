mod config_ort;
mod filesystem_access;
mod time_calc;

pub use config_ort::ConfigOrt;

pub use crate::detection_runners::ort_detector::dyn_conf::DynConf;
pub use crate::detection_runners::ort_detector::input_wrapper::X;
pub use crate::detection_runners::ort_detector::xs::Xs;
pub use crate::detection_runners::ort_detector::y::Y;

pub use filesystem_access::FsAccess;
pub use time_calc::TimeCalc;

pub(crate) const CROSS_MARK: &str = "❌";
