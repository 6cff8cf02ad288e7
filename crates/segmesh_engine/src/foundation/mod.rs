//! Foundation utilities shared by every layer

pub mod logging;
