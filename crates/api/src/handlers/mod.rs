pub mod process;
pub mod uploads;
