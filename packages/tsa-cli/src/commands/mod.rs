pub mod batch;
pub mod describe;
pub mod list;
pub mod run;
