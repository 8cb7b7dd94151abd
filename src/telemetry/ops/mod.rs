pub mod run;
pub mod pick;
pub mod schedule;
