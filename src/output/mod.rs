// Output module - Terminal presentation and report rendering

pub mod report;
pub mod terminal;
