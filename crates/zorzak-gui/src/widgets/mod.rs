/// UI widgets for Zorzak.

pub mod status_bar;
pub mod toolbar;
