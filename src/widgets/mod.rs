pub mod contract_table;
pub mod controls;
pub mod debug;
pub mod detail_panel;
