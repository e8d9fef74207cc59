pub mod popups;
pub mod settings_tab;
pub mod trees;
