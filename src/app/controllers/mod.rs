pub mod analysis_controller;
pub mod layout_controller;
pub mod settings_controller;
