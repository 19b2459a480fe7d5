pub mod edit_service;
pub mod export_service;
pub mod query_service;
pub mod reference_service;
pub mod view_model;
