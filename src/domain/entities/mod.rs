pub mod accounting;
pub mod childcare;
pub mod edit;
pub mod record;
pub mod scope;
pub mod view;
