pub mod action_log;
pub mod asset;
pub mod asset_model;
pub mod checkout_acceptance;
pub mod company;
pub mod custom_field;
pub mod custom_fieldset;
pub mod license;
pub mod license_seat;
pub mod location;
pub mod setting;
pub mod status_label;
pub mod user;
