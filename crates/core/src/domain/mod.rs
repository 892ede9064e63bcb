pub mod accessory;
pub mod component;
pub mod measurement;
pub mod quotation;
pub mod section;
