// Adapters layer: concrete implementations of the domain ports.

pub mod catalog;

pub use catalog::EquipmentCatalog;
