//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category_order;
pub mod class_order;
pub mod material;
pub mod payment;
pub mod project;
pub mod purchase;
pub mod student;
pub mod system_state;

// Re-export specific types to avoid conflicts
pub use category_order::{
    Column as CategoryOrderColumn, Entity as CategoryOrder, Model as CategoryOrderModel,
};
pub use class_order::{Column as ClassOrderColumn, Entity as ClassOrder, Model as ClassOrderModel};
pub use material::{
    Column as MaterialColumn, Entity as Material, Model as MaterialModel, PricingType,
};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use project::{Column as ProjectColumn, Entity as Project, Model as ProjectModel};
pub use purchase::{Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
