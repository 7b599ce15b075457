pub mod appointment;
pub mod consultation;
pub mod doctor;
pub mod enums;
pub mod patient;

pub use appointment::*;
pub use consultation::*;
pub use doctor::*;
pub use enums::*;
pub use patient::*;
