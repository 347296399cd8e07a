pub mod mugshot;

pub use mugshot::{Badge, CreateMugshot, Mugshot, UpdateMugshot, ValidationError};
