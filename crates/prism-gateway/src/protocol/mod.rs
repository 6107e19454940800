//! Wire format types for the caller and upstream API protocols
//!
//! Each module contains pure serde structs matching the respective API's
//! JSON format. These types are only used for serialization/deserialization
//! at the boundary and are not used internally.

pub mod claude;
pub mod openai;
pub mod upstream;
