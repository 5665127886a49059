pub mod object_delivery;
pub mod object_policy;
pub mod object_register;
pub mod object_upload;
