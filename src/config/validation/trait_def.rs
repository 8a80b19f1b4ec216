//! Validation trait definition

/// Configuration section that can explain why it is invalid
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}
