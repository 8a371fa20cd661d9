use uuid::Uuid;

/// Trait for generating session token values
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random (v4) UUID token generator - 122 random bits rendered as a string
pub struct UuidTokenGenerator;

impl UuidTokenGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UuidTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGenerator for UuidTokenGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
