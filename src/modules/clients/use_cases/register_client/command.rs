#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterClient {
    pub email: String,
}
