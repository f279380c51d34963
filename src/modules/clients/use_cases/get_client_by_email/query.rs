#[derive(Debug, Clone)]
pub struct GetClientByEmail {
    pub email: String,
}
