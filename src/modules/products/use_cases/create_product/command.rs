#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProduct {
    pub name: String,
}
