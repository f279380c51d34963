use crate::modules::products::core::ports::ProductRepository;
use crate::modules::products::core::product::{Product, ProductId};
use crate::modules::products::use_cases::application_error::ApplicationError;
use crate::modules::products::use_cases::create_product::command::CreateProduct;
use std::sync::Arc;
use tracing::info;

pub struct CreateProductHandler {
    repository: Arc<dyn ProductRepository>,
}

impl CreateProductHandler {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, command: CreateProduct) -> Result<ProductId, ApplicationError> {
        let mut product = Product::create(&command.name)?;
        self.repository.save(&mut product).await?;
        info!(product_id = %product.id(), "Product created");
        Ok(product.id())
    }
}
