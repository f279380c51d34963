use crate::modules::products::adapters::outbound::product_outbox::stage_product_events;
use crate::modules::products::core::ports::{ProductRepository, ProductRepositoryError};
use crate::modules::products::core::product::{Product, ProductId};
use crate::shared::infrastructure::outbox::OutboxStore;
use crate::shared::infrastructure::outbox::in_memory::InMemoryOutboxStore;
use crate::shared::infrastructure::outbox::writer::OutboxWriter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct InMemoryProductRepository {
    products: Mutex<HashMap<ProductId, Product>>,
    outbox: Arc<InMemoryOutboxStore>,
    is_offline: bool,
}

impl InMemoryProductRepository {
    pub fn new(outbox: Arc<InMemoryOutboxStore>) -> Self {
        Self {
            products: Mutex::new(HashMap::new()),
            outbox,
            is_offline: false,
        }
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }

    fn ensure_online(&self) -> Result<(), ProductRepositoryError> {
        if self.is_offline {
            return Err(ProductRepositoryError::Backend(
                "Product repository offline".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn save(&self, product: &mut Product) -> Result<(), ProductRepositoryError> {
        self.ensure_online()?;
        let mut writer = OutboxWriter::new();
        stage_product_events(&mut writer, product.pending_events())?;

        let mut snapshot = product.clone();
        snapshot.clear_events();
        writer
            .commit_with(|messages| async move {
                let mut products = self.products.lock().await;
                self.outbox.insert_all(&messages).await?;
                products.insert(snapshot.id(), snapshot);
                Ok::<_, ProductRepositoryError>(())
            })
            .await?;
        product.clear_events();
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError> {
        self.ensure_online()?;
        Ok(self.products.lock().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod in_memory_product_repository_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn it_should_store_the_product_with_its_event() {
        let outbox = Arc::new(InMemoryOutboxStore::new());
        let repository = InMemoryProductRepository::new(outbox.clone());
        let mut product = Product::create("Teapot").unwrap();

        repository.save(&mut product).await.unwrap();

        assert!(product.pending_events().is_empty());
        assert_eq!(outbox.all().await.len(), 1);
        assert!(repository.find_by_id(product.id()).await.unwrap().is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_the_product_unsaved_when_the_outbox_fails() {
        let mut outbox = InMemoryOutboxStore::new();
        outbox.toggle_offline();
        let repository = InMemoryProductRepository::new(Arc::new(outbox));
        let mut product = Product::create("Teapot").unwrap();

        let result = repository.save(&mut product).await;

        assert!(matches!(result, Err(ProductRepositoryError::Outbox(_))));
        assert_eq!(product.pending_events().len(), 1);
        assert!(repository.find_by_id(product.id()).await.unwrap().is_none());
    }
}
