use crate::modules::products::adapters::outbound::product_outbox::stage_product_events;
use crate::modules::products::core::ports::{ProductRepository, ProductRepositoryError};
use crate::modules::products::core::product::{Product, ProductId};
use crate::shared::infrastructure::database::{
    DatabaseError, SqliteDatabase, from_micros, to_micros,
};
use crate::shared::infrastructure::outbox::sqlite::insert_messages;
use crate::shared::infrastructure::outbox::writer::OutboxWriter;
use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};

#[derive(Clone)]
pub struct SqliteProductRepository {
    db: SqliteDatabase,
}

impl SqliteProductRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn save(&self, product: &mut Product) -> Result<(), ProductRepositoryError> {
        let mut writer = OutboxWriter::new();
        stage_product_events(&mut writer, product.pending_events())?;
        let (id, name, created_at) = (
            product.id().to_string(),
            product.name().to_string(),
            to_micros(product.created_at()),
        );
        let db = self.db.clone();
        writer
            .commit_with(|messages| async move {
                db.transaction(move |tx| {
                    tx.execute(
                        "INSERT INTO products (id, name, created_at) VALUES (?1, ?2, ?3)
                         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
                        params![id, name, created_at],
                    )
                    .map_err(DatabaseError::from)?;
                    insert_messages(tx, &messages)?;
                    Ok::<_, ProductRepositoryError>(())
                })
                .await
            })
            .await?;
        product.clear_events();
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError> {
        let key = id.to_string();
        let row = self
            .db
            .call(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT name, created_at FROM products WHERE id = ?1",
                        [key],
                        |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
                    )
                    .optional()?)
            })
            .await?;
        match row {
            Some((name, created_at)) => Ok(Some(Product::restore(
                id,
                name,
                from_micros(created_at)?,
            ))),
            None => Ok(None),
        }
    }
}
