use crate::modules::clients::adapters::outbound::client_outbox::stage_client_events;
use crate::modules::clients::core::client::{Client, ClientId};
use crate::modules::clients::core::ports::{ClientRepository, ClientRepositoryError};
use crate::shared::infrastructure::database::{
    DatabaseError, DatabaseResult, SqliteDatabase, from_micros, to_micros,
};
use crate::shared::infrastructure::outbox::sqlite::insert_messages;
use crate::shared::infrastructure::outbox::writer::OutboxWriter;
use async_trait::async_trait;
use rusqlite::{ErrorCode, OptionalExtension, Row, params};

struct ClientRow {
    id: String,
    email: String,
    registered_at: i64,
    email_updated_at: i64,
}

impl ClientRow {
    fn from_client(client: &Client) -> Self {
        Self {
            id: client.id().to_string(),
            email: client.email().to_string(),
            registered_at: to_micros(client.registered_at()),
            email_updated_at: to_micros(client.email_updated_at()),
        }
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            registered_at: row.get(2)?,
            email_updated_at: row.get(3)?,
        })
    }

    fn into_client(self) -> DatabaseResult<Client> {
        let id: ClientId = self
            .id
            .parse()
            .map_err(|e| DatabaseError::InvalidData(format!("client id {}: {e}", self.id)))?;
        Ok(Client::restore(
            id,
            self.email,
            from_micros(self.registered_at)?,
            from_micros(self.email_updated_at)?,
        ))
    }
}

#[derive(Clone)]
pub struct SqliteClientRepository {
    db: SqliteDatabase,
}

impl SqliteClientRepository {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    async fn find_one(
        &self,
        column: &'static str,
        value: String,
    ) -> Result<Option<Client>, ClientRepositoryError> {
        let row = self
            .db
            .call(move |conn| {
                let sql = format!(
                    "SELECT id, email, registered_at, email_updated_at FROM clients WHERE {column} = ?1"
                );
                Ok(conn.query_row(&sql, [value], ClientRow::read).optional()?)
            })
            .await?;
        Ok(row.map(ClientRow::into_client).transpose()?)
    }
}

fn upsert_client(tx: &rusqlite::Transaction<'_>, row: &ClientRow) -> Result<(), ClientRepositoryError> {
    let result = tx.execute(
        "INSERT INTO clients (id, email, registered_at, email_updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            email = excluded.email,
            email_updated_at = excluded.email_updated_at",
        params![row.id, row.email, row.registered_at, row.email_updated_at],
    );
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            Err(ClientRepositoryError::EmailTaken(row.email.clone()))
        }
        Err(e) => Err(DatabaseError::from(e).into()),
    }
}

#[async_trait]
impl ClientRepository for SqliteClientRepository {
    async fn save(&self, client: &mut Client) -> Result<(), ClientRepositoryError> {
        let mut writer = OutboxWriter::new();
        stage_client_events(&mut writer, client.pending_events())?;
        let row = ClientRow::from_client(client);
        let db = self.db.clone();
        writer
            .commit_with(|messages| async move {
                db.transaction(move |tx| {
                    upsert_client(tx, &row)?;
                    insert_messages(tx, &messages)?;
                    Ok::<_, ClientRepositoryError>(())
                })
                .await
            })
            .await?;
        client.clear_events();
        Ok(())
    }

    async fn find_by_id(&self, id: ClientId) -> Result<Option<Client>, ClientRepositoryError> {
        self.find_one("id", id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, ClientRepositoryError> {
        self.find_one("email", email.trim().to_string()).await
    }
}
