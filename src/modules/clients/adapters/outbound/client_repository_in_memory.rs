use crate::modules::clients::adapters::outbound::client_outbox::stage_client_events;
use crate::modules::clients::core::client::{Client, ClientId};
use crate::modules::clients::core::ports::{ClientRepository, ClientRepositoryError};
use crate::shared::infrastructure::outbox::OutboxStore;
use crate::shared::infrastructure::outbox::in_memory::InMemoryOutboxStore;
use crate::shared::infrastructure::outbox::writer::OutboxWriter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct InMemoryClientRepository {
    clients: Mutex<HashMap<ClientId, Client>>,
    outbox: Arc<InMemoryOutboxStore>,
    is_offline: bool,
}

impl InMemoryClientRepository {
    pub fn new(outbox: Arc<InMemoryOutboxStore>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            outbox,
            is_offline: false,
        }
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }
}

#[async_trait::async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn save(&self, client: &mut Client) -> Result<(), ClientRepositoryError> {
        if self.is_offline {
            return Err(ClientRepositoryError::Backend(
                "Client repository offline".into(),
            ));
        }
        let mut writer = OutboxWriter::new();
        stage_client_events(&mut writer, client.pending_events())?;

        let mut snapshot = client.clone();
        snapshot.clear_events();
        writer
            .commit_with(|messages| async move {
                // Holding the lock across both writes keeps them one unit of work.
                let mut clients = self.clients.lock().await;
                let email_taken = clients
                    .values()
                    .any(|c| c.email() == snapshot.email() && c.id() != snapshot.id());
                if email_taken {
                    return Err(ClientRepositoryError::EmailTaken(
                        snapshot.email().to_string(),
                    ));
                }
                self.outbox.insert_all(&messages).await?;
                clients.insert(snapshot.id(), snapshot);
                Ok(())
            })
            .await?;
        client.clear_events();
        Ok(())
    }

    async fn find_by_id(&self, id: ClientId) -> Result<Option<Client>, ClientRepositoryError> {
        if self.is_offline {
            return Err(ClientRepositoryError::Backend(
                "Client repository offline".into(),
            ));
        }
        Ok(self.clients.lock().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, ClientRepositoryError> {
        if self.is_offline {
            return Err(ClientRepositoryError::Backend(
                "Client repository offline".into(),
            ));
        }
        let email = email.trim();
        Ok(self
            .clients
            .lock()
            .await
            .values()
            .find(|c| c.email() == email)
            .cloned())
    }
}
