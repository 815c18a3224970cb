//! Fila de emails
//!
//! El núcleo solo encola `{recipient, subject, body}` en una lista de Redis;
//! un worker externo consume y entrega. El contrato es "intento de encolado",
//! nunca se espera ni se depende del resultado de la entrega.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Nombre de la lista en Redis consumida por el worker de emails
pub const SEND_EMAIL_QUEUE: &str = "SEND_EMAIL_QUEUE";

/// Notificación a entregar por email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailDto {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

// Envelope persistido en la fila
#[derive(Debug, Serialize, Deserialize)]
struct EmailJob {
    id: Uuid,
    #[serde(flatten)]
    email: SendEmailDto,
    enqueued_at: DateTime<Utc>,
}

#[async_trait]
pub trait EmailQueue: Send + Sync {
    /// Encolar un email. Fire-and-forget: el que llama decide si loguear
    /// o ignorar el error, nunca debe bloquear la operación que lo disparó.
    async fn enqueue(&self, email: SendEmailDto) -> Result<(), AppError>;
}

/// Implementación sobre Redis (lista + RPUSH), igual que la fila del worker
#[derive(Clone)]
pub struct RedisEmailQueue {
    manager: ConnectionManager,
}

impl RedisEmailQueue {
    pub async fn new(redis_url: &str) -> anyhow::Result<Self> {
        info!("🔗 Conectando a Redis: {}", redis_url);

        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis conectado exitosamente");

        Ok(Self { manager })
    }
}

#[async_trait]
impl EmailQueue for RedisEmailQueue {
    async fn enqueue(&self, email: SendEmailDto) -> Result<(), AppError> {
        let job = EmailJob {
            id: Uuid::new_v4(),
            email,
            enqueued_at: Utc::now(),
        };

        let payload = serde_json::to_string(&job)
            .map_err(|e| AppError::Internal(format!("Error serializando email: {}", e)))?;

        let mut conn = self.manager.clone();
        let _: i64 = conn
            .rpush(SEND_EMAIL_QUEUE, payload)
            .await
            .map_err(|e| AppError::Internal(format!("Error encolando email: {}", e)))?;

        Ok(())
    }
}

/// Fila en memoria para tests: acumula los emails encolados
#[derive(Default)]
pub struct InMemoryEmailQueue {
    emails: Mutex<Vec<SendEmailDto>>,
}

impl InMemoryEmailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SendEmailDto> {
        self.emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailQueue for InMemoryEmailQueue {
    async fn enqueue(&self, email: SendEmailDto) -> Result<(), AppError> {
        self.emails.lock().unwrap().push(email);
        Ok(())
    }
}
