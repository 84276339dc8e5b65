use crate::domain::event::DomainEvent;
use async_trait::async_trait;

/// イベントハンドラーエラー
#[derive(Debug, Clone, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
    #[error("Domain error: {0}")]
    DomainError(String),
    #[error("Transient error (retryable): {0}")]
    TransientError(String),
    #[error("Permanent error (not retryable): {0}")]
    PermanentError(String),
}

/// イベントハンドラートレイト
/// 特定のイベントタイプを処理するハンドラーを定義
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    async fn handle(&self, event: E) -> Result<(), HandlerError>;
}

/// 型消去されたイベントハンドラー
/// 異なるイベントタイプのハンドラーを統一的に扱うため
#[async_trait]
pub trait DynEventHandler: Send + Sync {
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError>;
    fn can_handle(&self, event: &DomainEvent) -> bool;
    fn handler_name(&self) -> &str;
    fn supports_schema_version(&self, version: u32) -> bool;
}

/// ReservationBooked用のハンドラーラッパー
pub struct ReservationBookedHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationBooked>,
{
    handler: H,
    name: String,
}

impl<H> ReservationBookedHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationBooked>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            name: "ReservationBookedHandler".to_string(),
        }
    }

    pub fn with_name(handler: H, name: String) -> Self {
        Self { handler, name }
    }
}

#[async_trait]
impl<H> DynEventHandler for ReservationBookedHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationBooked>,
{
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event {
            DomainEvent::ReservationBooked(e) => self.handler.handle(e.clone()).await,
            _ => Err(HandlerError::ProcessingFailed(
                "Event type mismatch".to_string(),
            )),
        }
    }

    fn can_handle(&self, event: &DomainEvent) -> bool {
        matches!(event, DomainEvent::ReservationBooked(_))
    }

    fn handler_name(&self) -> &str {
        &self.name
    }

    fn supports_schema_version(&self, version: u32) -> bool {
        version >= 1
    }
}

/// ReservationCheckedIn用のハンドラーラッパー
pub struct ReservationCheckedInHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationCheckedIn>,
{
    handler: H,
    name: String,
}

impl<H> ReservationCheckedInHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationCheckedIn>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            name: "ReservationCheckedInHandler".to_string(),
        }
    }

    pub fn with_name(handler: H, name: String) -> Self {
        Self { handler, name }
    }
}

#[async_trait]
impl<H> DynEventHandler for ReservationCheckedInHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationCheckedIn>,
{
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event {
            DomainEvent::ReservationCheckedIn(e) => self.handler.handle(e.clone()).await,
            _ => Err(HandlerError::ProcessingFailed(
                "Event type mismatch".to_string(),
            )),
        }
    }

    fn can_handle(&self, event: &DomainEvent) -> bool {
        matches!(event, DomainEvent::ReservationCheckedIn(_))
    }

    fn handler_name(&self) -> &str {
        &self.name
    }

    fn supports_schema_version(&self, version: u32) -> bool {
        version >= 1
    }
}

/// ReservationCheckedOut用のハンドラーラッパー
pub struct ReservationCheckedOutHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationCheckedOut>,
{
    handler: H,
    name: String,
}

impl<H> ReservationCheckedOutHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationCheckedOut>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            name: "ReservationCheckedOutHandler".to_string(),
        }
    }

    pub fn with_name(handler: H, name: String) -> Self {
        Self { handler, name }
    }
}

#[async_trait]
impl<H> DynEventHandler for ReservationCheckedOutHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationCheckedOut>,
{
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event {
            DomainEvent::ReservationCheckedOut(e) => self.handler.handle(e.clone()).await,
            _ => Err(HandlerError::ProcessingFailed(
                "Event type mismatch".to_string(),
            )),
        }
    }

    fn can_handle(&self, event: &DomainEvent) -> bool {
        matches!(event, DomainEvent::ReservationCheckedOut(_))
    }

    fn handler_name(&self) -> &str {
        &self.name
    }

    fn supports_schema_version(&self, version: u32) -> bool {
        version >= 1
    }
}

/// NightAuditSubmitted用のハンドラーラッパー
pub struct NightAuditSubmittedHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::NightAuditSubmitted>,
{
    handler: H,
    name: String,
}

impl<H> NightAuditSubmittedHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::NightAuditSubmitted>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            name: "NightAuditSubmittedHandler".to_string(),
        }
    }

    pub fn with_name(handler: H, name: String) -> Self {
        Self { handler, name }
    }
}

#[async_trait]
impl<H> DynEventHandler for NightAuditSubmittedHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::NightAuditSubmitted>,
{
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event {
            DomainEvent::NightAuditSubmitted(e) => self.handler.handle(e.clone()).await,
            _ => Err(HandlerError::ProcessingFailed(
                "Event type mismatch".to_string(),
            )),
        }
    }

    fn can_handle(&self, event: &DomainEvent) -> bool {
        matches!(event, DomainEvent::NightAuditSubmitted(_))
    }

    fn handler_name(&self) -> &str {
        &self.name
    }

    fn supports_schema_version(&self, version: u32) -> bool {
        version >= 1
    }
}
