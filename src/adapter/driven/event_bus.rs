use crate::domain::event::DomainEvent;
use crate::domain::event_bus::{
    DynEventHandler, EventHandler, HandlerError, NightAuditSubmittedHandlerWrapper,
    ReservationBookedHandlerWrapper, ReservationCheckedInHandlerWrapper,
    ReservationCheckedOutHandlerWrapper,
};
use crate::domain::port::{EventBus, EventBusError};
use crate::domain::serialization::EventSerializer;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{Mutex, RwLock};

/// 失敗したイベント処理の情報
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct FailedEventProcessing {
    pub event: DomainEvent,
    pub handler_name: String,
    pub error: String,
    pub attempt_count: u32,
    pub first_failed_at: SystemTime,
    pub last_failed_at: SystemTime,
    pub is_retryable: bool,
}

/// デッドレターキューエントリ
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    pub failed_processing: FailedEventProcessing,
    pub added_at: SystemTime,
}

/// イベントバス設定
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// 最大リトライ回数
    pub max_retry_attempts: u32,
    /// リトライ間隔
    pub retry_delay: Duration,
    /// デッドレターキューの最大サイズ
    pub dead_letter_queue_max_size: usize,
    /// ハンドラータイムアウト
    pub handler_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
            dead_letter_queue_max_size: 1000,
            handler_timeout: Duration::from_secs(30),
        }
    }
}

/// インメモリイベントバス実装
/// 開発・テスト用のリトライ・タイムアウト・デッドレターキュー付き実装
pub struct InMemoryEventBus {
    handlers: Arc<RwLock<Vec<Box<dyn DynEventHandler>>>>,
    dead_letter_queue: Arc<Mutex<VecDeque<DeadLetterEntry>>>,
    config: EventBusConfig,
    serializer: EventSerializer,
}

impl InMemoryEventBus {
    /// 設定を指定してインメモリイベントバスを作成
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
            dead_letter_queue: Arc::new(Mutex::new(VecDeque::new())),
            config,
            serializer: EventSerializer::new(),
        }
    }

    /// 予約確定ハンドラーを登録する
    pub async fn subscribe_reservation_booked<H>(&self, handler: H) -> Result<(), EventBusError>
    where
        H: EventHandler<crate::domain::event::ReservationBooked> + 'static,
    {
        let mut handlers = self.handlers.write().await;
        handlers.push(Box::new(ReservationBookedHandlerWrapper::new(handler)));
        Ok(())
    }

    /// チェックインハンドラーを登録する
    pub async fn subscribe_reservation_checked_in<H>(
        &self,
        handler: H,
    ) -> Result<(), EventBusError>
    where
        H: EventHandler<crate::domain::event::ReservationCheckedIn> + 'static,
    {
        let mut handlers = self.handlers.write().await;
        handlers.push(Box::new(ReservationCheckedInHandlerWrapper::new(handler)));
        Ok(())
    }

    /// チェックアウトハンドラーを登録する
    pub async fn subscribe_reservation_checked_out<H>(
        &self,
        handler: H,
    ) -> Result<(), EventBusError>
    where
        H: EventHandler<crate::domain::event::ReservationCheckedOut> + 'static,
    {
        let mut handlers = self.handlers.write().await;
        handlers.push(Box::new(ReservationCheckedOutHandlerWrapper::new(handler)));
        Ok(())
    }

    /// ナイトオーディット提出ハンドラーを登録する
    pub async fn subscribe_night_audit_submitted<H>(&self, handler: H) -> Result<(), EventBusError>
    where
        H: EventHandler<crate::domain::event::NightAuditSubmitted> + 'static,
    {
        let mut handlers = self.handlers.write().await;
        handlers.push(Box::new(NightAuditSubmittedHandlerWrapper::new(handler)));
        Ok(())
    }

    /// デッドレターキューの内容を取得する（運用・テスト用）
    pub async fn dead_letter_entries(&self) -> Vec<DeadLetterEntry> {
        let queue = self.dead_letter_queue.lock().await;
        queue.iter().cloned().collect()
    }

    /// ハンドラーの実行（エラー処理とリトライ機能付き）
    async fn execute_handler_with_retry(
        &self,
        handler: &dyn DynEventHandler,
        event: &DomainEvent,
    ) -> Result<(), HandlerError> {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.config.max_retry_attempts {
            attempts += 1;

            // スキーマバージョンの互換性チェック
            let event_version = event.metadata().event_version;
            if !handler.supports_schema_version(event_version) {
                return Err(HandlerError::PermanentError(format!(
                    "Handler {} does not support schema version {}",
                    handler.handler_name(),
                    event_version
                )));
            }

            // タイムアウト付きでハンドラーを実行
            let result =
                tokio::time::timeout(self.config.handler_timeout, handler.handle_event(event))
                    .await;

            match result {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(handler_error)) => {
                    last_error = Some(handler_error.clone());

                    // 永続的エラーの場合はリトライしない
                    if matches!(handler_error, HandlerError::PermanentError(_)) {
                        break;
                    }

                    // 最後の試行でない場合は待機
                    if attempts < self.config.max_retry_attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
                Err(_) => {
                    last_error = Some(HandlerError::TransientError(format!(
                        "Handler {} timed out",
                        handler.handler_name()
                    )));
                    if attempts < self.config.max_retry_attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            HandlerError::ProcessingFailed("Handler failed without error detail".to_string())
        }))
    }

    /// 失敗した処理をデッドレターキューに追加する
    async fn add_to_dead_letter_queue(
        &self,
        event: &DomainEvent,
        handler_name: &str,
        error: &HandlerError,
    ) {
        let now = SystemTime::now();
        let entry = DeadLetterEntry {
            failed_processing: FailedEventProcessing {
                event: event.clone(),
                handler_name: handler_name.to_string(),
                error: error.to_string(),
                attempt_count: self.config.max_retry_attempts,
                first_failed_at: now,
                last_failed_at: now,
                is_retryable: !matches!(error, HandlerError::PermanentError(_)),
            },
            added_at: now,
        };

        let mut queue = self.dead_letter_queue.lock().await;
        if queue.len() >= self.config.dead_letter_queue_max_size {
            queue.pop_front();
        }
        queue.push_back(entry);
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        // スキーマバージョンを含めて配信可能なイベントか検証する
        self.serializer
            .serialize(&event)
            .map_err(|e| EventBusError::PublishingFailed(e.to_string()))?;

        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            if !handler.can_handle(&event) {
                continue;
            }
            if let Err(error) = self.execute_handler_with_retry(handler.as_ref(), &event).await {
                // ハンドラーの失敗は発行元に伝播させず、デッドレターキューへ
                self.add_to_dead_letter_queue(&event, handler.handler_name(), &error)
                    .await;
            }
        }
        Ok(())
    }
}
