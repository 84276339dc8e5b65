use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::event::{
    NightAuditSubmitted, ReservationBooked, ReservationCheckedIn, ReservationCheckedOut,
};
use crate::domain::event_bus::{EventHandler, HandlerError};
use crate::domain::model::{HousekeepingStatus, HousekeepingTask};
use crate::domain::port::{HousekeepingGateway, Logger};

/// 処理済みイベントを追跡するためのリポジトリ
/// 実際の実装では永続化ストレージ（Redis、データベースなど）を使用
#[derive(Clone)]
pub struct ProcessedEventTracker {
    processed_events: Arc<Mutex<HashSet<Uuid>>>,
}

impl Default for ProcessedEventTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessedEventTracker {
    pub fn new() -> Self {
        Self {
            processed_events: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// イベントが既に処理済みかチェック
    pub async fn is_processed(&self, event_id: Uuid) -> bool {
        let processed = self.processed_events.lock().await;
        processed.contains(&event_id)
    }

    /// イベントを処理済みとしてマーク
    pub async fn mark_processed(&self, event_id: Uuid) {
        let mut processed = self.processed_events.lock().await;
        processed.insert(event_id);
    }
}

/// ハウスキーピングハンドラー
/// チェックアウトイベントを受信して要清掃タスクを作成する
pub struct HousekeepingHandler {
    housekeeping: Arc<dyn HousekeepingGateway>,
    processed_events: ProcessedEventTracker,
    logger: Arc<dyn Logger>,
}

impl HousekeepingHandler {
    /// 新しいハウスキーピングハンドラーを作成
    pub fn new(housekeeping: Arc<dyn HousekeepingGateway>, logger: Arc<dyn Logger>) -> Self {
        Self {
            housekeeping,
            processed_events: ProcessedEventTracker::new(),
            logger,
        }
    }
}

#[async_trait]
impl EventHandler<ReservationCheckedOut> for HousekeepingHandler {
    async fn handle(&self, event: ReservationCheckedOut) -> Result<(), HandlerError> {
        // ハンドラー開始ログ
        let mut context = HashMap::new();
        context.insert("event_type".to_string(), "ReservationCheckedOut".to_string());
        self.logger.info(
            "HousekeepingHandler",
            "Processing ReservationCheckedOut event",
            Some(event.metadata.correlation_id),
            Some(context),
        );

        let start_time = std::time::Instant::now();

        // 冪等性チェック: 既に処理済みのイベントかどうか確認
        if self
            .processed_events
            .is_processed(event.metadata.event_id)
            .await
        {
            let mut context = HashMap::new();
            context.insert("event_id".to_string(), event.metadata.event_id.to_string());
            context.insert("already_processed".to_string(), "true".to_string());

            self.logger.debug(
                "HousekeepingHandler",
                "Idempotency check: Event already processed, skipping",
                Some(event.metadata.correlation_id),
                Some(context),
            );
            return Ok(());
        }

        // アサイン済みの各客室に要清掃タスクを1件ずつ作成
        for room in &event.rooms {
            let task =
                HousekeepingTask::new(room.clone(), HousekeepingStatus::Dirty, event.date);
            self.housekeeping.create_task(&task).await.map_err(|e| {
                HandlerError::RepositoryError(format!("要清掃タスクの作成に失敗: {}", e))
            })?;
        }

        // イベントを処理済みとしてマーク（成功時）
        self.processed_events
            .mark_processed(event.metadata.event_id)
            .await;

        // 処理成功ログ
        let execution_time = start_time.elapsed();
        let mut context = HashMap::new();
        context.insert("event_type".to_string(), "ReservationCheckedOut".to_string());
        context.insert("rooms".to_string(), event.rooms.len().to_string());
        context.insert(
            "execution_time_ms".to_string(),
            execution_time.as_millis().to_string(),
        );

        self.logger.info(
            "HousekeepingHandler",
            "ReservationCheckedOut event processed successfully",
            Some(event.metadata.correlation_id),
            Some(context),
        );

        Ok(())
    }
}

/// 通知ハンドラー
/// 各種予約イベントを受信して通知を送信する
#[derive(Clone)]
pub struct NotificationHandler {
    logger: Arc<dyn Logger>,
}

impl NotificationHandler {
    /// 新しい通知ハンドラーを作成
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// 通知メッセージを送信（実装では外部サービスを呼び出し）
    async fn send_notification(
        &self,
        message: &str,
        correlation_id: Uuid,
    ) -> Result<(), HandlerError> {
        // 実際の実装では外部通知サービス（メール、SMSなど）を呼び出し
        // 今回はログ出力で代用
        self.logger
            .info("NotificationHandler", message, Some(correlation_id), None);
        Ok(())
    }
}

#[async_trait]
impl EventHandler<ReservationBooked> for NotificationHandler {
    async fn handle(&self, event: ReservationBooked) -> Result<(), HandlerError> {
        let message = format!(
            "ご予約が確定されました。予約ID: {}, 期間: {}, 合計金額: {}円",
            event.reservation_id,
            event.stay,
            event.net_total.amount()
        );
        self.send_notification(&message, event.metadata.correlation_id)
            .await
    }
}

#[async_trait]
impl EventHandler<ReservationCheckedIn> for NotificationHandler {
    async fn handle(&self, event: ReservationCheckedIn) -> Result<(), HandlerError> {
        let rooms = event
            .rooms
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!(
            "チェックインしました。予約ID: {}, 客室: {}",
            event.reservation_id, rooms
        );
        self.send_notification(&message, event.metadata.correlation_id)
            .await
    }
}

#[async_trait]
impl EventHandler<ReservationCheckedOut> for NotificationHandler {
    async fn handle(&self, event: ReservationCheckedOut) -> Result<(), HandlerError> {
        let message = format!(
            "チェックアウトしました。予約ID: {}, 日付: {}",
            event.reservation_id, event.date
        );
        self.send_notification(&message, event.metadata.correlation_id)
            .await
    }
}

#[async_trait]
impl EventHandler<NightAuditSubmitted> for NotificationHandler {
    async fn handle(&self, event: NightAuditSubmitted) -> Result<(), HandlerError> {
        let message = format!(
            "ナイトオーディットが提出されました。会社: {}, 日付: {}, 転記行数: {}",
            event.company, event.date, event.posted_lines
        );
        self.send_notification(&message, event.metadata.correlation_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ReservationId, RoomId};
    use crate::domain::port::RepositoryError;
    use chrono::NaiveDate;

    // テスト用のモックロガー
    #[derive(Clone)]
    struct MockLogger;

    impl Logger for MockLogger {
        fn debug(
            &self,
            _component: &str,
            _message: &str,
            _correlation_id: Option<Uuid>,
            _context: Option<HashMap<String, String>>,
        ) {
        }

        fn info(
            &self,
            _component: &str,
            _message: &str,
            _correlation_id: Option<Uuid>,
            _context: Option<HashMap<String, String>>,
        ) {
        }

        fn warn(
            &self,
            _component: &str,
            _message: &str,
            _correlation_id: Option<Uuid>,
            _context: Option<HashMap<String, String>>,
        ) {
        }

        fn error(
            &self,
            _component: &str,
            _message: &str,
            _correlation_id: Option<Uuid>,
            _context: Option<HashMap<String, String>>,
        ) {
        }
    }

    // テスト用のモックハウスキーピングゲートウェイ
    struct MockHousekeepingGateway {
        dirty_rooms: Mutex<Vec<(RoomId, NaiveDate)>>,
    }

    impl MockHousekeepingGateway {
        fn new() -> Self {
            Self {
                dirty_rooms: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HousekeepingGateway for MockHousekeepingGateway {
        async fn create_task(&self, task: &HousekeepingTask) -> Result<(), RepositoryError> {
            assert_eq!(task.status(), HousekeepingStatus::Dirty);
            self.dirty_rooms
                .lock()
                .await
                .push((task.room().clone(), task.date()));
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_checkout_creates_housekeeping_task_per_room() {
        let gateway = Arc::new(MockHousekeepingGateway::new());
        let handler = HousekeepingHandler::new(gateway.clone(), Arc::new(MockLogger));

        let event = ReservationCheckedOut::new(
            ReservationId::new(),
            vec![
                RoomId::new("101").unwrap(),
                RoomId::new("102").unwrap(),
            ],
            date(2024, 1, 12),
            true,
        );

        handler.handle(event).await.unwrap();

        let dirty = gateway.dirty_rooms.lock().await;
        assert_eq!(dirty.len(), 2);
        assert_eq!(dirty[0].0.as_str(), "101");
        assert_eq!(dirty[1].0.as_str(), "102");
    }

    #[tokio::test]
    async fn test_duplicate_checkout_event_is_skipped() {
        let gateway = Arc::new(MockHousekeepingGateway::new());
        let handler = HousekeepingHandler::new(gateway.clone(), Arc::new(MockLogger));

        let event = ReservationCheckedOut::new(
            ReservationId::new(),
            vec![RoomId::new("101").unwrap()],
            date(2024, 1, 12),
            true,
        );

        handler.handle(event.clone()).await.unwrap();
        handler.handle(event).await.unwrap();

        // 同じイベントIDの再配信ではタスクを増やさない
        let dirty = gateway.dirty_rooms.lock().await;
        assert_eq!(dirty.len(), 1);
    }

    #[tokio::test]
    async fn test_notification_handler_booked() {
        use crate::domain::model::{CompanyCode, GuestId, Money, StayRange};

        let handler = NotificationHandler::new(Arc::new(MockLogger));
        let stay = StayRange::new(date(2024, 1, 10), date(2024, 1, 12)).unwrap();
        let event =
            ReservationBooked::new(ReservationId::new(), GuestId::new(), stay, Money::jpy(200));
        assert!(handler.handle(event).await.is_ok());

        let audit = NightAuditSubmitted::new(
            CompanyCode::new("GRAND-HOTEL").unwrap(),
            date(2024, 1, 10),
            3,
        );
        assert!(handler.handle(audit).await.is_ok());
    }
}
