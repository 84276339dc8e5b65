// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::event::DomainEvent;
use crate::domain::model::{
    CompanyCode, CustomerId, GroupId, GuestId, HousekeepingTask, ItemCode, LineItem,
    NightAuditRun, PricingPeriod, Reservation, ReservationId, ReservationStatus, Room,
    RoomAllotment, RoomId, RoomPackage, RoomType, RoomTypeId, StayRange,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// データベース接続に失敗
    ConnectionFailed(String),
    /// 操作に失敗
    OperationFailed(String),
    /// データの取得に失敗
    FetchFailed(String),
    /// コミット時の再検証で競合を検出（同時予約による在庫超過など）
    ConflictDetected(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RepositoryError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            RepositoryError::FetchFailed(msg) => write!(f, "Fetch failed: {}", msg),
            RepositoryError::ConflictDetected(msg) => write!(f, "Conflict detected: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// 予約リポジトリトレイト
/// 予約集約の永続化を抽象化する
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// 予約を保存する
    ///
    /// # Arguments
    /// * `reservation` - 保存する予約
    ///
    /// # Returns
    /// * `Ok(())` - 保存成功
    /// * `Err(RepositoryError)` - 保存失敗
    async fn save(&self, reservation: &Reservation) -> Result<(), RepositoryError>;

    /// 検証済みの予約を確定保存する
    ///
    /// 空室確認と同一客室アサインの重複確認を単一トランザクション内で
    /// 再実行してからコミットする。アプリケーション層の事前チェックを
    /// すり抜けた同時予約は `RepositoryError::ConflictDetected` になる。
    ///
    /// # Arguments
    /// * `reservation` - 保存する予約
    /// * `capacities` - 客室タイプごとの物理客室数（再検証に使用）
    async fn save_booked(
        &self,
        reservation: &Reservation,
        capacities: &HashMap<RoomTypeId, u32>,
    ) -> Result<(), RepositoryError>;

    /// 予約IDで予約を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Reservation))` - 予約が見つかった
    /// * `Ok(None)` - 予約が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError>;

    /// 指定されたステータスの予約を取得する
    async fn find_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    /// 同じグループIDを持つ予約を取得する（一括請求用）
    async fn find_by_group(&self, group_id: GroupId) -> Result<Vec<Reservation>, RepositoryError>;

    /// 指定された客室タイプ・期間に宿泊日が重なるアクティブな予約を取得する
    ///
    /// アクティブとはDraft以外のステータスを指す。`exclude` に予約IDを
    /// 渡すと、その予約自身を除外して自己編集時の再検証に使える。
    async fn find_active_overlapping(
        &self,
        room_type: &RoomTypeId,
        range: &StayRange,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    /// 指定された客室・期間に重なるアクティブな客室アサインを取得する
    async fn find_active_allotments(
        &self,
        room: &RoomId,
        range: &StayRange,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<(ReservationId, RoomAllotment)>, RepositoryError>;

    /// 指定された会社のChecked In状態の予約を取得する
    async fn find_checked_in(
        &self,
        company: &CompanyCode,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    /// 新しい一意の予約IDを生成する
    fn next_identity(&self) -> ReservationId;
}

/// 客室在庫リポジトリトレイト
/// 客室・客室タイプ・パッケージの参照データを抽象化する
#[async_trait]
pub trait RoomInventoryRepository: Send + Sync {
    /// 販売アイテムが解決される客室タイプを取得する
    async fn room_type_of(&self, item: &ItemCode)
        -> Result<Option<RoomTypeId>, RepositoryError>;

    /// 客室タイプに属する物理客室を取得する
    async fn rooms_of(&self, room_type: &RoomTypeId) -> Result<Vec<Room>, RepositoryError>;

    /// 客室タイプに属する物理客室数を取得する
    async fn room_count(&self, room_type: &RoomTypeId) -> Result<u32, RepositoryError>;

    /// 客室コードで客室を検索する
    async fn find_room(&self, room: &RoomId) -> Result<Option<Room>, RepositoryError>;

    /// 客室タイプコードで客室タイプを検索する
    async fn find_room_type(
        &self,
        room_type: &RoomTypeId,
    ) -> Result<Option<RoomType>, RepositoryError>;

    /// 客室タイプを保存する
    async fn save_room_type(&self, room_type: &RoomType) -> Result<(), RepositoryError>;

    /// 客室を保存する
    async fn save_room(&self, room: &Room) -> Result<(), RepositoryError>;

    /// 客室パッケージを保存する
    async fn save_package(&self, package: &RoomPackage) -> Result<(), RepositoryError>;
}

/// 料金リポジトリトレイト
/// 料金期間の読み取り専用クエリを抽象化する
#[async_trait]
pub trait PricingRepository: Send + Sync {
    /// 販売アイテムの料金期間を取得する
    async fn periods_for(&self, item: &ItemCode) -> Result<Vec<PricingPeriod>, RepositoryError>;

    /// 料金期間を保存する
    async fn save_period(&self, period: &PricingPeriod) -> Result<(), RepositoryError>;
}

/// ナイトオーディットリポジトリトレイト
#[async_trait]
pub trait NightAuditRepository: Send + Sync {
    /// (会社, 日付) の実行を取得し、存在しなければ作成する
    ///
    /// キー一意性の違反を例外的な制御フローにせず、明示的な
    /// upsert操作として原子的に解決する
    async fn get_or_create(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<NightAuditRun, RepositoryError>;

    /// 実行を保存する
    async fn save(&self, run: &NightAuditRun) -> Result<(), RepositoryError>;

    /// (会社, 日付) の実行を検索する
    async fn find(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<Option<NightAuditRun>, RepositoryError>;
}

/// ハウスキーピングゲートウェイトレイト
/// チェックアウト時の「要清掃」イベントを受け付ける外部コラボレーター
#[async_trait]
pub trait HousekeepingGateway: Send + Sync {
    /// ハウスキーピングタスクを受け付ける（チェックアウトごとに1件）
    async fn create_task(&self, task: &HousekeepingTask) -> Result<(), RepositoryError>;
}

/// 宿泊客の表示情報
#[derive(Debug, Clone, PartialEq)]
pub struct GuestProfile {
    pub full_name: String,
    pub mobile_no: Option<String>,
}

/// 宿泊客ディレクトリトレイト
/// 監査行の補強に使う表示名・連絡先を提供する外部コラボレーター
#[async_trait]
pub trait GuestDirectory: Send + Sync {
    /// 宿泊客の表示情報を取得する
    async fn profile(&self, guest: GuestId) -> Result<Option<GuestProfile>, RepositoryError>;
}

/// 請求書の参照番号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRef(pub String);

impl std::fmt::Display for InvoiceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 請求エラー
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Invoice creation failed: {0}")]
    InvoiceCreationFailed(String),
    #[error("No customer available: {0}")]
    NoCustomer(String),
}

/// 請求ゲートウェイトレイト
/// コアは明細行 (アイテム, 数量, 単価, 金額) と顧客だけを供給し、
/// 請求書と税計算は外部コラボレーターが担う
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// 請求書を発行する
    async fn issue_invoice(
        &self,
        company: &CompanyCode,
        customer: CustomerId,
        lines: &[LineItem],
    ) -> Result<InvoiceRef, BillingError>;
}

/// イベントバスエラー
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event publishing failed: {0}")]
    PublishingFailed(String),
}

/// イベントバストレイト
/// イベントの発行と配信を管理するポート
#[async_trait]
pub trait EventBus: Send + Sync {
    /// イベントを発行し、登録されたハンドラーに配信
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError>;
}
