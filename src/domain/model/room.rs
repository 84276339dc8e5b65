use crate::domain::model::{HousekeepingStatus, ItemCode, RoomId, RoomTypeId};
use chrono::NaiveDate;

/// 客室タイプ
/// 同じ料金とパッケージを共有する物理客室のカテゴリ
#[derive(Debug, Clone, PartialEq)]
pub struct RoomType {
    id: RoomTypeId,
    name: String,
}

impl RoomType {
    /// 新しい客室タイプを作成
    pub fn new(id: RoomTypeId, name: String) -> Self {
        Self { id, name }
    }

    /// 客室タイプコードを取得
    pub fn id(&self) -> &RoomTypeId {
        &self.id
    }

    /// 表示名を取得
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 物理客室
/// ちょうど1つの客室タイプに属する
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    id: RoomId,
    room_type: RoomTypeId,
    housekeeping: HousekeepingStatus,
}

impl Room {
    /// 新しい客室を作成（初期状態はClean）
    pub fn new(id: RoomId, room_type: RoomTypeId) -> Self {
        Self {
            id,
            room_type,
            housekeeping: HousekeepingStatus::Clean,
        }
    }

    /// リポジトリから取得したデータで客室を再構築
    pub fn reconstruct(
        id: RoomId,
        room_type: RoomTypeId,
        housekeeping: HousekeepingStatus,
    ) -> Self {
        Self {
            id,
            room_type,
            housekeeping,
        }
    }

    /// 客室コードを取得
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// 客室タイプを取得
    pub fn room_type(&self) -> &RoomTypeId {
        &self.room_type
    }

    /// ハウスキーピング状態を取得
    pub fn housekeeping(&self) -> HousekeepingStatus {
        self.housekeeping
    }

    /// ハウスキーピング状態を更新する
    /// 予約ステータスとは独立に変化する
    pub fn set_housekeeping(&mut self, status: HousekeepingStatus) {
        self.housekeeping = status;
    }
}

/// 客室パッケージ（販売アイテム）
/// 宿泊客が購入する課金単位で、ちょうど1つの客室タイプに解決される
#[derive(Debug, Clone, PartialEq)]
pub struct RoomPackage {
    item: ItemCode,
    room_type: RoomTypeId,
}

impl RoomPackage {
    /// 新しい客室パッケージを作成
    pub fn new(item: ItemCode, room_type: RoomTypeId) -> Self {
        Self { item, room_type }
    }

    /// 販売アイテムコードを取得
    pub fn item(&self) -> &ItemCode {
        &self.item
    }

    /// 解決先の客室タイプを取得
    pub fn room_type(&self) -> &RoomTypeId {
        &self.room_type
    }
}

/// ハウスキーピングタスク
/// チェックアウト時に1件作成され、清掃担当の作業キューになる
#[derive(Debug, Clone, PartialEq)]
pub struct HousekeepingTask {
    room: RoomId,
    status: HousekeepingStatus,
    date: NaiveDate,
}

impl HousekeepingTask {
    /// 新しいハウスキーピングタスクを作成
    pub fn new(room: RoomId, status: HousekeepingStatus, date: NaiveDate) -> Self {
        Self { room, status, date }
    }

    /// 対象客室を取得
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// 客室状態を取得
    pub fn status(&self) -> HousekeepingStatus {
        self.status
    }

    /// 対象日を取得
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}
