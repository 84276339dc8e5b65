use crate::application::ApplicationError;
use crate::domain::model::{ItemCode, Room, RoomTypeId, StayRange};
use crate::domain::port::{ReservationRepository, RoomInventoryRepository};
use crate::domain::service::{AvailabilityCalculator, RoomCountCache};
use chrono::NaiveDate;
use std::sync::Arc;

/// 空室照会サービス
/// フロントデスクの空室表示向けの読み取り専用クエリを提供する
pub struct OccupancyQueryService {
    reservation_repository: Arc<dyn ReservationRepository>,
    inventory_repository: Arc<dyn RoomInventoryRepository>,
    availability: Arc<AvailabilityCalculator>,
}

impl OccupancyQueryService {
    /// 新しい空室照会サービスを作成
    pub fn new(
        reservation_repository: Arc<dyn ReservationRepository>,
        inventory_repository: Arc<dyn RoomInventoryRepository>,
        availability: Arc<AvailabilityCalculator>,
    ) -> Self {
        Self {
            reservation_repository,
            inventory_repository,
            availability,
        }
    }

    /// 指定期間にアサイン可能な物理客室を取得
    ///
    /// パッケージの客室タイプに属する客室のうち、期間と重なる
    /// アクティブなアサインが無いものを返す
    pub async fn available_rooms(
        &self,
        item: &ItemCode,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<Room>, ApplicationError> {
        let range = StayRange::new(from_date, to_date)?;
        let room_type = self
            .inventory_repository
            .room_type_of(item)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("パッケージが見つかりません: {}", item))
            })?;

        let mut free = Vec::new();
        for room in self.inventory_repository.rooms_of(&room_type).await? {
            let allotments = self
                .reservation_repository
                .find_active_allotments(room.id(), &range, None)
                .await?;
            if allotments.is_empty() {
                free.push(room);
            }
        }
        Ok(free)
    }

    /// 客室タイプの日ごとの残室数を取得
    ///
    /// 予約チャート表示用に、期間内の各宿泊日の残室数を返す
    pub async fn remaining_by_day(
        &self,
        room_type: &RoomTypeId,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<(NaiveDate, u32)>, ApplicationError> {
        let range = StayRange::new(from_date, to_date)?;
        let mut cache = RoomCountCache::new();
        let mut remaining = Vec::new();
        for night in range.nights() {
            let free = self.availability.remaining(room_type, night, &mut cache).await?;
            remaining.push((night, free));
        }
        Ok(remaining)
    }
}
