use crate::domain::error::DomainError;
use crate::domain::model::{Reservation, ReservationId, RoomTypeId, StayRange};
use crate::domain::port::{ReservationRepository, RoomInventoryRepository};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::model::ItemCode;

/// リクエストスコープの客室数メモ
///
/// 1回の検証の間だけ客室タイプごとの物理客室数を記憶する。
/// 長寿命オブジェクトのフィールドを変異させる代わりに、呼び出し側が
/// 明示的に生成して渡す
#[derive(Debug, Default)]
pub struct RoomCountCache {
    counts: HashMap<RoomTypeId, u32>,
}

impl RoomCountCache {
    /// 新しい空のメモを作成
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// 記憶済みの客室数を取得
    pub fn get(&self, room_type: &RoomTypeId) -> Option<u32> {
        self.counts.get(room_type).copied()
    }

    /// 客室数を記憶する
    pub fn insert(&mut self, room_type: RoomTypeId, count: u32) {
        self.counts.insert(room_type, count);
    }

    /// 記憶した客室数のマップに変換する（コミット時の再検証に渡す）
    pub fn into_counts(self) -> HashMap<RoomTypeId, u32> {
        self.counts
    }
}

/// 空室計算サービス
/// 既存予約と客室アサインを参照して日ごとの残室数を計算する
pub struct AvailabilityCalculator {
    reservation_repository: Arc<dyn ReservationRepository>,
    inventory_repository: Arc<dyn RoomInventoryRepository>,
}

impl AvailabilityCalculator {
    /// 新しい空室計算サービスを作成
    ///
    /// # Arguments
    /// * `reservation_repository` - 予約リポジトリ
    /// * `inventory_repository` - 客室在庫リポジトリ
    pub fn new(
        reservation_repository: Arc<dyn ReservationRepository>,
        inventory_repository: Arc<dyn RoomInventoryRepository>,
    ) -> Self {
        Self {
            reservation_repository,
            inventory_repository,
        }
    }

    /// 客室タイプの物理客室数を取得する（リクエストスコープでメモ化）
    pub async fn capacity(
        &self,
        room_type: &RoomTypeId,
        cache: &mut RoomCountCache,
    ) -> Result<u32, DomainError> {
        if let Some(count) = cache.get(room_type) {
            return Ok(count);
        }
        let count = self
            .inventory_repository
            .room_count(room_type)
            .await
            .map_err(|e| DomainError::RepositoryError(format!("客室数の取得に失敗: {}", e)))?;
        cache.insert(room_type.clone(), count);
        Ok(count)
    }

    /// 指定した宿泊日に客室タイプを消費している予約数量を合算する
    ///
    /// Draft以外の全予約の滞在行を対象に、パッケージ経由で客室タイプへ
    /// 解決される行の客室数を合計する。`exclude` の予約は除外され、
    /// 自己編集時の再検証に使える
    pub async fn booked(
        &self,
        room_type: &RoomTypeId,
        date: NaiveDate,
        exclude: Option<ReservationId>,
    ) -> Result<u32, DomainError> {
        let night = StayRange::new(date, date + Duration::days(1))?;
        let reservations = self
            .reservation_repository
            .find_active_overlapping(room_type, &night, exclude)
            .await
            .map_err(|e| DomainError::RepositoryError(format!("予約の取得に失敗: {}", e)))?;

        let mut resolved: HashMap<ItemCode, Option<RoomTypeId>> = HashMap::new();
        let mut total = 0u32;
        for reservation in &reservations {
            for line in reservation.items() {
                let Some(period) = line.stay_period() else {
                    continue;
                };
                if !period.contains_night(date) {
                    continue;
                }
                let line_type = self
                    .resolve_room_type(line.item(), &mut resolved)
                    .await?;
                if line_type.as_ref() == Some(room_type) {
                    total += line.room_count().unwrap_or(0);
                }
            }
        }
        Ok(total)
    }

    /// 残室数を取得する（フロントデスクの空室表示用）
    pub async fn remaining(
        &self,
        room_type: &RoomTypeId,
        date: NaiveDate,
        cache: &mut RoomCountCache,
    ) -> Result<u32, DomainError> {
        let capacity = self.capacity(room_type, cache).await?;
        let booked = self.booked(room_type, date, None).await?;
        Ok(capacity.saturating_sub(booked))
    }

    /// 予約の空室確認を行う
    ///
    /// 宿泊日を時系列順に、明細行を宣言順に走査し、同じ客室タイプ・
    /// 同じ日の要求数量を行をまたいで累積してから物理客室数と比較する。
    /// 最初の違反で `DomainError::RoomsUnavailable` を返す
    pub async fn check_availability(
        &self,
        reservation: &Reservation,
        cache: &mut RoomCountCache,
    ) -> Result<(), DomainError> {
        let mut resolved: HashMap<ItemCode, Option<RoomTypeId>> = HashMap::new();
        let mut booked_memo: HashMap<(RoomTypeId, NaiveDate), u32> = HashMap::new();

        for night in reservation.stay().nights() {
            // その日の要求数量を客室タイプごとに累積する
            // 同一タイプの明細行が2本あれば2室分消費する
            let mut requested: HashMap<RoomTypeId, u32> = HashMap::new();
            for line in reservation.items() {
                let Some(period) = line.stay_period() else {
                    continue;
                };
                if !period.contains_night(night) {
                    continue;
                }
                let room_type = self
                    .resolve_room_type(line.item(), &mut resolved)
                    .await?
                    .ok_or_else(|| {
                        DomainError::MissingSelection(format!(
                            "item {} is not mapped to a room type",
                            line.item()
                        ))
                    })?;

                let requested_now = {
                    let entry = requested.entry(room_type.clone()).or_insert(0);
                    *entry += line.room_count().unwrap_or(0);
                    *entry
                };

                let booked = match booked_memo.get(&(room_type.clone(), night)) {
                    Some(count) => *count,
                    None => {
                        let count = self
                            .booked(&room_type, night, Some(reservation.id()))
                            .await?;
                        booked_memo.insert((room_type.clone(), night), count);
                        count
                    }
                };
                let capacity = self.capacity(&room_type, cache).await?;

                if booked + requested_now > capacity {
                    return Err(DomainError::RoomsUnavailable {
                        room_type,
                        date: night,
                        requested: requested_now,
                        available: capacity.saturating_sub(booked),
                    });
                }
            }
        }
        Ok(())
    }

    /// 客室アサインの重複を確認する
    ///
    /// 予約内のアクティブなアサイン同士の総当たり走査と、他予約の
    /// アクティブなアサインとの重複確認を行う。件数は予約あたり
    /// 高々数件なのでO(n²)で十分
    pub async fn check_allotment_conflicts(
        &self,
        reservation: &Reservation,
    ) -> Result<(), DomainError> {
        let active: Vec<_> = reservation
            .room_allotments()
            .iter()
            .filter(|a| a.is_active())
            .collect();

        for i in 0..active.len() {
            for j in (i + 1)..active.len() {
                if active[i].room() == active[j].room()
                    && active[i].period().overlaps(active[j].period())
                {
                    return Err(DomainError::DuplicateAllotment {
                        room: active[i].room().clone(),
                        first: *active[i].period(),
                        second: *active[j].period(),
                    });
                }
            }
        }

        for allotment in &active {
            let conflicts = self
                .reservation_repository
                .find_active_allotments(
                    allotment.room(),
                    allotment.period(),
                    Some(reservation.id()),
                )
                .await
                .map_err(|e| {
                    DomainError::RepositoryError(format!("客室アサインの取得に失敗: {}", e))
                })?;
            if let Some((_, other)) = conflicts.first() {
                return Err(DomainError::DuplicateAllotment {
                    room: allotment.room().clone(),
                    first: *other.period(),
                    second: *allotment.period(),
                });
            }
        }
        Ok(())
    }

    /// アイテムを客室タイプへ解決する（呼び出し内でメモ化）
    async fn resolve_room_type(
        &self,
        item: &ItemCode,
        memo: &mut HashMap<ItemCode, Option<RoomTypeId>>,
    ) -> Result<Option<RoomTypeId>, DomainError> {
        if let Some(room_type) = memo.get(item) {
            return Ok(room_type.clone());
        }
        let room_type = self
            .inventory_repository
            .room_type_of(item)
            .await
            .map_err(|e| DomainError::RepositoryError(format!("パッケージの解決に失敗: {}", e)))?;
        memo.insert(item.clone(), room_type.clone());
        Ok(room_type)
    }
}
