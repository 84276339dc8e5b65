use crate::application::ApplicationError;
use crate::domain::model::{
    GroupId, LineItem, Money, Reservation, ReservationId, ReservationStatus,
};
use crate::domain::port::ReservationRepository;
use std::sync::Arc;

/// グループの一括請求ビュー
/// 同じグループIDを共有する予約の明細行と総額をまとめたもの
#[derive(Debug, Clone)]
pub struct GroupBill {
    pub group_id: GroupId,
    pub reservation_ids: Vec<ReservationId>,
    pub lines: Vec<LineItem>,
    pub grand_total: Money,
}

/// 予約クエリサービス
/// 読み取り専用の予約操作を提供する
pub struct ReservationQueryService {
    reservation_repository: Arc<dyn ReservationRepository>,
}

impl ReservationQueryService {
    /// 新しい予約クエリサービスを作成
    ///
    /// # Arguments
    /// * `reservation_repository` - 予約リポジトリ
    pub fn new(reservation_repository: Arc<dyn ReservationRepository>) -> Self {
        Self {
            reservation_repository,
        }
    }

    /// 予約IDで予約を取得
    pub async fn get_reservation_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<Reservation>, ApplicationError> {
        self.reservation_repository
            .find_by_id(id)
            .await
            .map_err(ApplicationError::from)
    }

    /// 指定されたステータスの予約を取得
    pub async fn get_reservations_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, ApplicationError> {
        self.reservation_repository
            .find_by_status(status)
            .await
            .map_err(ApplicationError::from)
    }

    /// 指定されたステータス文字列の予約を取得
    pub async fn get_reservations_by_status_string(
        &self,
        status_str: String,
    ) -> Result<Vec<Reservation>, ApplicationError> {
        let status = ReservationStatus::from_string(&status_str).map_err(|_| {
            ApplicationError::NotFound(format!("無効なステータス値: {}", status_str))
        })?;
        self.get_reservations_by_status(status).await
    }

    /// グループの一括請求ビューを組み立てる
    ///
    /// グループ内の全予約の明細行を連結し、総額を合算して返す
    pub async fn get_group_bill(&self, group_id: GroupId) -> Result<GroupBill, ApplicationError> {
        let members = self.reservation_repository.find_by_group(group_id).await?;
        if members.is_empty() {
            return Err(ApplicationError::NotFound(format!(
                "グループが見つかりません: {}",
                group_id
            )));
        }

        let reservation_ids = members.iter().map(|r| r.id()).collect();
        let lines: Vec<LineItem> = members
            .iter()
            .flat_map(|r| r.items().iter().cloned())
            .collect();
        let grand_total = members
            .iter()
            .map(|r| r.net_total())
            .fold(Money::zero(), |acc, total| acc.add(&total).unwrap_or(acc));

        Ok(GroupBill {
            group_id,
            reservation_ids,
            lines,
            grand_total,
        })
    }
}
