// ドメインサービス
// 複数の集約にまたがるビジネスロジックを実装

mod allotment;
mod availability;
mod rates;

pub use allotment::reconcile_allotments;
pub use availability::{AvailabilityCalculator, RoomCountCache};
pub use rates::RateTable;

use crate::domain::error::DomainError;
use crate::domain::model::Reservation;
use std::sync::Arc;

/// 予約検証サービス
///
/// 保存前フックとして毎回フルに再実行する複合検証。客室アサインや
/// 料金期間は編集の合間に変化しうるため、前回の検証結果を信用せず
/// 料金再計算と空室確認を常にやり直す（意図的な冪等再検証）
pub struct ReservationValidator {
    rate_table: Arc<RateTable>,
    availability: Arc<AvailabilityCalculator>,
}

impl ReservationValidator {
    /// 新しい予約検証サービスを作成
    ///
    /// # Arguments
    /// * `rate_table` - 料金表サービス
    /// * `availability` - 空室計算サービス
    pub fn new(rate_table: Arc<RateTable>, availability: Arc<AvailabilityCalculator>) -> Self {
        Self {
            rate_table,
            availability,
        }
    }

    /// 予約を検証する
    ///
    /// 手順: アサインと明細の突き合わせ → 料金再計算 → 空室確認 →
    /// 客室アサインの重複確認。いずれかが失敗すると保存全体が中断され、
    /// 部分的な明細やアサインは永続化されない。
    /// 成功時は検証中に読み込んだ客室数メモを返し、コミット時の
    /// 再検証に引き渡せる
    pub async fn validate(
        &self,
        reservation: &mut Reservation,
    ) -> Result<RoomCountCache, DomainError> {
        reconcile_allotments(reservation)?;

        let rates = self.rate_table.compute_stay_rates(reservation).await?;
        reservation.apply_stay_rates(&rates)?;

        let mut cache = RoomCountCache::new();
        self.availability
            .check_availability(reservation, &mut cache)
            .await?;
        self.availability
            .check_allotment_conflicts(reservation)
            .await?;

        Ok(cache)
    }
}
