use crate::domain::error::DomainError;
use crate::domain::model::{
    find_overlapping_periods, ItemCode, Money, PricingPeriod, Reservation, StayRange,
};
use crate::domain::port::PricingRepository;
use chrono::NaiveDate;
use std::sync::Arc;

/// 料金表サービス
/// 料金期間レコードから (アイテム, 日付) の料金を解決し、滞在料金を合成する
pub struct RateTable {
    pricing_repository: Arc<dyn PricingRepository>,
}

impl RateTable {
    /// 新しい料金表サービスを作成
    ///
    /// # Arguments
    /// * `pricing_repository` - 料金リポジトリ
    pub fn new(pricing_repository: Arc<dyn PricingRepository>) -> Self {
        Self { pricing_repository }
    }

    /// 指定した日のアイテム料金を取得する
    ///
    /// 日付を含む最初の料金期間の料金を返す（期間はデータ入力規律により
    /// 重複しない前提）。どの期間にも含まれない場合は
    /// `DomainError::RateNotSet` になる
    pub async fn lookup(&self, item: &ItemCode, date: NaiveDate) -> Result<Money, DomainError> {
        let periods = self
            .pricing_repository
            .periods_for(item)
            .await
            .map_err(|e| DomainError::RepositoryError(format!("料金期間の取得に失敗: {}", e)))?;

        periods
            .iter()
            .find(|period| period.covers(date))
            .map(|period| period.rate())
            .ok_or_else(|| DomainError::RateNotSet {
                item: item.clone(),
                date,
            })
    }

    /// 滞在期間全体の1室あたり料金を計算する
    ///
    /// 宿泊日（半開区間）ごとに lookup を合算する。1泊でも料金が
    /// 引けない場合は最初の `RateNotSet` をそのまま伝播し、
    /// 部分的に価格付けされた滞在を作らない
    pub async fn price_stay(
        &self,
        item: &ItemCode,
        range: &StayRange,
    ) -> Result<Money, DomainError> {
        let mut total = Money::zero();
        for night in range.nights() {
            let rate = self.lookup(item, night).await?;
            total = total.add(&rate)?;
        }
        Ok(total)
    }

    /// 予約の全滞在行の料金を計算する
    ///
    /// 戻り値は items() と同じ順序で、滞在行には計算した1室あたり
    /// 滞在料金、転記済みの日次行には None が並ぶ
    pub async fn compute_stay_rates(
        &self,
        reservation: &Reservation,
    ) -> Result<Vec<Option<Money>>, DomainError> {
        let mut rates = Vec::with_capacity(reservation.items().len());
        for line in reservation.items() {
            match line.stay_period() {
                Some(period) => {
                    let rate = self.price_stay(line.item(), period).await?;
                    rates.push(Some(rate));
                }
                None => rates.push(None),
            }
        }
        Ok(rates)
    }

    /// アイテムの料金期間の重複を検出する
    ///
    /// 重複はデータ品質上の欠陥であり、保存時に警告として報告する
    pub async fn data_quality_conflicts(
        &self,
        item: &ItemCode,
    ) -> Result<Vec<(PricingPeriod, PricingPeriod)>, DomainError> {
        let periods = self
            .pricing_repository
            .periods_for(item)
            .await
            .map_err(|e| DomainError::RepositoryError(format!("料金期間の取得に失敗: {}", e)))?;

        let conflicts = find_overlapping_periods(&periods)
            .into_iter()
            .map(|(i, j)| (periods[i].clone(), periods[j].clone()))
            .collect();
        Ok(conflicts)
    }
}
