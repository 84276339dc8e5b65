use crate::domain::model::{ItemCode, Money};
use chrono::NaiveDate;

/// 料金期間
/// (販売アイテム, 日付) に対する1泊あたりの料金を定義する
/// 日付境界は両端を含む（from_date <= 日 <= to_date）
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPeriod {
    item: ItemCode,
    from_date: NaiveDate,
    to_date: NaiveDate,
    rate: Money,
}

impl PricingPeriod {
    /// 新しい料金期間を作成
    pub fn new(item: ItemCode, from_date: NaiveDate, to_date: NaiveDate, rate: Money) -> Self {
        Self {
            item,
            from_date,
            to_date,
            rate,
        }
    }

    /// 販売アイテムコードを取得
    pub fn item(&self) -> &ItemCode {
        &self.item
    }

    /// 適用開始日を取得
    pub fn from_date(&self) -> NaiveDate {
        self.from_date
    }

    /// 適用終了日を取得
    pub fn to_date(&self) -> NaiveDate {
        self.to_date
    }

    /// 1泊あたりの料金を取得
    pub fn rate(&self) -> Money {
        self.rate
    }

    /// 指定した日がこの料金期間に含まれるか
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.from_date <= day && day <= self.to_date
    }
}

/// 同一アイテムの料金期間の重複を検出する
///
/// 重複期間はデータ品質上の欠陥であり、エンジンは先頭一致で決定的に
/// 解決するが、黙って解決せず検出結果を報告できるようにする。
/// 戻り値は重複しているペアのインデックス
pub fn find_overlapping_periods(periods: &[PricingPeriod]) -> Vec<(usize, usize)> {
    let mut conflicts = Vec::new();
    for i in 0..periods.len() {
        for j in (i + 1)..periods.len() {
            let a = &periods[i];
            let b = &periods[j];
            if a.item() != b.item() {
                continue;
            }
            // 両端を含む区間同士の交差判定
            if a.from_date <= b.to_date && b.from_date <= a.to_date {
                conflicts.push((i, j));
            }
        }
    }
    conflicts
}
