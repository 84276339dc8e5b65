use crate::domain::error::DomainError;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use std::fmt;

/// 宿泊期間を表す値オブジェクト
///
/// 境界日の扱いはエンジン全体で半開区間 `[from_date, to_date)` に統一する。
/// to_date はチェックアウト日であり、宿泊日としても課金日としても数えない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayRange {
    from_date: NaiveDate,
    to_date: NaiveDate,
}

impl StayRange {
    /// 新しい宿泊期間を作成
    /// to_date が from_date より前の場合はエラー
    pub fn new(from_date: NaiveDate, to_date: NaiveDate) -> Result<Self, DomainError> {
        if to_date < from_date {
            return Err(DomainError::InvalidDateRange(format!(
                "to date {} is before from date {}",
                to_date, from_date
            )));
        }
        Ok(Self { from_date, to_date })
    }

    /// 開始日を取得
    pub fn from_date(&self) -> NaiveDate {
        self.from_date
    }

    /// 終了日（チェックアウト日）を取得
    pub fn to_date(&self) -> NaiveDate {
        self.to_date
    }

    /// 期間内のカレンダー日付を両端を含めて昇順で返す
    /// from_date == to_date の場合は1日だけを返す
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.from_date;
        while day <= self.to_date {
            days.push(day);
            day += Duration::days(1);
        }
        days
    }

    /// 宿泊日（半開区間 `[from_date, to_date)`）を昇順で返す
    /// from_date == to_date の場合は空になる
    pub fn nights(&self) -> Vec<NaiveDate> {
        let mut nights = Vec::new();
        let mut day = self.from_date;
        while day < self.to_date {
            nights.push(day);
            day += Duration::days(1);
        }
        nights
    }

    /// 宿泊数を取得
    pub fn night_count(&self) -> u32 {
        (self.to_date - self.from_date).num_days() as u32
    }

    /// 指定した日が宿泊日に含まれるか（from_date <= day < to_date）
    pub fn contains_night(&self, day: NaiveDate) -> bool {
        self.from_date <= day && day < self.to_date
    }

    /// 2つの期間の宿泊日が重なるか（半開区間の交差判定）
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.from_date < other.to_date && other.from_date < self.to_date
    }
}

impl fmt::Display for StayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from_date, self.to_date)
    }
}
