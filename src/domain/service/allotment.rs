use crate::domain::error::DomainError;
use crate::domain::model::{ItemCode, Reservation, StayRange};
use std::collections::HashMap;

/// 客室アサインと明細行を突き合わせる
///
/// アクティブなアサインを (アイテム, 期間) ごとに集計し、対応する
/// 滞在行の客室数と照合する。不一致は `AllotmentCountMismatch` になる。
/// 対応する滞在行が無い場合は明細行を自動生成するので、スタッフは
/// 客室を先にアサインするだけで請求行が揃う
pub fn reconcile_allotments(reservation: &mut Reservation) -> Result<(), DomainError> {
    let mut groups: HashMap<(ItemCode, StayRange), u32> = HashMap::new();
    for allotment in reservation.room_allotments() {
        if !allotment.is_active() {
            continue;
        }
        *groups
            .entry((allotment.item().clone(), *allotment.period()))
            .or_insert(0) += 1;
    }

    // 走査順を安定させる（エラー報告の決定性のため）
    let mut groups: Vec<_> = groups.into_iter().collect();
    groups.sort_by(|((item_a, range_a), _), ((item_b, range_b), _)| {
        item_a
            .as_str()
            .cmp(item_b.as_str())
            .then(range_a.from_date().cmp(&range_b.from_date()))
    });

    for ((item, period), allotted) in groups {
        let declared = reservation
            .items()
            .iter()
            .find(|line| line.item() == &item && line.stay_period() == Some(&period))
            .and_then(|line| line.room_count());

        match declared {
            Some(room_count) if room_count == allotted => {}
            Some(room_count) => {
                return Err(DomainError::AllotmentCountMismatch {
                    item,
                    expected: room_count,
                    actual: allotted,
                });
            }
            None => {
                // 明細行が無ければアサインから自動生成する
                reservation.add_stay_line(item, period, allotted)?;
            }
        }
    }
    Ok(())
}
