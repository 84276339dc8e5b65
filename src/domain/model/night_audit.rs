use crate::domain::error::DomainError;
use crate::domain::model::{CompanyCode, GuestId, ItemCode, ReservationId, RoomId};
use chrono::NaiveDate;

/// ナイトオーディットの監査行
/// 作成時点のスナップショットとして (客室, 予約, アイテム, 数量) を保持し、
/// 宿泊客の表示情報で補強される
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLine {
    room: Option<RoomId>,
    reservation: ReservationId,
    guest: GuestId,
    guest_name: String,
    mobile_no: Option<String>,
    item: ItemCode,
    quantity: u32,
}

impl AuditLine {
    /// 新しい監査行を作成
    pub fn new(
        room: Option<RoomId>,
        reservation: ReservationId,
        guest: GuestId,
        guest_name: String,
        mobile_no: Option<String>,
        item: ItemCode,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            room,
            reservation,
            guest,
            guest_name,
            mobile_no,
            item,
            quantity,
        })
    }

    /// 対象客室を取得（未アサインの場合はNone）
    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// 対象予約IDを取得
    pub fn reservation(&self) -> ReservationId {
        self.reservation
    }

    /// 宿泊客IDを取得
    pub fn guest(&self) -> GuestId {
        self.guest
    }

    /// 宿泊客の表示名を取得
    pub fn guest_name(&self) -> &str {
        &self.guest_name
    }

    /// 宿泊客の連絡先を取得
    pub fn mobile_no(&self) -> Option<&str> {
        self.mobile_no.as_deref()
    }

    /// 転記対象のアイテムコードを取得
    pub fn item(&self) -> &ItemCode {
        &self.item
    }

    /// 転記数量を取得
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// ナイトオーディット実行
/// (会社, 日付) ごとに高々1件というキー一意性を持つ
#[derive(Debug, Clone, PartialEq)]
pub struct NightAuditRun {
    company: CompanyCode,
    date: NaiveDate,
    lines: Vec<AuditLine>,
    submitted: bool,
}

impl NightAuditRun {
    /// 新しいナイトオーディット実行を作成
    pub fn new(company: CompanyCode, date: NaiveDate) -> Self {
        Self {
            company,
            date,
            lines: Vec::new(),
            submitted: false,
        }
    }

    /// データベースから取得したデータで実行を再構築
    pub fn reconstruct(
        company: CompanyCode,
        date: NaiveDate,
        lines: Vec<AuditLine>,
        submitted: bool,
    ) -> Self {
        Self {
            company,
            date,
            lines,
            submitted,
        }
    }

    /// 会社コードを取得
    pub fn company(&self) -> &CompanyCode {
        &self.company
    }

    /// 対象日を取得
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// 監査行のリストを取得
    pub fn lines(&self) -> &[AuditLine] {
        &self.lines
    }

    /// 提出済みかどうか
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// 監査行のスナップショットを差し替える
    /// 提出済みの実行は変更できない
    pub fn replace_lines(&mut self, lines: Vec<AuditLine>) -> Result<(), DomainError> {
        if self.submitted {
            return Err(DomainError::InvalidReservationState(
                "提出済みのナイトオーディットは変更できません".to_string(),
            ));
        }
        self.lines = lines;
        Ok(())
    }

    /// 実行を提出済みにする
    pub fn mark_submitted(&mut self) -> Result<(), DomainError> {
        if self.submitted {
            return Err(DomainError::InvalidReservationState(
                "ナイトオーディットは既に提出済みです".to_string(),
            ));
        }
        self.submitted = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(quantity: u32) -> AuditLine {
        AuditLine::new(
            Some(RoomId::new("101").unwrap()),
            ReservationId::new(),
            GuestId::new(),
            "山田 太郎".to_string(),
            Some("090-0000-0000".to_string()),
            ItemCode::new("DLX-NIGHT").unwrap(),
            quantity,
        )
        .unwrap()
    }

    #[test]
    fn test_audit_line_rejects_zero_quantity() {
        let result = AuditLine::new(
            None,
            ReservationId::new(),
            GuestId::new(),
            "山田 太郎".to_string(),
            None,
            ItemCode::new("DLX-NIGHT").unwrap(),
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_replace_lines_before_submit() {
        let mut run = NightAuditRun::new(
            CompanyCode::new("GRAND-HOTEL").unwrap(),
            date(2024, 1, 10),
        );
        run.replace_lines(vec![line(1), line(2)]).unwrap();
        assert_eq!(run.lines().len(), 2);
    }

    #[test]
    fn test_submit_freezes_run() {
        let mut run = NightAuditRun::new(
            CompanyCode::new("GRAND-HOTEL").unwrap(),
            date(2024, 1, 10),
        );
        run.replace_lines(vec![line(1)]).unwrap();
        run.mark_submitted().unwrap();
        assert!(run.is_submitted());
        assert!(run.replace_lines(vec![line(1)]).is_err());
        assert!(run.mark_submitted().is_err());
    }
}
