use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    AuditLine, CompanyCode, GuestId, ItemCode, NightAuditRun, ReservationId, RoomId,
};
use crate::domain::port::{NightAuditRepository, RepositoryError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySql, Pool, Row};

/// MySQLナイトオーディットリポジトリ
/// (会社, 日付) の一意キーを持つ実行と監査行スナップショットを永続化する
pub struct MySqlNightAuditRepository {
    pool: Pool<MySql>,
}

impl MySqlNightAuditRepository {
    /// 新しいMySQLナイトオーディットリポジトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    async fn load_lines(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<Vec<AuditLine>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT room, reservation_id, guest, guest_name, mobile_no, item, quantity
            FROM night_audit_lines
            WHERE company = ? AND audit_date = ?
            ORDER BY id
            "#,
        )
        .bind(company.as_str())
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("監査行の取得に失敗: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            let room = match row.get::<Option<String>, _>("room") {
                Some(room) => Some(RoomId::new(&room).map_err(|e| {
                    RepositoryError::FetchFailed(format!("客室コードの解析に失敗: {}", e))
                })?),
                None => None,
            };
            let reservation =
                ReservationId::from_string(row.get::<String, _>("reservation_id").as_str())
                    .map_err(|e| {
                        RepositoryError::FetchFailed(format!("予約IDの解析に失敗しました: {}", e))
                    })?;
            let guest = GuestId::from_string(row.get::<String, _>("guest").as_str()).map_err(
                |e| RepositoryError::FetchFailed(format!("宿泊客IDの解析に失敗しました: {}", e)),
            )?;
            let item = ItemCode::new(row.get::<String, _>("item").as_str()).map_err(|e| {
                RepositoryError::FetchFailed(format!("アイテムの解析に失敗: {}", e))
            })?;
            let line = AuditLine::new(
                room,
                reservation,
                guest,
                row.get("guest_name"),
                row.get("mobile_no"),
                item,
                row.get("quantity"),
            )
            .map_err(|e| RepositoryError::FetchFailed(format!("監査行の構築に失敗: {}", e)))?;
            lines.push(line);
        }
        Ok(lines)
    }
}

#[async_trait]
impl NightAuditRepository for MySqlNightAuditRepository {
    async fn get_or_create(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<NightAuditRun, RepositoryError> {
        // 重複キーを例外にせず、upsertで既存実行に合流する
        sqlx::query(
            r#"
            INSERT INTO night_audits (company, audit_date, submitted)
            VALUES (?, ?, FALSE)
            ON DUPLICATE KEY UPDATE company = VALUES(company)
            "#,
        )
        .bind(company.as_str())
        .bind(date)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("実行の作成に失敗: {}", e)))
        .map_err(RepositoryError::from)?;

        self.find(company, date).await?.ok_or_else(|| {
            RepositoryError::FetchFailed(format!(
                "作成したはずの実行が見つかりません: {} {}",
                company, date
            ))
        })
    }

    async fn save(&self, run: &NightAuditRun) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        sqlx::query(
            r#"
            INSERT INTO night_audits (company, audit_date, submitted)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE submitted = VALUES(submitted)
            "#,
        )
        .bind(run.company().as_str())
        .bind(run.date())
        .bind(run.is_submitted())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("実行の保存に失敗: {}", e)))
        .map_err(RepositoryError::from)?;

        sqlx::query("DELETE FROM night_audit_lines WHERE company = ? AND audit_date = ?")
            .bind(run.company().as_str())
            .bind(run.date())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("監査行の削除に失敗: {}", e)))
            .map_err(RepositoryError::from)?;

        for line in run.lines() {
            sqlx::query(
                r#"
                INSERT INTO night_audit_lines
                    (company, audit_date, room, reservation_id, guest, guest_name,
                     mobile_no, item, quantity)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(run.company().as_str())
            .bind(run.date())
            .bind(line.room().map(|r| r.as_str().to_string()))
            .bind(line.reservation().to_string())
            .bind(line.guest().to_string())
            .bind(line.guest_name())
            .bind(line.mobile_no())
            .bind(line.item().as_str())
            .bind(line.quantity())
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("監査行の保存に失敗: {}", e)))
            .map_err(RepositoryError::from)?;
        }

        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("トランザクションのコミットに失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn find(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<Option<NightAuditRun>, RepositoryError> {
        let row = sqlx::query(
            "SELECT submitted FROM night_audits WHERE company = ? AND audit_date = ?",
        )
        .bind(company.as_str())
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("実行の取得に失敗: {}", e)))
        .map_err(RepositoryError::from)?;

        match row {
            Some(row) => {
                let submitted: bool = row.get("submitted");
                let lines = self.load_lines(company, date).await?;
                Ok(Some(NightAuditRun::reconstruct(
                    company.clone(),
                    date,
                    lines,
                    submitted,
                )))
            }
            None => Ok(None),
        }
    }
}
