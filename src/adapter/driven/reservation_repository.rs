use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    AllotmentStatus, ChargeKind, CompanyCode, CustomerId, GroupId, GuestId, ItemCode, LineItem,
    Money, Reservation, ReservationId, ReservationStatus, RoomAllotment, RoomId, RoomTypeId,
    StayRange,
};
use crate::domain::port::{RepositoryError, ReservationRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySql, Pool, Row, Transaction};
use std::collections::HashMap;

/// MySQL予約リポジトリ
/// MySQLデータベースを使用して予約集約を永続化する
pub struct MySqlReservationRepository {
    pool: Pool<MySql>,
}

impl MySqlReservationRepository {
    /// 新しいMySQL予約リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// ヘッダー行から予約集約を再構築する（明細とアサインは別クエリ）
    async fn build_reservation(
        &self,
        row: &sqlx::mysql::MySqlRow,
    ) -> Result<Reservation, RepositoryError> {
        let id_str: String = row.get("id");
        let reservation_id = ReservationId::from_string(&id_str).map_err(|e| {
            RepositoryError::FetchFailed(format!("予約IDの解析に失敗しました: {}", e))
        })?;

        let company = CompanyCode::new(row.get::<String, _>("company").as_str())
            .map_err(|e| RepositoryError::FetchFailed(format!("会社コードの解析に失敗: {}", e)))?;

        let stay = StayRange::new(row.get("from_date"), row.get("to_date"))
            .map_err(|e| RepositoryError::FetchFailed(format!("宿泊期間の構築に失敗: {}", e)))?;

        let guest = GuestId::from_string(row.get::<String, _>("guest").as_str()).map_err(|e| {
            RepositoryError::FetchFailed(format!("宿泊客IDの解析に失敗しました: {}", e))
        })?;

        let customer = match row.get::<Option<String>, _>("customer") {
            Some(customer) => Some(CustomerId::from_string(&customer).map_err(|e| {
                RepositoryError::FetchFailed(format!("顧客IDの解析に失敗しました: {}", e))
            })?),
            None => None,
        };

        let group_id = match row.get::<Option<String>, _>("group_id") {
            Some(group) => Some(GroupId::from_string(&group).map_err(|e| {
                RepositoryError::FetchFailed(format!("グループIDの解析に失敗しました: {}", e))
            })?),
            None => None,
        };

        let item = ItemCode::new(row.get::<String, _>("item").as_str())
            .map_err(|e| RepositoryError::FetchFailed(format!("アイテムの解析に失敗: {}", e)))?;

        let status = ReservationStatus::from_string(row.get::<String, _>("status").as_str())
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("予約ステータスの解析に失敗しました: {}", e))
            })?;

        let extra_beds: u32 = row.get("extra_beds");

        let items = self.load_lines(&id_str).await?;
        let allotments = self.load_allotments(&id_str).await?;

        Ok(Reservation::reconstruct(
            reservation_id,
            company,
            stay,
            guest,
            customer,
            group_id,
            item,
            extra_beds,
            status,
            items,
            allotments,
        ))
    }

    /// 明細行を読み込む
    async fn load_lines(&self, reservation_id: &str) -> Result<Vec<LineItem>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT item, charge_kind, from_date, to_date, charge_date, room_count,
                   quantity, rate_amount, rate_currency
            FROM reservation_lines
            WHERE reservation_id = ?
            ORDER BY id
            "#,
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("明細行の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            lines.push(Self::line_from_row(row)?);
        }
        Ok(lines)
    }

    fn line_from_row(row: &sqlx::mysql::MySqlRow) -> Result<LineItem, RepositoryError> {
        let item = ItemCode::new(row.get::<String, _>("item").as_str())
            .map_err(|e| RepositoryError::FetchFailed(format!("アイテムの解析に失敗: {}", e)))?;
        let rate = Money::new(row.get("rate_amount"), row.get("rate_currency"))
            .map_err(|e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)))?;
        let quantity: u32 = row.get("quantity");

        let kind: String = row.get("charge_kind");
        let charge = match kind.as_str() {
            "Stay" => {
                let from_date: Option<NaiveDate> = row.get("from_date");
                let to_date: Option<NaiveDate> = row.get("to_date");
                let room_count: Option<u32> = row.get("room_count");
                let (Some(from_date), Some(to_date), Some(room_count)) =
                    (from_date, to_date, room_count)
                else {
                    return Err(RepositoryError::FetchFailed(
                        "滞在行に期間または客室数がありません".to_string(),
                    ));
                };
                let period = StayRange::new(from_date, to_date).map_err(|e| {
                    RepositoryError::FetchFailed(format!("滞在期間の構築に失敗: {}", e))
                })?;
                ChargeKind::Stay { period, room_count }
            }
            "Incidental" => {
                let date: Option<NaiveDate> = row.get("charge_date");
                let Some(date) = date else {
                    return Err(RepositoryError::FetchFailed(
                        "転記行に日付がありません".to_string(),
                    ));
                };
                ChargeKind::Incidental { date }
            }
            "ExtraBed" => {
                let date: Option<NaiveDate> = row.get("charge_date");
                let Some(date) = date else {
                    return Err(RepositoryError::FetchFailed(
                        "転記行に日付がありません".to_string(),
                    ));
                };
                ChargeKind::ExtraBed { date }
            }
            other => {
                return Err(RepositoryError::FetchFailed(format!(
                    "未知の課金種別です: {}",
                    other
                )))
            }
        };

        LineItem::new(item, charge, quantity, rate)
            .map_err(|e| RepositoryError::FetchFailed(format!("明細行の構築に失敗しました: {}", e)))
    }

    /// 客室アサインを読み込む
    async fn load_allotments(
        &self,
        reservation_id: &str,
    ) -> Result<Vec<RoomAllotment>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT room, item, from_date, to_date, status
            FROM room_allotments
            WHERE reservation_id = ?
            ORDER BY id
            "#,
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("アサインの取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut allotments = Vec::with_capacity(rows.len());
        for row in &rows {
            allotments.push(Self::allotment_from_row(row)?);
        }
        Ok(allotments)
    }

    fn allotment_from_row(row: &sqlx::mysql::MySqlRow) -> Result<RoomAllotment, RepositoryError> {
        let room = RoomId::new(row.get::<String, _>("room").as_str())
            .map_err(|e| RepositoryError::FetchFailed(format!("客室コードの解析に失敗: {}", e)))?;
        let item = ItemCode::new(row.get::<String, _>("item").as_str())
            .map_err(|e| RepositoryError::FetchFailed(format!("アイテムの解析に失敗: {}", e)))?;
        let period = StayRange::new(row.get("from_date"), row.get("to_date"))
            .map_err(|e| RepositoryError::FetchFailed(format!("アサイン期間の構築に失敗: {}", e)))?;
        let status = AllotmentStatus::from_string(row.get::<String, _>("status").as_str())
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("アサイン状態の解析に失敗しました: {}", e))
            })?;
        Ok(RoomAllotment::reconstruct(room, item, period, status))
    }

    /// トランザクション内で予約集約を書き込む（ヘッダーUPSERT + 子テーブル入れ替え）
    async fn persist_in_tx(
        tx: &mut Transaction<'_, MySql>,
        reservation: &Reservation,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO reservations
                (id, company, from_date, to_date, guest, customer, group_id, item, extra_beds, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                company = VALUES(company),
                from_date = VALUES(from_date),
                to_date = VALUES(to_date),
                guest = VALUES(guest),
                customer = VALUES(customer),
                group_id = VALUES(group_id),
                item = VALUES(item),
                extra_beds = VALUES(extra_beds),
                status = VALUES(status)
            "#,
        )
        .bind(reservation.id().to_string())
        .bind(reservation.company().as_str())
        .bind(reservation.stay().from_date())
        .bind(reservation.stay().to_date())
        .bind(reservation.guest().to_string())
        .bind(reservation.customer().map(|c| c.to_string()))
        .bind(reservation.group_id().map(|g| g.to_string()))
        .bind(reservation.item().as_str())
        .bind(reservation.extra_beds())
        .bind(reservation.status().to_string())
        .execute(&mut **tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("予約の保存に失敗しました: {}", e)))?;

        // 既存の明細行を削除して入れ替える
        sqlx::query("DELETE FROM reservation_lines WHERE reservation_id = ?")
            .bind(reservation.id().to_string())
            .execute(&mut **tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("明細行の削除に失敗しました: {}", e)))?;

        for line in reservation.items() {
            let (kind, from_date, to_date, charge_date, room_count) = match line.charge() {
                ChargeKind::Stay { period, room_count } => (
                    "Stay",
                    Some(period.from_date()),
                    Some(period.to_date()),
                    None,
                    Some(*room_count),
                ),
                ChargeKind::Incidental { date } => ("Incidental", None, None, Some(*date), None),
                ChargeKind::ExtraBed { date } => ("ExtraBed", None, None, Some(*date), None),
            };
            sqlx::query(
                r#"
                INSERT INTO reservation_lines
                    (reservation_id, item, charge_kind, from_date, to_date, charge_date,
                     room_count, quantity, rate_amount, rate_currency)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(reservation.id().to_string())
            .bind(line.item().as_str())
            .bind(kind)
            .bind(from_date)
            .bind(to_date)
            .bind(charge_date)
            .bind(room_count)
            .bind(line.quantity())
            .bind(line.rate().amount())
            .bind(line.rate().currency())
            .execute(&mut **tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("明細行の保存に失敗しました: {}", e)))?;
        }

        // 既存のアサインを削除して入れ替える
        sqlx::query("DELETE FROM room_allotments WHERE reservation_id = ?")
            .bind(reservation.id().to_string())
            .execute(&mut **tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("アサインの削除に失敗しました: {}", e)))?;

        for allotment in reservation.room_allotments() {
            sqlx::query(
                r#"
                INSERT INTO room_allotments
                    (reservation_id, room, item, from_date, to_date, status)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(reservation.id().to_string())
            .bind(allotment.room().as_str())
            .bind(allotment.item().as_str())
            .bind(allotment.period().from_date())
            .bind(allotment.period().to_date())
            .bind(allotment.status().to_string())
            .execute(&mut **tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("アサインの保存に失敗しました: {}", e)))?;
        }

        Ok(())
    }

    /// トランザクション内で宿泊日ごとの予約数量を行ロック付きで数える
    ///
    /// 他予約の滞在行をロックして読むことで、同時予約はこの再検証で
    /// 直列化される。アプリケーション層の空室確認は速い事前チェックで、
    /// こちらが権威的なガードになる
    async fn locked_booked_count(
        tx: &mut Transaction<'_, MySql>,
        room_type: &RoomTypeId,
        night: NaiveDate,
        exclude: ReservationId,
    ) -> Result<u32, DatabaseError> {
        let row = sqlx::query(
            r#"
            SELECT CAST(COALESCE(SUM(l.room_count), 0) AS SIGNED) AS booked
            FROM reservation_lines l
            INNER JOIN reservations r ON r.id = l.reservation_id
            INNER JOIN room_packages p ON p.item = l.item
            WHERE p.room_type = ?
              AND r.status <> 'Draft'
              AND r.id <> ?
              AND l.charge_kind = 'Stay'
              AND l.from_date <= ?
              AND l.to_date > ?
            FOR UPDATE
            "#,
        )
        .bind(room_type.as_str())
        .bind(exclude.to_string())
        .bind(night)
        .bind(night)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("予約数量の集計に失敗しました: {}", e)))?;

        let booked: i64 = row.get("booked");
        Ok(booked.max(0) as u32)
    }

    /// トランザクション内で客室アサインの重複を行ロック付きで数える
    async fn locked_allotment_conflicts(
        tx: &mut Transaction<'_, MySql>,
        allotment: &RoomAllotment,
        exclude: ReservationId,
    ) -> Result<u32, DatabaseError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS conflicts
            FROM room_allotments a
            INNER JOIN reservations r ON r.id = a.reservation_id
            WHERE a.room = ?
              AND a.status IN ('Booked', 'Checked In')
              AND r.status <> 'Draft'
              AND r.id <> ?
              AND a.from_date < ?
              AND a.to_date > ?
            FOR UPDATE
            "#,
        )
        .bind(allotment.room().as_str())
        .bind(exclude.to_string())
        .bind(allotment.period().to_date())
        .bind(allotment.period().from_date())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("アサイン重複の集計に失敗しました: {}", e)))?;

        let conflicts: i64 = row.get("conflicts");
        Ok(conflicts.max(0) as u32)
    }
}

#[async_trait]
impl ReservationRepository for MySqlReservationRepository {
    async fn save(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        Self::persist_in_tx(&mut tx, reservation)
            .await
            .map_err(RepositoryError::from)?;

        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("トランザクションのコミットに失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn save_booked(
        &self,
        reservation: &Reservation,
        capacities: &HashMap<RoomTypeId, u32>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        // 宿泊日ごとの要求数量を客室タイプ単位で組み立てる
        let mut requested: HashMap<(RoomTypeId, NaiveDate), u32> = HashMap::new();
        for line in reservation.items() {
            let Some(period) = line.stay_period() else {
                continue;
            };
            let room_count = line.room_count().unwrap_or(0);
            let row = sqlx::query("SELECT room_type FROM room_packages WHERE item = ?")
                .bind(line.item().as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    DatabaseError::QueryError(format!("パッケージの解決に失敗しました: {}", e))
                })
                .map_err(RepositoryError::from)?;
            let Some(row) = row else {
                continue;
            };
            let line_type = RoomTypeId::new(row.get::<String, _>("room_type").as_str())
                .map_err(|e| {
                    RepositoryError::FetchFailed(format!("客室タイプの解析に失敗: {}", e))
                })?;
            for night in period.nights() {
                *requested.entry((line_type.clone(), night)).or_insert(0) += room_count;
            }
        }

        // 空室再検証: 行ロック付きで他予約の数量を読み直し、超過なら中断
        for ((room_type, night), qty) in requested.iter() {
            let booked = Self::locked_booked_count(&mut tx, room_type, *night, reservation.id())
                .await
                .map_err(RepositoryError::from)?;
            let capacity = capacities.get(room_type).copied().unwrap_or(0);
            if booked + qty > capacity {
                tx.rollback().await.ok();
                return Err(RepositoryError::ConflictDetected(format!(
                    "rooms of type {} oversubscribed on {} ({} booked + {} requested > {} rooms)",
                    room_type, night, booked, qty, capacity
                )));
            }
        }

        // アサイン再検証: 同じ客室の重複アサインがあれば中断
        for allotment in reservation.room_allotments() {
            if !allotment.is_active() {
                continue;
            }
            let conflicts =
                Self::locked_allotment_conflicts(&mut tx, allotment, reservation.id())
                    .await
                    .map_err(RepositoryError::from)?;
            if conflicts > 0 {
                tx.rollback().await.ok();
                return Err(RepositoryError::ConflictDetected(format!(
                    "room {} is already allotted in {}",
                    allotment.room(),
                    allotment.period()
                )));
            }
        }

        Self::persist_in_tx(&mut tx, reservation)
            .await
            .map_err(RepositoryError::from)?;

        tx.commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("トランザクションのコミットに失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM reservations WHERE id = ?")
            .bind(reservation_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("予約の取得に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(self.build_reservation(&row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM reservations WHERE status = ? ORDER BY created_at DESC",
        )
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("予約の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut reservations = Vec::with_capacity(rows.len());
        for row in &rows {
            reservations.push(self.build_reservation(row).await?);
        }
        Ok(reservations)
    }

    async fn find_by_group(&self, group_id: GroupId) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM reservations WHERE group_id = ? ORDER BY created_at",
        )
        .bind(group_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("予約の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut reservations = Vec::with_capacity(rows.len());
        for row in &rows {
            reservations.push(self.build_reservation(row).await?);
        }
        Ok(reservations)
    }

    async fn find_active_overlapping(
        &self,
        room_type: &RoomTypeId,
        range: &StayRange,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT r.*
            FROM reservations r
            INNER JOIN reservation_lines l ON l.reservation_id = r.id
            INNER JOIN room_packages p ON p.item = l.item
            WHERE p.room_type = ?
              AND r.status <> 'Draft'
              AND l.charge_kind = 'Stay'
              AND l.from_date < ?
              AND l.to_date > ?
              AND (? IS NULL OR r.id <> ?)
            "#,
        )
        .bind(room_type.as_str())
        .bind(range.to_date())
        .bind(range.from_date())
        .bind(exclude.map(|id| id.to_string()))
        .bind(exclude.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("予約の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut reservations = Vec::with_capacity(rows.len());
        for row in &rows {
            reservations.push(self.build_reservation(row).await?);
        }
        Ok(reservations)
    }

    async fn find_active_allotments(
        &self,
        room: &RoomId,
        range: &StayRange,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<(ReservationId, RoomAllotment)>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT a.reservation_id, a.room, a.item, a.from_date, a.to_date, a.status
            FROM room_allotments a
            INNER JOIN reservations r ON r.id = a.reservation_id
            WHERE a.room = ?
              AND a.status IN ('Booked', 'Checked In')
              AND r.status <> 'Draft'
              AND a.from_date < ?
              AND a.to_date > ?
              AND (? IS NULL OR r.id <> ?)
            "#,
        )
        .bind(room.as_str())
        .bind(range.to_date())
        .bind(range.from_date())
        .bind(exclude.map(|id| id.to_string()))
        .bind(exclude.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("アサインの取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut allotments = Vec::with_capacity(rows.len());
        for row in &rows {
            let reservation_id =
                ReservationId::from_string(row.get::<String, _>("reservation_id").as_str())
                    .map_err(|e| {
                        RepositoryError::FetchFailed(format!("予約IDの解析に失敗しました: {}", e))
                    })?;
            allotments.push((reservation_id, Self::allotment_from_row(row)?));
        }
        Ok(allotments)
    }

    async fn find_checked_in(
        &self,
        company: &CompanyCode,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM reservations WHERE status = 'Checked In' AND company = ?",
        )
        .bind(company.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("予約の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut reservations = Vec::with_capacity(rows.len());
        for row in &rows {
            reservations.push(self.build_reservation(row).await?);
        }
        Ok(reservations)
    }

    fn next_identity(&self) -> ReservationId {
        ReservationId::new()
    }
}
