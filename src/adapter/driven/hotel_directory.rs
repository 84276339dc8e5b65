use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{CompanyCode, CustomerId, GuestId, HousekeepingTask, LineItem, Money};
use crate::domain::port::{
    BillingError, BillingGateway, GuestDirectory, GuestProfile, HousekeepingGateway, InvoiceRef,
    Logger, RepositoryError,
};
use async_trait::async_trait;
use sqlx::{MySql, Pool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// MySQLハウスキーピングゲートウェイ
/// チェックアウト時の要清掃イベントをタスクテーブルに記録し、
/// 客室のハウスキーピング状態をDirtyに更新する
pub struct MySqlHousekeepingGateway {
    pool: Pool<MySql>,
}

impl MySqlHousekeepingGateway {
    /// 新しいMySQLハウスキーピングゲートウェイを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HousekeepingGateway for MySqlHousekeepingGateway {
    async fn create_task(&self, task: &HousekeepingTask) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO housekeeping_tasks (room, status, task_date)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(task.room().as_str())
        .bind(task.status().to_string())
        .bind(task.date())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("要清掃タスクの作成に失敗: {}", e)))
        .map_err(RepositoryError::from)?;

        sqlx::query("UPDATE rooms SET housekeeping_status = ? WHERE id = ?")
            .bind(task.status().to_string())
            .bind(task.room().as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("客室状態の更新に失敗: {}", e)))
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

/// MySQL宿泊客ディレクトリ
/// 監査行の補強に使う表示名・連絡先を提供する
pub struct MySqlGuestDirectory {
    pool: Pool<MySql>,
}

impl MySqlGuestDirectory {
    /// 新しいMySQL宿泊客ディレクトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestDirectory for MySqlGuestDirectory {
    async fn profile(&self, guest: GuestId) -> Result<Option<GuestProfile>, RepositoryError> {
        let row = sqlx::query("SELECT full_name, mobile_no FROM guests WHERE id = ?")
            .bind(guest.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("宿泊客の取得に失敗: {}", e)))
            .map_err(RepositoryError::from)?;

        Ok(row.map(|row| GuestProfile {
            full_name: row.get("full_name"),
            mobile_no: row.get("mobile_no"),
        }))
    }
}

/// コンソール請求ゲートウェイ
/// 実際の請求書・税計算は外部システムの責務なので、発行内容を
/// 構造化ログに残して参照番号だけを返す
pub struct ConsoleBillingGateway {
    logger: Arc<dyn Logger>,
}

impl ConsoleBillingGateway {
    /// 新しいコンソール請求ゲートウェイを作成
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl BillingGateway for ConsoleBillingGateway {
    async fn issue_invoice(
        &self,
        company: &CompanyCode,
        customer: CustomerId,
        lines: &[LineItem],
    ) -> Result<InvoiceRef, BillingError> {
        let total = lines
            .iter()
            .map(|line| line.amount())
            .fold(Money::zero(), |acc, amount| acc.add(&amount).unwrap_or(acc));

        let invoice = InvoiceRef(format!("SINV-{}", Uuid::new_v4()));
        let mut context = HashMap::new();
        context.insert("invoice".to_string(), invoice.to_string());
        context.insert("company".to_string(), company.to_string());
        context.insert("customer".to_string(), customer.to_string());
        context.insert("lines".to_string(), lines.len().to_string());
        context.insert("total".to_string(), total.amount().to_string());
        self.logger
            .info("BillingGateway", "Invoice issued", None, Some(context));

        Ok(invoice)
    }
}
