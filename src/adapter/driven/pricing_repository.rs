use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{ItemCode, Money, PricingPeriod};
use crate::domain::port::{PricingRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::{MySql, Pool, Row};

/// MySQL料金リポジトリ
/// 料金期間レコードを永続化する
pub struct MySqlPricingRepository {
    pool: Pool<MySql>,
}

impl MySqlPricingRepository {
    /// 新しいMySQL料金リポジトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PricingRepository for MySqlPricingRepository {
    async fn periods_for(&self, item: &ItemCode) -> Result<Vec<PricingPeriod>, RepositoryError> {
        // エンジンは先頭一致で解決するので、並び順を安定させる
        let rows = sqlx::query(
            r#"
            SELECT item, from_date, to_date, rate_amount, rate_currency
            FROM pricing_periods
            WHERE item = ?
            ORDER BY from_date, id
            "#,
        )
        .bind(item.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("料金期間の取得に失敗: {}", e)))
        .map_err(RepositoryError::from)?;

        let mut periods = Vec::with_capacity(rows.len());
        for row in &rows {
            let item = ItemCode::new(row.get::<String, _>("item").as_str()).map_err(|e| {
                RepositoryError::FetchFailed(format!("アイテムの解析に失敗: {}", e))
            })?;
            let rate = Money::new(row.get("rate_amount"), row.get("rate_currency")).map_err(
                |e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)),
            )?;
            periods.push(PricingPeriod::new(
                item,
                row.get("from_date"),
                row.get("to_date"),
                rate,
            ));
        }
        Ok(periods)
    }

    async fn save_period(&self, period: &PricingPeriod) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO pricing_periods (item, from_date, to_date, rate_amount, rate_currency)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(period.item().as_str())
        .bind(period.from_date())
        .bind(period.to_date())
        .bind(period.rate().amount())
        .bind(period.rate().currency())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("料金期間の保存に失敗: {}", e)))
        .map_err(RepositoryError::from)?;
        Ok(())
    }
}
