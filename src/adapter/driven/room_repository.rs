use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    HousekeepingStatus, ItemCode, Room, RoomId, RoomPackage, RoomType, RoomTypeId,
};
use crate::domain::port::{RepositoryError, RoomInventoryRepository};
use async_trait::async_trait;
use sqlx::{MySql, Pool, Row};

/// MySQL客室在庫リポジトリ
/// 客室・客室タイプ・パッケージの参照データを永続化する
pub struct MySqlRoomInventoryRepository {
    pool: Pool<MySql>,
}

impl MySqlRoomInventoryRepository {
    /// 新しいMySQL客室在庫リポジトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn room_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Room, RepositoryError> {
        let id = RoomId::new(row.get::<String, _>("id").as_str())
            .map_err(|e| RepositoryError::FetchFailed(format!("客室コードの解析に失敗: {}", e)))?;
        let room_type = RoomTypeId::new(row.get::<String, _>("room_type").as_str())
            .map_err(|e| RepositoryError::FetchFailed(format!("客室タイプの解析に失敗: {}", e)))?;
        let housekeeping =
            HousekeepingStatus::from_string(row.get::<String, _>("housekeeping_status").as_str())
                .map_err(|e| {
                    RepositoryError::FetchFailed(format!("客室状態の解析に失敗しました: {}", e))
                })?;
        Ok(Room::reconstruct(id, room_type, housekeeping))
    }
}

#[async_trait]
impl RoomInventoryRepository for MySqlRoomInventoryRepository {
    async fn room_type_of(
        &self,
        item: &ItemCode,
    ) -> Result<Option<RoomTypeId>, RepositoryError> {
        let row = sqlx::query("SELECT room_type FROM room_packages WHERE item = ?")
            .bind(item.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("パッケージの取得に失敗: {}", e)))
            .map_err(RepositoryError::from)?;

        match row {
            Some(row) => {
                let room_type = RoomTypeId::new(row.get::<String, _>("room_type").as_str())
                    .map_err(|e| {
                        RepositoryError::FetchFailed(format!("客室タイプの解析に失敗: {}", e))
                    })?;
                Ok(Some(room_type))
            }
            None => Ok(None),
        }
    }

    async fn rooms_of(&self, room_type: &RoomTypeId) -> Result<Vec<Room>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM rooms WHERE room_type = ? ORDER BY id")
            .bind(room_type.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("客室の取得に失敗: {}", e)))
            .map_err(RepositoryError::from)?;

        let mut rooms = Vec::with_capacity(rows.len());
        for row in &rows {
            rooms.push(Self::room_from_row(row)?);
        }
        Ok(rooms)
    }

    async fn room_count(&self, room_type: &RoomTypeId) -> Result<u32, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM rooms WHERE room_type = ?")
            .bind(room_type.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("客室数の取得に失敗: {}", e)))
            .map_err(RepositoryError::from)?;

        let total: i64 = row.get("total");
        Ok(total.max(0) as u32)
    }

    async fn find_room(&self, room: &RoomId) -> Result<Option<Room>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM rooms WHERE id = ?")
            .bind(room.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("客室の取得に失敗: {}", e)))
            .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(Self::room_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_room_type(
        &self,
        room_type: &RoomTypeId,
    ) -> Result<Option<RoomType>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM room_types WHERE id = ?")
            .bind(room_type.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("客室タイプの取得に失敗: {}", e)))
            .map_err(RepositoryError::from)?;

        match row {
            Some(row) => {
                let id = RoomTypeId::new(row.get::<String, _>("id").as_str()).map_err(|e| {
                    RepositoryError::FetchFailed(format!("客室タイプの解析に失敗: {}", e))
                })?;
                Ok(Some(RoomType::new(id, row.get("name"))))
            }
            None => Ok(None),
        }
    }

    async fn save_room_type(&self, room_type: &RoomType) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO room_types (id, name)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE name = VALUES(name)
            "#,
        )
        .bind(room_type.id().as_str())
        .bind(room_type.name())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("客室タイプの保存に失敗: {}", e)))
        .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn save_room(&self, room: &Room) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO rooms (id, room_type, housekeeping_status)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE
                room_type = VALUES(room_type),
                housekeeping_status = VALUES(housekeeping_status)
            "#,
        )
        .bind(room.id().as_str())
        .bind(room.room_type().as_str())
        .bind(room.housekeeping().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("客室の保存に失敗: {}", e)))
        .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn save_package(&self, package: &RoomPackage) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO room_packages (item, room_type)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE room_type = VALUES(room_type)
            "#,
        )
        .bind(package.item().as_str())
        .bind(package.room_type().as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("パッケージの保存に失敗: {}", e)))
        .map_err(RepositoryError::from)?;
        Ok(())
    }
}
