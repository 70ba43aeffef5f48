//! UseCase: ルーム一覧の取得

use std::sync::Arc;

use crate::domain::{Room, RoomRepository};

/// ルーム一覧取得のユースケース
pub struct ListRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl ListRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 全ルームを名前順で返す
    pub async fn execute(&self) -> Vec<Room> {
        self.repository.list_rooms().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockRoomRepository;

    #[tokio::test]
    async fn test_list_rooms_returns_repository_rooms() {
        // テスト項目: Repository のルーム一覧をそのまま返す
        // given (前提条件):
        let mut repository = MockRoomRepository::new();
        repository
            .expect_list_rooms()
            .times(1)
            .returning(|| vec![Room::new("Lobby", 0), Room::new("Studio", 5)]);
        let usecase = ListRoomsUseCase::new(Arc::new(repository));

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        let names: Vec<&str> = rooms.iter().map(|room| room.name.as_str()).collect();
        assert_eq!(names, vec!["Lobby", "Studio"]);
    }
}
