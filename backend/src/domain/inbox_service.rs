//! Inbox composition service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    BoardFirmwareQuery, BoardFirmwareQueryError, EventVisibilityQuery, InboxQuery,
};
use crate::domain::{Error, Inbox, UserId};

fn map_firmware_error(error: BoardFirmwareQueryError) -> Error {
    match error {
        BoardFirmwareQueryError::Connection { message } => {
            Error::service_unavailable(format!("firmware lookup unavailable: {message}"))
        }
        BoardFirmwareQueryError::Query { message } => {
            Error::internal(format!("firmware lookup error: {message}"))
        }
    }
}

/// Combines visible events with outdated boards.
#[derive(Clone)]
pub struct InboxService<Q, B> {
    visibility: Arc<Q>,
    boards: Arc<B>,
}

impl<Q, B> InboxService<Q, B> {
    /// Create the service.
    pub fn new(visibility: Arc<Q>, boards: Arc<B>) -> Self {
        Self { visibility, boards }
    }
}

#[async_trait]
impl<Q, B> InboxQuery for InboxService<Q, B>
where
    Q: EventVisibilityQuery,
    B: BoardFirmwareQuery,
{
    async fn inbox(&self, user_id: &UserId) -> Result<Inbox, Error> {
        let events = self
            .visibility
            .upcoming_events_with_going_status(user_id)
            .await?;
        let boards = self
            .boards
            .outdated_boards(user_id)
            .await
            .map_err(map_firmware_error)?;
        Ok(Inbox { events, boards })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoardFirmwareNotice;
    use crate::domain::ports::{MockBoardFirmwareQuery, MockEventVisibilityQuery};

    #[tokio::test]
    async fn inbox_combines_events_and_boards() {
        let mut visibility = MockEventVisibilityQuery::new();
        visibility
            .expect_upcoming_events_with_going_status()
            .times(1)
            .return_once(|_| Ok(Vec::new()));
        let mut boards = MockBoardFirmwareQuery::new();
        boards.expect_outdated_boards().times(1).return_once(|_| {
            Ok(vec![BoardFirmwareNotice {
                serial_number: "SK-001".to_owned(),
                current_version: Some("1.0.0".to_owned()),
                latest_version: "1.2.0".to_owned(),
            }])
        });

        let inbox = InboxService::new(Arc::new(visibility), Arc::new(boards))
            .inbox(&UserId::random())
            .await
            .expect("inbox");

        assert!(inbox.events.is_empty());
        assert_eq!(inbox.boards.len(), 1);
    }

    #[tokio::test]
    async fn firmware_outage_is_service_unavailable() {
        let mut visibility = MockEventVisibilityQuery::new();
        visibility
            .expect_upcoming_events_with_going_status()
            .return_once(|_| Ok(Vec::new()));
        let mut boards = MockBoardFirmwareQuery::new();
        boards
            .expect_outdated_boards()
            .return_once(|_| Err(BoardFirmwareQueryError::connection("refused")));

        let error = InboxService::new(Arc::new(visibility), Arc::new(boards))
            .inbox(&UserId::random())
            .await
            .expect_err("outage");

        assert_eq!(error.code(), crate::domain::ErrorCode::ServiceUnavailable);
    }
}
