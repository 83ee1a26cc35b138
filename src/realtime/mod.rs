//! 消息表插入事件的进程内推送
//!
//! 所有新消息广播给全部订阅者，由订阅方按会话双方过滤。

use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::routes::message::ChatMessage;

#[derive(Clone)]
pub struct MessageFeed {
    sender: broadcast::Sender<ChatMessage>,
}

impl MessageFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 发布一条已入库的消息，无订阅者时直接丢弃
    pub fn publish(&self, message: ChatMessage) {
        let delivered = self.sender.send(message).unwrap_or(0);
        tracing::debug!("Message insert delivered to {} subscribers", delivered);
    }

    pub fn subscribe(&self, me: Uuid, peer: Uuid) -> ConversationSubscription {
        ConversationSubscription {
            receiver: self.sender.subscribe(),
            me,
            peer,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// 单个会话的订阅，drop 即退订
pub struct ConversationSubscription {
    receiver: broadcast::Receiver<ChatMessage>,
    me: Uuid,
    peer: Uuid,
}

impl ConversationSubscription {
    pub fn participants(&self) -> (Uuid, Uuid) {
        (self.me, self.peer)
    }

    /// 下一条属于本会话的消息；推送通道关闭时返回 None
    pub async fn next(&mut self) -> Option<ChatMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if message.is_between(self.me, self.peer) => return Some(message),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Conversation subscriber lagged, {} inserts skipped",
                        skipped
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
