use relay_domain::GameCommand;
use tokio::sync::Mutex;

/// In-process FIFO of operator commands waiting for the game agent.
///
/// Enqueue and drain share one critical section, so a drain always sees a
/// complete buffer and leaves it empty.
#[derive(Debug, Default)]
pub struct CommandQueue {
    buffer: Mutex<Vec<GameCommand>>,
}

impl CommandQueue {
    /// Appends a command and returns the new queue length.
    pub async fn enqueue(&self, command: GameCommand) -> usize {
        let mut buffer = self.buffer.lock().await;
        buffer.push(command);
        buffer.len()
    }

    /// Takes every queued command in insertion order.
    pub async fn drain_all(&self) -> Vec<GameCommand> {
        let mut buffer = self.buffer.lock().await;
        std::mem::take(&mut *buffer)
    }

    pub async fn len(&self) -> usize {
        self.buffer.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn drain_returns_insertion_order_then_empty() {
        let queue = CommandQueue::default();
        assert_eq!(queue.enqueue(GameCommand::announce("one")).await, 1);
        assert_eq!(queue.enqueue(GameCommand::announce("two")).await, 2);

        let drained = queue.drain_all().await;
        assert_eq!(
            drained,
            vec![GameCommand::announce("one"), GameCommand::announce("two")]
        );
        assert!(queue.drain_all().await.is_empty());
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test]
    async fn drain_on_empty_queue_is_empty() {
        let queue = CommandQueue::default();
        assert!(queue.drain_all().await.is_empty());
        assert!(queue.drain_all().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_drains_deliver_each_command_once() {
        let queue = Arc::new(CommandQueue::default());
        let mut producers = Vec::new();
        for worker in 0..4 {
            let queue = queue.clone();
            producers.push(tokio::spawn(async move {
                for idx in 0..50 {
                    queue
                        .enqueue(GameCommand::announce(format!("{worker}-{idx}")))
                        .await;
                    tokio::task::yield_now().await;
                }
            }));
        }
        let mut drainers = Vec::new();
        for _ in 0..3 {
            let queue = queue.clone();
            drainers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..40 {
                    seen.extend(queue.drain_all().await);
                    tokio::task::yield_now().await;
                }
                seen
            }));
        }

        for producer in producers {
            producer.await.expect("producer task");
        }
        let mut delivered = Vec::new();
        for drainer in drainers {
            delivered.extend(drainer.await.expect("drainer task"));
        }
        delivered.extend(queue.drain_all().await);

        let unique: HashSet<_> = delivered
            .iter()
            .map(|command| match command {
                GameCommand::Announce { message } => message.clone(),
            })
            .collect();
        assert_eq!(delivered.len(), 200);
        assert_eq!(unique.len(), 200);
    }
}
