//! In-memory job queue

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{Delivery, JobQueue, QueueTask};
use crate::error::QueueError;

struct Message {
    id: i64,
    task: QueueTask,
    deliveries: u32,
}

struct InFlight {
    message: Message,
    consumer: String,
    deadline: Instant,
}

#[derive(Default)]
struct State {
    ready: VecDeque<Message>,
    in_flight: HashMap<i64, InFlight>,
    next_id: i64,
}

impl State {
    /// Puts timed-out deliveries back in line
    fn requeue_expired(&mut self, now: Instant) {
        let expired: Vec<i64> = self
            .in_flight
            .iter()
            .filter(|(_, flight)| flight.deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            if let Some(flight) = self.in_flight.remove(&id) {
                warn!(
                    "Delivery {} of job {} to {} timed out, requeueing",
                    id, flight.message.task.job_id, flight.consumer
                );
                self.ready.push_back(flight.message);
            }
        }
    }

    fn next_position(&self, priority_ordering: bool) -> Option<usize> {
        let candidates = self.ready.iter().enumerate();
        if priority_ordering {
            candidates
                .max_by(|(_, a), (_, b)| {
                    a.task
                        .priority
                        .cmp(&b.task.priority)
                        .then_with(|| b.id.cmp(&a.id))
                })
                .map(|(pos, _)| pos)
        } else {
            candidates.min_by_key(|(_, m)| m.id).map(|(pos, _)| pos)
        }
    }
}

/// Process-local job queue
pub struct InMemoryJobQueue {
    state: Mutex<State>,
    notify: Notify,
    visibility_timeout: Duration,
    poll_interval: Duration,
    priority_ordering: bool,
}

impl InMemoryJobQueue {
    pub fn new(visibility_timeout: Duration, poll_interval: Duration, priority_ordering: bool) -> Self {
        Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            visibility_timeout,
            poll_interval,
            priority_ordering,
        }
    }

    async fn try_claim(&self, consumer: &str) -> Option<Delivery> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.requeue_expired(now);

        let position = state.next_position(self.priority_ordering)?;
        let mut message = state.ready.remove(position)?;
        message.deliveries += 1;

        let delivery = Delivery {
            delivery_id: message.id,
            job_id: message.task.job_id,
            priority: message.task.priority,
            attempt: message.deliveries,
        };

        state.in_flight.insert(
            message.id,
            InFlight {
                message,
                consumer: consumer.to_string(),
                deadline: now + self.visibility_timeout,
            },
        );

        Some(delivery)
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, task: QueueTask) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock().await;
            state.next_id += 1;
            let id = state.next_id;
            state.ready.push_back(Message {
                id,
                task,
                deliveries: 0,
            });
            debug!("Enqueued job {} as message {}", task.job_id, id);
        }

        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self, consumer: &str) -> Result<Delivery, QueueError> {
        loop {
            if let Some(delivery) = self.try_claim(consumer).await {
                debug!(
                    "Delivered job {} to {} (attempt {})",
                    delivery.job_id, consumer, delivery.attempt
                );
                return Ok(delivery);
            }

            // Woken early by enqueue; the timeout catches expired deliveries
            let _ = tokio::time::timeout(self.poll_interval, self.notify.notified()).await;
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if state.in_flight.remove(&delivery.delivery_id).is_none() {
            // Redelivered elsewhere or already acknowledged
            state.ready.retain(|m| m.id != delivery.delivery_id);
        }
        Ok(())
    }

    async fn depth(&self) -> Result<u64, QueueError> {
        let state = self.state.lock().await;
        Ok((state.ready.len() + state.in_flight.len()) as u64)
    }

    async fn ping(&self) -> Result<(), QueueError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::domain::JobId;
    use std::sync::Arc;

    fn queue(priority_ordering: bool) -> InMemoryJobQueue {
        InMemoryJobQueue::new(
            Duration::from_secs(60),
            Duration::from_millis(20),
            priority_ordering,
        )
    }

    fn task(priority: u8) -> QueueTask {
        QueueTask {
            job_id: JobId::new(),
            priority,
        }
    }

    #[tokio::test]
    async fn test_fifo_by_default() {
        let queue = queue(false);
        let tasks = [task(1), task(9), task(5)];
        for t in tasks {
            queue.enqueue(t).await.unwrap();
        }

        for expected in tasks {
            let delivery = queue.dequeue("w-1").await.unwrap();
            assert_eq!(delivery.job_id, expected.job_id);
            assert_eq!(delivery.attempt, 1);
        }
    }

    #[tokio::test]
    async fn test_priority_ordering_with_fifo_ties() {
        let queue = queue(true);
        let low = task(1);
        let high_a = task(9);
        let high_b = task(9);
        for t in [low, high_a, high_b] {
            queue.enqueue(t).await.unwrap();
        }

        let order: Vec<JobId> = [
            queue.dequeue("w").await.unwrap(),
            queue.dequeue("w").await.unwrap(),
            queue.dequeue("w").await.unwrap(),
        ]
        .iter()
        .map(|d| d.job_id)
        .collect();

        assert_eq!(order, vec![high_a.job_id, high_b.job_id, low.job_id]);
    }

    #[tokio::test]
    async fn test_dequeue_waits_for_enqueue() {
        let queue = Arc::new(queue(false));
        let t = task(5);

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue("w-1").await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!consumer.is_finished());

        queue.enqueue(t).await.unwrap();
        let delivery = tokio::time::timeout(Duration::from_secs(2), consumer)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(delivery.job_id, t.job_id);
    }

    #[tokio::test]
    async fn test_unacked_delivery_is_redelivered() {
        let queue = InMemoryJobQueue::new(
            Duration::from_millis(50),
            Duration::from_millis(10),
            false,
        );
        let t = task(5);
        queue.enqueue(t).await.unwrap();

        let first = queue.dequeue("w-1").await.unwrap();
        let second = tokio::time::timeout(Duration::from_secs(2), queue.dequeue("w-2"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(second.job_id, t.job_id);
        assert_eq!(second.delivery_id, first.delivery_id);
        assert_eq!(second.attempt, 2);
    }

    #[tokio::test]
    async fn test_ack_removes_task() {
        let queue = queue(false);
        queue.enqueue(task(5)).await.unwrap();
        queue.enqueue(task(5)).await.unwrap();
        assert_eq!(queue.depth().await.unwrap(), 2);

        let delivery = queue.dequeue("w-1").await.unwrap();
        assert_eq!(queue.depth().await.unwrap(), 2);

        queue.ack(&delivery).await.unwrap();
        assert_eq!(queue.depth().await.unwrap(), 1);

        // Second ack is a no-op
        queue.ack(&delivery).await.unwrap();
        assert_eq!(queue.depth().await.unwrap(), 1);
    }
}
