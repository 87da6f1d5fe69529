// Lock-free channels

use crate::messaging::command::Command;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub type CommandProducer = ringbuf::HeapProd<Command>;
pub type CommandConsumer = ringbuf::HeapCons<Command>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<Command>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Drain every queued notification
pub fn drain_notifications(rx: &mut NotificationConsumer) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Some(notification) = ringbuf::traits::Consumer::try_pop(rx) {
        out.push(notification);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::notification::NotificationCategory;

    #[test]
    fn test_notification_channel_is_fifo() {
        let (mut tx, mut rx) = create_notification_channel(4);
        for message in ["one", "two"] {
            let notice = Notification::info(NotificationCategory::Pattern, message.to_string());
            assert!(ringbuf::traits::Producer::try_push(&mut tx, notice).is_ok());
        }
        let drained = drain_notifications(&mut rx);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "one");
        assert!(drain_notifications(&mut rx).is_empty());
    }

    #[test]
    fn test_command_channel_capacity() {
        let (mut tx, _rx) = create_command_channel(1);
        assert!(ringbuf::traits::Producer::try_push(&mut tx, Command::SetMasterGain(0.5)).is_ok());
        assert!(ringbuf::traits::Producer::try_push(&mut tx, Command::SetMasterGain(0.6)).is_err());
    }
}
