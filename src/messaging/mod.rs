// Messaging - lock-free queues between the control thread, the audio callback
// and whoever displays notices

pub mod channels;
pub mod command;
pub mod notification;

pub use channels::{
    CommandConsumer, CommandProducer, NotificationConsumer, NotificationProducer,
    create_command_channel, create_notification_channel, drain_notifications,
};
pub use command::Command;
pub use notification::{Notification, NotificationCategory, NotificationLevel};
