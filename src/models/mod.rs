mod message;

pub use message::{ChannelType, Message, MessageRecord, MessageStatus, NewMessageRecord};
