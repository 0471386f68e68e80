// Messaging - Lock-free commands to the audio thread, notifications to the host

pub mod channels;
pub mod command;
pub mod notification;
